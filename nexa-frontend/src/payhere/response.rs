use serde::Deserialize;

/// Status code the gateway reports for a completed payment.
pub const STATUS_SUCCESS: &str = "2";

/// Parameters the gateway sends back about a payment.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentResponse {
    pub merchant_id: String,
    pub order_id: String,
    pub payhere_amount: String,
    pub payhere_currency: String,
    pub status_code: String,
    pub md5sig: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status_message: Option<String>,
}

impl PaymentResponse {
    /// Fields covered by `md5sig`, in signing order. The secret goes last.
    pub fn signed_fields(&self) -> [&str; 5] {
        [
            self.merchant_id.as_str(),
            self.order_id.as_str(),
            self.payhere_amount.as_str(),
            self.payhere_currency.as_str(),
            self.status_code.as_str(),
        ]
    }

    pub fn is_success(&self) -> bool {
        self.status_code.trim() == STATUS_SUCCESS
    }
}
