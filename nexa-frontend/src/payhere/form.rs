use askama::Template;
use serde::Serialize;

use super::request::PaymentRequest;

/// Browsing context the checkout opens in.
pub const CHECKOUT_TARGET: &str = "_blank";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutField {
    pub name: &'static str,
    pub value: String,
}

/// Hidden form handed to the browser, which posts it to the hosted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutForm {
    pub action: String,
    pub target: &'static str,
    pub fields: Vec<CheckoutField>,
}

#[derive(Template)]
#[template(path = "checkout.html")]
struct CheckoutTemplate<'a> {
    form: &'a CheckoutForm,
}

impl CheckoutForm {
    pub fn new(action: &str, request: &PaymentRequest, hash: String) -> Self {
        let field = |name: &'static str, value: &str| CheckoutField {
            name,
            value: value.to_string(),
        };

        let fields = vec![
            field("merchant_id", &request.merchant_id),
            field("return_url", &request.return_url),
            field("cancel_url", &request.cancel_url),
            field("notify_url", &request.notify_url),
            field("order_id", request.order_id.as_str()),
            field("items", &request.items),
            field("currency", request.currency.code()),
            field("amount", &request.amount),
            field("first_name", &request.first_name),
            field("last_name", &request.last_name),
            field("email", &request.email),
            field("phone", &request.phone),
            field("address", &request.address),
            field("city", &request.city),
            field("country", &request.country),
            field("custom_1", &request.institution),
            field("custom_2", &request.cause),
            CheckoutField { name: "hash", value: hash },
        ];

        Self {
            action: action.to_string(),
            target: CHECKOUT_TARGET,
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }

    /// Self-submitting HTML page carrying the form.
    pub fn render_page(&self) -> Result<String, askama::Error> {
        CheckoutTemplate { form: self }.render()
    }
}
