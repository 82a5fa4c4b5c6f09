use chrono::{DateTime, Utc};
use nexa_core::utils::signature::signatures_match;
use rand::Rng;
use secrecy::ExposeSecret;
use serde::Serialize;

use super::form::CheckoutForm;
use super::request::{Donation, Donor, OrderId, PaymentError, PaymentRequest};
use super::response::PaymentResponse;
use crate::config::PayHereSettings;
use crate::services::metrics;

/// Result of handing a donation to the hosted checkout.
///
/// `Submitted` only means the self-posting page was produced; the gateway's
/// verdict arrives later through the return URL.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CheckoutOutcome {
    Submitted {
        success: bool,
        order_id: String,
        message: String,
        #[serde(skip)]
        form: CheckoutForm,
        #[serde(skip)]
        page: String,
    },
    Failed {
        success: bool,
        error: String,
        message: String,
    },
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Submitted { .. })
    }

    pub fn order_id(&self) -> Option<&str> {
        match self {
            CheckoutOutcome::Submitted { order_id, .. } => Some(order_id),
            CheckoutOutcome::Failed { .. } => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            CheckoutOutcome::Submitted { message, .. } | CheckoutOutcome::Failed { message, .. } => {
                message
            }
        }
    }
}

pub struct PayHereGateway {
    settings: PayHereSettings,
}

impl PayHereGateway {
    pub fn new(settings: PayHereSettings) -> Self {
        Self { settings }
    }

    pub fn checkout_url(&self) -> &str {
        &self.settings.checkout_url
    }

    /// Origin of the checkout URL, for the page's `form-action` policy.
    pub fn checkout_origin(&self) -> Option<String> {
        let url = reqwest::Url::parse(&self.settings.checkout_url).ok()?;
        Some(url.origin().ascii_serialization())
    }

    /// Build, sign and render the checkout hand-off for one donation attempt.
    ///
    /// A fresh order id is drawn from `now` and `rng` on every call.
    pub fn build_and_submit<R: Rng + ?Sized>(
        &self,
        donation: &Donation,
        donor: &Donor,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> CheckoutOutcome {
        let order_id = OrderId::generate(now, rng);

        match self.prepare(donation, donor, order_id.clone()) {
            Ok((form, page)) => {
                tracing::info!(
                    order_id = %order_id,
                    amount = %donation.amount,
                    currency = %donation.currency,
                    "Checkout form built"
                );
                metrics::record_checkout("submit", "success");
                CheckoutOutcome::Submitted {
                    success: true,
                    order_id: order_id.to_string(),
                    message: "Redirecting to payment gateway...".to_string(),
                    form,
                    page,
                }
            }
            Err(e) => {
                tracing::error!(order_id = %order_id, error = %e, "Failed to build checkout form");
                metrics::record_checkout("submit", "failed");
                CheckoutOutcome::Failed {
                    success: false,
                    error: e.to_string(),
                    message: "Failed to initiate payment. Please try again.".to_string(),
                }
            }
        }
    }

    fn prepare(
        &self,
        donation: &Donation,
        donor: &Donor,
        order_id: OrderId,
    ) -> Result<(CheckoutForm, String), PaymentError> {
        let request = PaymentRequest::new(&self.settings, donation, donor, order_id)?;
        let hash = request.sign(
            self.settings.signature_scheme,
            self.settings.merchant_secret.expose_secret(),
        )?;
        let form = CheckoutForm::new(&self.settings.checkout_url, &request, hash);
        let page = form.render_page()?;
        Ok((form, page))
    }

    /// Whether a callback's `md5sig` matches the one recomputed locally.
    pub fn validate_payment_response(&self, response: &PaymentResponse) -> bool {
        let expected = match self.settings.signature_scheme.sign_response(
            self.settings.merchant_secret.expose_secret(),
            &response.signed_fields(),
        ) {
            Ok(signature) => signature,
            Err(e) => {
                tracing::error!(error = %e, "Failed to compute response signature");
                return false;
            }
        };

        let valid = signatures_match(&expected, &response.md5sig);
        if !valid {
            tracing::warn!(
                order_id = %response.order_id,
                status_code = %response.status_code,
                "Payment response signature mismatch"
            );
        }
        valid
    }
}
