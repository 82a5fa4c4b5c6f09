use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::Utc;
use nexa_core::error::AppError;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

use crate::payhere::request::{checked_amount, MAX_AMOUNT};
use crate::payhere::{CheckoutOutcome, Currency, Donation, Donor, PaymentError, PaymentResponse};
use crate::services::metrics;
use crate::AppState;

#[derive(Template)]
#[template(path = "donation_result.html")]
struct DonationResultTemplate {
    title: String,
    message: String,
    order_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DonationForm {
    pub amount: String,
    pub currency: String,
    #[validate(length(min = 1, message = "Institution is required"))]
    pub institution: String,
    #[validate(length(min = 1, message = "Cause is required"))]
    pub cause: String,
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl DonationForm {
    /// Trim the required text fields so blank input fails validation.
    fn normalized(mut self) -> Self {
        for field in [
            &mut self.institution,
            &mut self.cause,
            &mut self.first_name,
            &mut self.last_name,
            &mut self.email,
        ] {
            *field = field.trim().to_string();
        }
        self
    }

    fn into_parts(self) -> Result<(Donation, Donor), String> {
        let amount: Decimal = self
            .amount
            .trim()
            .parse()
            .map_err(|_| "Amount must be a number".to_string())?;
        checked_amount(amount).map_err(|e| match e {
            PaymentError::AmountTooLarge(_) => format!("Amount must not exceed {}", MAX_AMOUNT),
            _ => "Amount must be greater than zero".to_string(),
        })?;
        let currency: Currency = self.currency.parse().map_err(|e| format!("{}", e))?;

        let donation = Donation {
            amount,
            currency,
            institution: self.institution,
            cause: self.cause,
        };
        let donor = Donor {
            first_name: Some(self.first_name),
            last_name: Some(self.last_name),
            email: Some(self.email),
            phone: self.phone,
            address: self.address,
            city: self.city,
            country: self.country,
        };
        Ok((donation, donor))
    }
}

#[derive(Template)]
#[template(path = "form_error.html")]
struct FormErrorTemplate<'a> {
    message: &'a str,
}

fn error_fragment(status: StatusCode, message: &str) -> Result<Response, AppError> {
    let html = FormErrorTemplate { message }
        .render()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render error: {}", e)))?;
    Ok((status, Html(html)).into_response())
}

fn result_page(
    status: StatusCode,
    title: &str,
    message: &str,
    order_id: Option<&str>,
) -> Result<Response, AppError> {
    let html = DonationResultTemplate {
        title: title.to_string(),
        message: message.to_string(),
        order_id: order_id.map(str::to_string),
    }
    .render()
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render result page: {}", e)))?;
    Ok((status, Html(html)).into_response())
}

pub async fn checkout_handler(
    State(state): State<AppState>,
    Form(form): Form<DonationForm>,
) -> Result<Response, AppError> {
    let form = form.normalized();
    if let Err(errors) = form.validate() {
        tracing::debug!(errors = %errors, "Donation form rejected");
        metrics::record_checkout("validate", "failed");
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Please check the donation details".to_string());
        return error_fragment(StatusCode::UNPROCESSABLE_ENTITY, &message);
    }

    let (donation, donor) = match form.into_parts() {
        Ok(parts) => parts,
        Err(message) => {
            metrics::record_checkout("validate", "failed");
            return error_fragment(StatusCode::UNPROCESSABLE_ENTITY, &message);
        }
    };

    let outcome =
        state
            .payhere
            .build_and_submit(&donation, &donor, Utc::now(), &mut rand::thread_rng());

    match outcome {
        CheckoutOutcome::Submitted { page, .. } => Ok(Html(page).into_response()),
        CheckoutOutcome::Failed { message, .. } => {
            error_fragment(StatusCode::INTERNAL_SERVER_ERROR, &message)
        }
    }
}

pub async fn checkout_return(
    State(state): State<AppState>,
    Query(response): Query<PaymentResponse>,
) -> Result<Response, AppError> {
    if !state.payhere.validate_payment_response(&response) {
        metrics::record_checkout("return", "untrusted");
        return result_page(
            StatusCode::BAD_REQUEST,
            "Payment could not be verified",
            "We could not confirm this payment. If you were charged, please contact support.",
            None,
        );
    }

    if response.is_success() {
        tracing::info!(
            order_id = %response.order_id,
            amount = %response.payhere_amount,
            currency = %response.payhere_currency,
            "Donation completed"
        );
        metrics::record_checkout("return", "success");
        result_page(
            StatusCode::OK,
            "Thank you for your donation",
            "Your payment was received.",
            Some(&response.order_id),
        )
    } else {
        tracing::info!(
            order_id = %response.order_id,
            status_code = %response.status_code,
            "Donation not completed"
        );
        metrics::record_checkout("return", "failed");
        let message = response
            .status_message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or("The payment was not completed.");
        result_page(
            StatusCode::OK,
            "Payment not completed",
            message,
            Some(&response.order_id),
        )
    }
}

pub async fn checkout_cancel() -> Result<Response, AppError> {
    metrics::record_checkout("cancel", "cancelled");
    result_page(
        StatusCode::OK,
        "Donation cancelled",
        "You cancelled the payment. No money was taken.",
        None,
    )
}
