use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::checksum::SignatureScheme;
use crate::config::PayHereSettings;

pub const DEFAULT_FIRST_NAME: &str = "Anonymous";
pub const DEFAULT_LAST_NAME: &str = "Donor";
pub const DEFAULT_EMAIL: &str = "donor@nexa.lk";
pub const DEFAULT_PHONE: &str = "0000000000";
pub const DEFAULT_ADDRESS: &str = "No address provided";
pub const DEFAULT_CITY: &str = "Colombo";
pub const DEFAULT_COUNTRY: &str = "Sri Lanka";

/// Largest amount a single donation may charge, in major units.
pub const MAX_AMOUNT: i64 = 1_000_000_000;

const ORDER_SUFFIX_LEN: usize = 9;
const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Donation amount must be greater than zero (got {0})")]
    InvalidAmount(Decimal),

    #[error("Donation amount must not exceed {max} (got {0})", max = MAX_AMOUNT)]
    AmountTooLarge(Decimal),

    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Failed to sign payment request: {0}")]
    Signing(anyhow::Error),

    #[error("Failed to build checkout form: {0}")]
    Render(#[from] askama::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Lkr,
    Usd,
    Gbp,
    Eur,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Lkr,
        Currency::Usd,
        Currency::Gbp,
        Currency::Eur,
        Currency::Aud,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Lkr => "LKR",
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
            Currency::Aud => "AUD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| PaymentError::UnsupportedCurrency(code.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Donation {
    pub amount: Decimal,
    pub currency: Currency,
    pub institution: String,
    pub cause: String,
}

impl Donation {
    pub fn items_description(&self) -> String {
        format!("Donation to {} for {}", self.institution, self.cause)
    }
}

/// Donor details as entered. Anything missing or blank is replaced by a
/// fixed default when the request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Donor {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// `DONATION_<unix millis>_<9 base-36 chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(String);

impl OrderId {
    pub fn generate<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let suffix: String = (0..ORDER_SUFFIX_LEN)
            .map(|_| char::from(BASE36[rng.gen_range(0..BASE36.len())]))
            .collect();
        Self(format!("DONATION_{}_{}", now.timestamp_millis(), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every field posted to the hosted checkout, before signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub merchant_id: String,
    pub order_id: OrderId,
    pub amount: String,
    pub currency: Currency,
    pub items: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub institution: String,
    pub cause: String,
}

impl PaymentRequest {
    pub fn new(
        merchant: &PayHereSettings,
        donation: &Donation,
        donor: &Donor,
        order_id: OrderId,
    ) -> Result<Self, PaymentError> {
        let amount = checked_amount(donation.amount)?;

        Ok(Self {
            merchant_id: merchant.merchant_id.clone(),
            order_id,
            amount: format_amount(amount),
            currency: donation.currency,
            items: donation.items_description(),
            first_name: or_default(&donor.first_name, DEFAULT_FIRST_NAME),
            last_name: or_default(&donor.last_name, DEFAULT_LAST_NAME),
            email: or_default(&donor.email, DEFAULT_EMAIL),
            phone: or_default(&donor.phone, DEFAULT_PHONE),
            address: or_default(&donor.address, DEFAULT_ADDRESS),
            city: or_default(&donor.city, DEFAULT_CITY),
            country: or_default(&donor.country, DEFAULT_COUNTRY),
            return_url: merchant.return_url.clone(),
            cancel_url: merchant.cancel_url.clone(),
            notify_url: merchant.notify_url.clone(),
            institution: donation.institution.clone(),
            cause: donation.cause.clone(),
        })
    }

    /// Fields covered by the signature, in signing order.
    pub fn signed_fields(&self) -> [&str; 15] {
        [
            self.merchant_id.as_str(),
            self.order_id.as_str(),
            self.amount.as_str(),
            self.currency.code(),
            self.first_name.as_str(),
            self.last_name.as_str(),
            self.email.as_str(),
            self.phone.as_str(),
            self.address.as_str(),
            self.city.as_str(),
            self.country.as_str(),
            self.items.as_str(),
            self.return_url.as_str(),
            self.cancel_url.as_str(),
            self.notify_url.as_str(),
        ]
    }

    pub fn sign(&self, scheme: SignatureScheme, secret: &str) -> Result<String, PaymentError> {
        scheme
            .sign_request(secret, &self.signed_fields())
            .map_err(PaymentError::Signing)
    }
}

/// The amount actually charged: two places, half away from zero.
pub fn round_amount(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// The rounded amount, provided it is above 0.00 and at most [`MAX_AMOUNT`].
pub fn checked_amount(amount: Decimal) -> Result<Decimal, PaymentError> {
    let rounded = round_amount(amount);
    // Amounts that round to 0.00 would be charged as nothing.
    if rounded <= Decimal::ZERO {
        return Err(PaymentError::InvalidAmount(amount));
    }
    if rounded > Decimal::from(MAX_AMOUNT) {
        return Err(PaymentError::AmountTooLarge(amount));
    }
    Ok(rounded)
}

/// Two decimal places, rounding half away from zero.
pub fn format_amount(amount: Decimal) -> String {
    let mut rounded = round_amount(amount);
    rounded.rescale(2);
    rounded.to_string()
}
