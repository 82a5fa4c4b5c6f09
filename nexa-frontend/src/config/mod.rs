use crate::payhere::SignatureScheme;
use nexa_core::config::{configuration_directory, load_layered};
use nexa_core::error::AppError;
use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth_service: AuthServiceSettings,
    pub payhere: PayHereSettings,
    #[serde(default)]
    pub observability: ObservabilitySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Deserialize, Clone)]
pub struct AuthServiceSettings {
    /// Base URL of the REST backend serving `/otp`, `/otp/validate`,
    /// `/reset-password` and `/auth/*`.
    pub url: String,
}

#[derive(Deserialize, Clone)]
pub struct PayHereSettings {
    pub merchant_id: String,
    /// Shared secret mixed into request and response signatures.
    pub merchant_secret: Secret<String>,
    /// Hosted checkout page the hidden form posts to.
    #[serde(default = "default_checkout_url")]
    pub checkout_url: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    #[serde(default)]
    pub signature_scheme: SignatureScheme,
}

fn default_checkout_url() -> String {
    "https://sandbox.payhere.lk/pay/checkout".to_string()
}

#[derive(Deserialize, Clone)]
pub struct ObservabilitySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP/gRPC collector. Export is disabled when unset.
    pub otlp_endpoint: Option<String>,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let base_path = std::env::current_dir()?;
    load_layered(&configuration_directory(&base_path, "nexa-frontend"))
}
