use crate::config::AuthServiceSettings;
use crate::models::{ApiReply, LoginReply, OtpRequest, OtpValidation, PasswordReset};
use async_trait::async_trait;
use nexa_core::observability::TracedClientExt;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Unexpected response from auth service (status {status})")]
    UnexpectedResponse { status: u16 },
}

/// The three backend calls behind the password-reset wizard.
#[async_trait]
pub trait PasswordResetApi: Send + Sync {
    async fn request_otp(&self, request: &OtpRequest) -> Result<ApiReply, ClientError>;

    async fn validate_otp(&self, request: &OtpValidation) -> Result<ApiReply, ClientError>;

    async fn reset_password(&self, request: &PasswordReset) -> Result<ApiReply, ClientError>;
}

pub struct AuthClient {
    client: Client,
    settings: AuthServiceSettings,
}

impl AuthClient {
    pub fn new(settings: AuthServiceSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.settings.url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.url.trim_end_matches('/'), path)
    }

    /// POST `body` as JSON and decode the reply envelope.
    ///
    /// Non-2xx responses whose body is still a `{success, message}` envelope are
    /// returned as failed replies so the server's message reaches the user.
    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ClientError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned + Failable,
    {
        let url = self.url(path);

        let response = self
            .client
            .traced_post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "Failed to send POST request");
                ClientError::Transport(e)
            })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        match serde_json::from_slice::<R>(&bytes) {
            Ok(reply) if status.is_success() => Ok(reply),
            Ok(reply) => {
                tracing::warn!(url = %url, status = %status, "Auth service rejected request");
                Ok(reply.into_failure())
            }
            Err(e) => {
                tracing::error!(url = %url, status = %status, error = %e, "Undecodable auth service response");
                Err(ClientError::UnexpectedResponse {
                    status: status.as_u16(),
                })
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginReply, ClientError> {
        self.post_json(
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Revoke `access_token` on the backend.
    pub async fn logout(&self, access_token: &str) -> Result<(), ClientError> {
        let url = self.url("/auth/logout");
        let response = self
            .client
            .traced_post(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ClientError::UnexpectedResponse {
                status: response.status().as_u16(),
            })
        }
    }
}

#[async_trait]
impl PasswordResetApi for AuthClient {
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    async fn request_otp(&self, request: &OtpRequest) -> Result<ApiReply, ClientError> {
        self.post_json("/otp", request).await
    }

    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    async fn validate_otp(&self, request: &OtpValidation) -> Result<ApiReply, ClientError> {
        self.post_json("/otp/validate", request).await
    }

    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    async fn reset_password(&self, request: &PasswordReset) -> Result<ApiReply, ClientError> {
        self.post_json("/reset-password", request).await
    }
}

/// Reply envelopes that can be downgraded to a failure when the HTTP status
/// disagrees with the body.
pub trait Failable {
    fn into_failure(self) -> Self;
}

impl Failable for ApiReply {
    fn into_failure(self) -> Self {
        Self {
            success: false,
            ..self
        }
    }
}

impl Failable for LoginReply {
    fn into_failure(self) -> Self {
        Self {
            success: false,
            token: None,
            user: None,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> AuthClient {
        AuthClient::new(AuthServiceSettings {
            url: url.to_string(),
        })
    }

    #[test]
    fn joins_paths_without_double_slash() {
        assert_eq!(client("http://api/").url("/otp"), "http://api/otp");
        assert_eq!(client("http://api").url("/otp/validate"), "http://api/otp/validate");
    }

    #[test]
    fn failure_downgrade_keeps_message() {
        let reply = ApiReply {
            success: true,
            message: Some("Invalid OTP".into()),
        }
        .into_failure();
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Invalid OTP"));
    }
}
