//! Request and response bodies exchanged with the auth backend.

use serde::{Deserialize, Serialize};

/// Body of `POST /otp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpRequest {
    pub captcha_token: String,
    pub email: String,
}

/// Body of `POST /otp/validate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpValidation {
    pub email: String,
    pub otp: String,
}

/// Body of `POST /reset-password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub email: String,
    pub password: String,
}

/// The `{success, message?}` envelope every backend endpoint answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiReply {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }

    /// Server-supplied message, or `fallback` when the server sent none.
    pub fn message_or(&self, fallback: &str) -> String {
        self.message
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(fallback)
            .to_string()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub email: String,
    pub role: super::Role,
}

/// Body returned by `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginReply {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<LoginUser>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn otp_request_uses_camel_case_token() {
        let body = serde_json::to_value(OtpRequest {
            captcha_token: "tok".into(),
            email: "user@test.com".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"captchaToken": "tok", "email": "user@test.com"}));
    }

    #[test]
    fn reply_without_message_deserializes() {
        let reply: ApiReply = serde_json::from_value(json!({"success": true})).unwrap();
        assert_eq!(reply, ApiReply::ok());
    }

    #[test]
    fn blank_message_falls_back() {
        let reply = ApiReply::failed("  ");
        assert_eq!(reply.message_or("Failed to send OTP"), "Failed to send OTP");
        assert_eq!(ApiReply::failed("Email not found").message_or("x"), "Email not found");
    }
}
