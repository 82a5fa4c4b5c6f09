use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use nexa_core::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tower_sessions::Session;

const SESSION_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Tutor,
    Donor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Student => "student",
            Role::Tutor => "tutor",
            Role::Donor => "donor",
            Role::Admin => "admin",
        };
        f.write_str(name)
    }
}

/// Signed-in user context. Created on login, removed on logout; handlers
/// receive it through [`AuthUser`] instead of reading the session directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub access_token: String,
}

impl UserSession {
    pub async fn establish(self, session: &Session) -> Result<(), AppError> {
        // Fresh id on privilege change.
        session
            .cycle_id()
            .await
            .map_err(|e| AppError::SessionError(e.to_string()))?;
        session
            .insert(SESSION_KEY, &self)
            .await
            .map_err(|e| AppError::SessionError(e.to_string()))
    }

    pub async fn load(session: &Session) -> Result<Option<Self>, AppError> {
        session
            .get::<Self>(SESSION_KEY)
            .await
            .map_err(|e| AppError::SessionError(e.to_string()))
    }

    /// Drop everything held for the visitor, signed in or not.
    pub async fn teardown(session: &Session) -> Result<(), AppError> {
        session
            .flush()
            .await
            .map_err(|e| AppError::SessionError(e.to_string()))
    }

    pub fn display_name(&self) -> &str {
        self.email.split('@').next().unwrap_or("User")
    }
}

/// Authenticated user extracted from the session.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserSession);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(status, msg)| (status, msg).into_response())?;

        match UserSession::load(&session).await {
            Ok(Some(user)) => Ok(AuthUser(user)),
            Ok(None) => Err(Redirect::to("/").into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}
