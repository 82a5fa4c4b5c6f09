use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use nexa_core::error::AppError;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::{AuthUser, Role, UserSession};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub role: Role,
}

fn hx_redirect(to: &'static str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert("HX-Redirect", HeaderValue::from_static(to));
    (StatusCode::OK, headers, "").into_response()
}

fn login_failed() -> Response {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Html("<p class='text-red-500 text-sm'>Invalid email or password</p>"),
    )
        .into_response()
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Form(payload): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let reply = match state.auth_client.login(&payload.email, &payload.password).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::error!(error = %e, "Login request failed");
            return Ok(login_failed());
        }
    };

    match (reply.success, reply.token, reply.user) {
        (true, Some(token), Some(user)) => {
            tracing::info!(user_id = %user.id, role = %user.role, "User logged in successfully");
            UserSession {
                user_id: user.id,
                email: user.email,
                role: user.role,
                access_token: token,
            }
            .establish(&session)
            .await?;
            Ok(hx_redirect("/"))
        }
        _ => Ok(login_failed()),
    }
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    if let Some(user) = UserSession::load(&session).await? {
        // Logout must not fail because revocation did.
        if let Err(e) = state.auth_client.logout(&user.access_token).await {
            tracing::error!(user_id = %user.user_id, error = %e, "Failed to revoke token during logout");
        }
    }

    UserSession::teardown(&session).await?;
    Ok(hx_redirect("/"))
}

pub async fn me_handler(AuthUser(user): AuthUser) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        user_id: user.user_id,
        email: user.email,
        role: user.role,
    })
}
