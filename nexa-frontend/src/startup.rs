use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use nexa_core::error::AppError;
use nexa_core::middleware::{
    request_id_middleware, security_headers_middleware, ContentSecurityPolicy, REQUEST_ID_HEADER,
};
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::handlers::{
    app::{health_check, index},
    auth::{login_handler, logout_handler, me_handler},
    donation::{checkout_cancel, checkout_handler, checkout_return},
    metrics::metrics,
    password_reset::{
        back_handler, close_handler, resend_otp_handler, reset_password_handler, send_otp_handler,
        verify_otp_handler, wizard_page,
    },
};
use crate::services::metrics::metrics_middleware;
use crate::AppState;

pub fn build_router(state: AppState, secure_cookies: bool) -> Result<Router, AppError> {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(24)));

    let checkout_origins: Vec<String> = state.payhere.checkout_origin().into_iter().collect();
    let origins: Vec<&str> = checkout_origins.iter().map(String::as_str).collect();
    let csp = ContentSecurityPolicy::for_pages(&origins)
        .map_err(|e| AppError::ConfigError(anyhow::anyhow!("Invalid checkout origin: {}", e)))?;

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/me", get(me_handler))
        .route("/forgot-password", get(wizard_page))
        .route("/forgot-password/email", post(send_otp_handler))
        .route("/forgot-password/otp", post(verify_otp_handler))
        .route("/forgot-password/resend", post(resend_otp_handler))
        .route("/forgot-password/password", post(reset_password_handler))
        .route("/forgot-password/back", post(back_handler))
        .route("/forgot-password/close", post(close_handler))
        .route("/donations/checkout", post(checkout_handler))
        .route("/donations/return", get(checkout_return))
        .route("/donations/cancel", get(checkout_cancel))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn_with_state(csp, security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        // Outermost so the trace span sees the id.
        .layer(from_fn(request_id_middleware))
        .with_state(state);

    Ok(router)
}
