//! HTMX endpoints for the forgot-password wizard.
//!
//! The wizard lives in the visitor's session. Every endpoint loads it, applies
//! one transition and re-renders the `#reset-wizard` fragment. Toasts travel
//! in the `HX-Trigger` header.

use askama::Template;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use nexa_core::error::AppError;
use serde::Deserialize;
use tower_sessions::Session;

use std::future::Future;

use crate::reset::flow::record_outcome;
use crate::reset::wizard::CallOutcome;
use crate::reset::{Notice, PasswordChecks, ResetWizard, WizardError, AUTO_SUBMIT_DELAY};
use crate::services::PasswordResetApi;
use crate::AppState;

const WIZARD_KEY: &str = "password_reset";

#[derive(Template)]
#[template(path = "reset_wizard.html")]
struct ResetWizardTemplate {
    step: u8,
    email: String,
    error: Option<String>,
    busy: bool,
    checks: PasswordChecks,
    auto_submit_delay_ms: u128,
}

#[derive(Deserialize)]
pub struct EmailForm {
    pub email: String,
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Deserialize)]
pub struct OtpForm {
    pub otp: String,
}

#[derive(Deserialize)]
pub struct ResendForm {
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Deserialize)]
pub struct PasswordForm {
    pub new_password: String,
    pub confirm_password: String,
}

async fn load_wizard(session: &Session) -> Result<ResetWizard, AppError> {
    Ok(session
        .get::<ResetWizard>(WIZARD_KEY)
        .await
        .map_err(|e| AppError::SessionError(e.to_string()))?
        .unwrap_or_default())
}

async fn store_wizard(session: &Session, wizard: &ResetWizard) -> Result<(), AppError> {
    session
        .insert(WIZARD_KEY, wizard)
        .await
        .map_err(|e| AppError::SessionError(e.to_string()))
}

/// Write the wizard through to the store now rather than when the response
/// is sent. Before the backend call this lets a concurrent resubmission see
/// the busy flag.
async fn store_in_flight(session: &Session, wizard: &ResetWizard) -> Result<(), AppError> {
    store_wizard(session, wizard).await?;
    session
        .save()
        .await
        .map_err(|e| AppError::SessionError(e.to_string()))
}

/// Run the backend call and apply its outcome on a task of its own.
///
/// The task stores and saves the settled wizard itself, so a visitor who
/// disconnects mid-call does not leave the busy flag set in the session.
async fn settle<Call, Finish>(
    session: &Session,
    mut wizard: ResetWizard,
    step: &'static str,
    call: Call,
    finish: Finish,
) -> Result<(ResetWizard, Option<Notice>), AppError>
where
    Call: Future<Output = CallOutcome> + Send + 'static,
    Finish: FnOnce(&mut ResetWizard, CallOutcome) -> Option<Notice> + Send + 'static,
{
    let session = session.clone();
    let task = tokio::spawn(async move {
        let outcome = call.await;
        record_outcome(step, &outcome);
        let notice = finish(&mut wizard, outcome);
        store_in_flight(&session, &wizard).await?;
        Ok::<_, AppError>((wizard, notice))
    });

    task.await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Reset step task failed: {}", e)))?
}

fn render(wizard: &ResetWizard, notice: Option<Notice>, status: StatusCode) -> Result<Response, AppError> {
    let html = ResetWizardTemplate {
        step: wizard.step().number(),
        email: wizard.email().to_string(),
        error: wizard.error().map(str::to_string),
        busy: wizard.is_busy(),
        checks: wizard.password_checks(),
        auto_submit_delay_ms: AUTO_SUBMIT_DELAY.as_millis(),
    }
    .render()
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to render wizard: {}", e)))?;

    let mut response = (status, Html(html)).into_response();

    if let Some(notice) = notice {
        let trigger = serde_json::json!({ "toast": notice }).to_string();
        match HeaderValue::from_str(&trigger) {
            Ok(value) => {
                response.headers_mut().insert("HX-Trigger", value);
            }
            Err(e) => tracing::warn!(error = %e, "Toast not representable as a header"),
        }
    }

    Ok(response)
}

async fn reject(session: &Session, wizard: &ResetWizard, err: WizardError) -> Result<Response, AppError> {
    let status = match err {
        WizardError::Busy | WizardError::WrongStep { .. } => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    };
    tracing::debug!(error = %err, step = wizard.step().number(), "Wizard action rejected");
    store_wizard(session, wizard).await?;
    render(wizard, None, status)
}

pub async fn wizard_page(session: Session) -> Result<Response, AppError> {
    let wizard = load_wizard(&session).await?;
    render(&wizard, None, StatusCode::OK)
}

pub async fn send_otp_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<EmailForm>,
) -> Result<Response, AppError> {
    let mut wizard = load_wizard(&session).await?;

    let request = match wizard
        .set_email(&form.email)
        .and_then(|_| wizard.begin_send_otp(form.captcha_token.as_deref()))
    {
        Ok(request) => request,
        Err(err) => return reject(&session, &wizard, err).await,
    };
    store_in_flight(&session, &wizard).await?;

    let client = state.auth_client.clone();
    let call = async move { client.request_otp(&request).await };
    let (wizard, notice) =
        settle(&session, wizard, "request_otp", call, ResetWizard::finish_send_otp).await?;
    render(&wizard, notice, StatusCode::OK)
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<OtpForm>,
) -> Result<Response, AppError> {
    let mut wizard = load_wizard(&session).await?;

    let request = match wizard
        .enter_code(&form.otp)
        .and_then(|_| wizard.begin_verify_otp())
    {
        Ok(request) => request,
        Err(err) => return reject(&session, &wizard, err).await,
    };
    store_in_flight(&session, &wizard).await?;

    let client = state.auth_client.clone();
    let call = async move { client.validate_otp(&request).await };
    let (wizard, notice) =
        settle(&session, wizard, "validate_otp", call, ResetWizard::finish_verify_otp).await?;
    render(&wizard, notice, StatusCode::OK)
}

pub async fn resend_otp_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<ResendForm>,
) -> Result<Response, AppError> {
    let mut wizard = load_wizard(&session).await?;

    let request = match wizard.begin_resend_otp(form.captcha_token.as_deref()) {
        Ok(request) => request,
        Err(err) => return reject(&session, &wizard, err).await,
    };
    store_in_flight(&session, &wizard).await?;

    let client = state.auth_client.clone();
    let call = async move { client.request_otp(&request).await };
    let (wizard, notice) =
        settle(&session, wizard, "request_otp", call, ResetWizard::finish_resend_otp).await?;
    render(&wizard, notice, StatusCode::OK)
}

pub async fn reset_password_handler(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<PasswordForm>,
) -> Result<Response, AppError> {
    let mut wizard = load_wizard(&session).await?;

    let request = match wizard
        .set_passwords(&form.new_password, &form.confirm_password)
        .and_then(|_| wizard.begin_reset_password())
    {
        Ok(request) => request,
        Err(err) => return reject(&session, &wizard, err).await,
    };
    store_in_flight(&session, &wizard).await?;

    let client = state.auth_client.clone();
    let call = async move { client.reset_password(&request).await };
    let (wizard, notice) = settle(
        &session,
        wizard,
        "reset_password",
        call,
        ResetWizard::finish_reset_password,
    )
    .await?;
    render(&wizard, notice, StatusCode::OK)
}

pub async fn back_handler(session: Session) -> Result<Response, AppError> {
    let mut wizard = load_wizard(&session).await?;
    wizard.back();
    store_wizard(&session, &wizard).await?;
    render(&wizard, None, StatusCode::OK)
}

pub async fn close_handler(session: Session) -> Result<Response, AppError> {
    session
        .remove::<ResetWizard>(WIZARD_KEY)
        .await
        .map_err(|e| AppError::SessionError(e.to_string()))?;
    render(&ResetWizard::new(), None, StatusCode::OK)
}
