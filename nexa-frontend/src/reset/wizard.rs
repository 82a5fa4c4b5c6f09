//! Forgot-password state machine.
//!
//! Each backend call is split into a `begin_*` half that validates and hands
//! back the request body, and a `finish_*` half that applies the outcome. The
//! caller performs the I/O in between, which keeps the machine serialisable
//! (it lives in the visitor's session) and lets it refuse a second call while
//! one is in flight.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::otp_input::{OtpInput, OtpInputError};
use super::validation::{is_valid_email, is_valid_otp, PasswordChecks};
use crate::models::{ApiReply, OtpRequest, OtpValidation, PasswordReset};
use crate::services::ClientError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Step {
    #[default]
    EmailEntry,
    OtpVerify,
    NewPassword,
}

impl Step {
    pub fn number(self) -> u8 {
        match self {
            Step::EmailEntry => 1,
            Step::OtpVerify => 2,
            Step::NewPassword => 3,
        }
    }

    fn previous(self) -> Option<Step> {
        match self {
            Step::EmailEntry => None,
            Step::OtpVerify => Some(Step::EmailEntry),
            Step::NewPassword => Some(Step::OtpVerify),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error("Please enter a valid email address")]
    InvalidEmail,

    #[error("Please complete the CAPTCHA challenge")]
    MissingCaptcha,

    #[error("Please enter the 6-digit code")]
    IncompleteOtp,

    #[error("Password does not meet all requirements")]
    WeakPassword(PasswordChecks),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("A request is already in progress")]
    Busy,

    #[error("Action not available on step {actual}")]
    WrongStep { actual: u8 },

    #[error(transparent)]
    OtpInput(#[from] OtpInputError),
}

impl WizardError {
    /// Whether the error is about the user's input and belongs inline.
    fn is_inline(&self) -> bool {
        !matches!(self, WizardError::Busy | WizardError::WrongStep { .. })
    }
}

/// Toast shown after a step completes or fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Error(String),
}

pub type CallOutcome = Result<ApiReply, ClientError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetWizard {
    step: Step,
    email: String,
    otp: OtpInput,
    // Never written to the session store; cleared once an attempt is made.
    #[serde(skip)]
    new_password: String,
    #[serde(skip)]
    confirm_password: String,
    checks: PasswordChecks,
    error: Option<String>,
    busy: bool,
}

impl ResetWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn otp(&self) -> &OtpInput {
        &self.otp
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn password_checks(&self) -> PasswordChecks {
        self.checks
    }

    fn expect_step(&self, step: Step) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                actual: self.step.number(),
            })
        }
    }

    fn expect_idle(&self) -> Result<(), WizardError> {
        if self.busy {
            Err(WizardError::Busy)
        } else {
            Ok(())
        }
    }

    fn reject<T>(&mut self, err: WizardError) -> Result<T, WizardError> {
        if err.is_inline() {
            self.error = Some(err.to_string());
        }
        Err(err)
    }

    // ---- step 1 ----------------------------------------------------------

    /// The email is editable only on the first step.
    pub fn set_email(&mut self, email: &str) -> Result<(), WizardError> {
        self.expect_step(Step::EmailEntry)?;
        self.email = email.trim().to_string();
        Ok(())
    }

    pub fn begin_send_otp(&mut self, captcha_token: Option<&str>) -> Result<OtpRequest, WizardError> {
        self.expect_step(Step::EmailEntry)?;
        self.expect_idle()?;

        if !is_valid_email(&self.email) {
            return self.reject(WizardError::InvalidEmail);
        }
        let captcha_token = match captcha_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => return self.reject(WizardError::MissingCaptcha),
        };

        self.error = None;
        self.busy = true;
        Ok(OtpRequest {
            captcha_token,
            email: self.email.clone(),
        })
    }

    pub fn finish_send_otp(&mut self, outcome: CallOutcome) -> Option<Notice> {
        self.busy = false;
        if self.step != Step::EmailEntry {
            return None;
        }

        match outcome {
            Ok(reply) if reply.success => {
                tracing::info!(email = %self.email, "OTP sent");
                self.step = Step::OtpVerify;
                self.otp.clear();
                self.error = None;
                Some(Notice::Success(reply.message_or("OTP sent to your email")))
            }
            outcome => {
                let message = failure_message(outcome, "Failed to send OTP");
                tracing::warn!(email = %self.email, error = %message, "OTP request failed");
                self.error = Some(message.clone());
                Some(Notice::Error(message))
            }
        }
    }

    // ---- step 2 ----------------------------------------------------------

    pub fn set_otp_digit(&mut self, index: usize, ch: char) -> Result<bool, WizardError> {
        self.expect_step(Step::OtpVerify)?;
        Ok(self.otp.set_digit(index, ch)?)
    }

    pub fn clear_otp_digit(&mut self, index: usize) -> Result<(), WizardError> {
        self.expect_step(Step::OtpVerify)?;
        Ok(self.otp.clear_digit(index)?)
    }

    /// Replace the digits with a whole code typed into a single field.
    pub fn enter_code(&mut self, code: &str) -> Result<(), WizardError> {
        self.expect_step(Step::OtpVerify)?;
        let code = code.trim();
        if !is_valid_otp(code) {
            return self.reject(WizardError::IncompleteOtp);
        }
        self.otp.paste(code);
        Ok(())
    }

    pub fn begin_verify_otp(&mut self) -> Result<OtpValidation, WizardError> {
        self.expect_step(Step::OtpVerify)?;
        self.expect_idle()?;

        let otp = match self.otp.code() {
            Some(code) => code,
            None => return self.reject(WizardError::IncompleteOtp),
        };

        self.error = None;
        self.busy = true;
        Ok(OtpValidation {
            email: self.email.clone(),
            otp,
        })
    }

    /// No toast on failure: the message stays inline and the digits are wiped
    /// so the user can type a fresh code.
    pub fn finish_verify_otp(&mut self, outcome: CallOutcome) -> Option<Notice> {
        self.busy = false;
        if self.step != Step::OtpVerify {
            return None;
        }

        match outcome {
            Ok(reply) if reply.success => {
                self.step = Step::NewPassword;
                self.error = None;
            }
            outcome => {
                let message = failure_message(outcome, "Invalid OTP. Please try again.");
                tracing::warn!(email = %self.email, error = %message, "OTP verification failed");
                self.otp.clear();
                self.error = Some(message);
            }
        }
        None
    }

    pub fn begin_resend_otp(&mut self, captcha_token: Option<&str>) -> Result<OtpRequest, WizardError> {
        self.expect_step(Step::OtpVerify)?;
        self.expect_idle()?;

        let captcha_token = match captcha_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token.to_string(),
            None => return self.reject(WizardError::MissingCaptcha),
        };

        self.error = None;
        self.busy = true;
        Ok(OtpRequest {
            captcha_token,
            email: self.email.clone(),
        })
    }

    pub fn finish_resend_otp(&mut self, outcome: CallOutcome) -> Option<Notice> {
        self.busy = false;
        if self.step != Step::OtpVerify {
            return None;
        }

        match outcome {
            Ok(reply) if reply.success => {
                self.otp.clear();
                self.error = None;
                Some(Notice::Success(reply.message_or("A new OTP has been sent")))
            }
            outcome => {
                let message = failure_message(outcome, "Failed to resend OTP");
                self.error = Some(message.clone());
                Some(Notice::Error(message))
            }
        }
    }

    // ---- step 3 ----------------------------------------------------------

    pub fn set_passwords(&mut self, new_password: &str, confirm_password: &str) -> Result<(), WizardError> {
        self.expect_step(Step::NewPassword)?;
        self.new_password = new_password.to_string();
        self.confirm_password = confirm_password.to_string();
        self.checks = PasswordChecks::evaluate(new_password);
        Ok(())
    }

    pub fn begin_reset_password(&mut self) -> Result<PasswordReset, WizardError> {
        self.expect_step(Step::NewPassword)?;
        self.expect_idle()?;

        let password = std::mem::take(&mut self.new_password);
        let confirm = std::mem::take(&mut self.confirm_password);

        let checks = PasswordChecks::evaluate(&password);
        if !checks.all_passed() {
            return self.reject(WizardError::WeakPassword(checks));
        }
        if password != confirm {
            return self.reject(WizardError::PasswordMismatch);
        }

        self.error = None;
        self.busy = true;
        Ok(PasswordReset {
            email: self.email.clone(),
            password,
        })
    }

    /// On success the wizard closes, which discards everything it held.
    pub fn finish_reset_password(&mut self, outcome: CallOutcome) -> Option<Notice> {
        self.busy = false;
        if self.step != Step::NewPassword {
            return None;
        }

        match outcome {
            Ok(reply) if reply.success => {
                tracing::info!(email = %self.email, "Password reset completed");
                self.close();
                Some(Notice::Success(reply.message_or(
                    "Password reset successful. Please log in with your new password.",
                )))
            }
            outcome => {
                let message = failure_message(outcome, "Failed to reset password");
                tracing::warn!(email = %self.email, error = %message, "Password reset failed");
                self.error = Some(message.clone());
                Some(Notice::Error(message))
            }
        }
    }

    // ---- navigation ------------------------------------------------------

    /// Go back one step, keeping whatever was entered. Returns `false` on the
    /// first step.
    pub fn back(&mut self) -> bool {
        match self.step.previous() {
            Some(previous) => {
                self.step = previous;
                self.error = None;
                true
            }
            None => false,
        }
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }
}

fn failure_message(outcome: CallOutcome, fallback: &str) -> String {
    match outcome {
        Ok(reply) => reply.message_or(fallback),
        Err(e) => e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_step_two() -> ResetWizard {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();
        wizard.begin_send_otp(Some("tok")).unwrap();
        wizard.finish_send_otp(Ok(ApiReply::ok()));
        wizard
    }

    fn at_step_three() -> ResetWizard {
        let mut wizard = at_step_two();
        wizard.enter_code("123456").unwrap();
        wizard.begin_verify_otp().unwrap();
        wizard.finish_verify_otp(Ok(ApiReply::ok()));
        wizard
    }

    #[test]
    fn invalid_email_stays_on_step_one_without_request() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("not-an-email").unwrap();

        assert_eq!(wizard.begin_send_otp(Some("tok")), Err(WizardError::InvalidEmail));
        assert_eq!(wizard.step(), Step::EmailEntry);
        assert!(!wizard.is_busy());
        assert_eq!(wizard.error(), Some("Please enter a valid email address"));
    }

    #[test]
    fn missing_captcha_blocks_request() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();

        assert_eq!(wizard.begin_send_otp(None), Err(WizardError::MissingCaptcha));
        assert_eq!(wizard.begin_send_otp(Some("  ")), Err(WizardError::MissingCaptcha));
    }

    #[test]
    fn send_otp_produces_request_and_advances_on_success() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();

        let request = wizard.begin_send_otp(Some("tok")).unwrap();
        assert_eq!(
            request,
            OtpRequest {
                captcha_token: "tok".into(),
                email: "user@test.com".into(),
            }
        );

        let notice = wizard.finish_send_otp(Ok(ApiReply::ok()));
        assert_eq!(wizard.step(), Step::OtpVerify);
        assert!(matches!(notice, Some(Notice::Success(_))));
    }

    #[test]
    fn second_send_while_busy_is_refused() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();
        wizard.begin_send_otp(Some("tok")).unwrap();

        assert_eq!(wizard.begin_send_otp(Some("tok")), Err(WizardError::Busy));
        // Busy is not an input problem.
        assert_eq!(wizard.error(), None);
    }

    #[test]
    fn failed_send_stays_on_step_one_with_server_message() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();
        wizard.begin_send_otp(Some("tok")).unwrap();

        let notice = wizard.finish_send_otp(Ok(ApiReply::failed("Email not registered")));
        assert_eq!(wizard.step(), Step::EmailEntry);
        assert_eq!(wizard.error(), Some("Email not registered"));
        assert_eq!(notice, Some(Notice::Error("Email not registered".into())));
        assert!(!wizard.is_busy());
    }

    #[test]
    fn transport_error_surfaces_message() {
        let mut wizard = ResetWizard::new();
        wizard.set_email("user@test.com").unwrap();
        wizard.begin_send_otp(Some("tok")).unwrap();

        wizard.finish_send_otp(Err(ClientError::UnexpectedResponse { status: 502 }));
        assert_eq!(
            wizard.error(),
            Some("Unexpected response from auth service (status 502)")
        );
    }

    #[test]
    fn email_is_locked_after_step_one() {
        let mut wizard = at_step_two();
        assert_eq!(
            wizard.set_email("other@test.com"),
            Err(WizardError::WrongStep { actual: 2 })
        );
        assert_eq!(wizard.email(), "user@test.com");
    }

    #[test]
    fn incomplete_code_issues_no_verify_request() {
        let mut wizard = at_step_two();
        for code in ["12345", "1234567", "12a456", ""] {
            assert_eq!(wizard.enter_code(code), Err(WizardError::IncompleteOtp));
        }
        assert_eq!(wizard.begin_verify_otp(), Err(WizardError::IncompleteOtp));
        assert!(!wizard.is_busy());
    }

    #[test]
    fn failed_verification_clears_digits_without_toast() {
        let mut wizard = at_step_two();
        wizard.enter_code("999999").unwrap();
        wizard.begin_verify_otp().unwrap();

        let notice = wizard.finish_verify_otp(Ok(ApiReply::failed("Invalid OTP")));
        assert_eq!(notice, None);
        assert_eq!(wizard.step(), Step::OtpVerify);
        assert_eq!(wizard.otp().filled(), 0);
        assert_eq!(wizard.error(), Some("Invalid OTP"));
    }

    #[test]
    fn weak_or_mismatched_password_is_rejected_inline() {
        let mut wizard = at_step_three();

        wizard.set_passwords("short", "short").unwrap();
        assert!(matches!(
            wizard.begin_reset_password(),
            Err(WizardError::WeakPassword(_))
        ));

        wizard.set_passwords("Str0ng!pw", "Str0ng!pv").unwrap();
        assert_eq!(wizard.begin_reset_password(), Err(WizardError::PasswordMismatch));
        assert_eq!(wizard.error(), Some("Passwords do not match"));
        assert_eq!(wizard.step(), Step::NewPassword);
    }

    #[test]
    fn successful_reset_closes_wizard() {
        let mut wizard = at_step_three();
        wizard.set_passwords("Str0ng!pw", "Str0ng!pw").unwrap();

        let request = wizard.begin_reset_password().unwrap();
        assert_eq!(request.email, "user@test.com");
        assert_eq!(request.password, "Str0ng!pw");

        let notice = wizard.finish_reset_password(Ok(ApiReply::ok()));
        assert!(matches!(notice, Some(Notice::Success(_))));
        assert_eq!(wizard, ResetWizard::default());
    }

    #[test]
    fn failed_reset_stays_on_step_three() {
        let mut wizard = at_step_three();
        wizard.set_passwords("Str0ng!pw", "Str0ng!pw").unwrap();
        wizard.begin_reset_password().unwrap();

        let notice = wizard.finish_reset_password(Ok(ApiReply::failed("Token expired")));
        assert_eq!(notice, Some(Notice::Error("Token expired".into())));
        assert_eq!(wizard.step(), Step::NewPassword);
    }

    #[test]
    fn back_keeps_values_and_clears_error() {
        let mut wizard = at_step_three();
        wizard.set_passwords("weak", "weak").unwrap();
        let _ = wizard.begin_reset_password();
        assert!(wizard.error().is_some());

        assert!(wizard.back());
        assert_eq!(wizard.step(), Step::OtpVerify);
        assert_eq!(wizard.error(), None);
        assert_eq!(wizard.otp().code().as_deref(), Some("123456"));

        assert!(wizard.back());
        assert_eq!(wizard.step(), Step::EmailEntry);
        assert_eq!(wizard.email(), "user@test.com");

        assert!(!wizard.back());
        assert_eq!(wizard.step(), Step::EmailEntry);
    }

    #[test]
    fn outcome_arriving_after_back_is_discarded() {
        let mut wizard = at_step_two();
        wizard.enter_code("123456").unwrap();
        wizard.begin_verify_otp().unwrap();
        wizard.back();

        assert_eq!(wizard.finish_verify_otp(Ok(ApiReply::ok())), None);
        assert_eq!(wizard.step(), Step::EmailEntry);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn resend_stays_on_step_two() {
        let mut wizard = at_step_two();
        wizard.set_otp_digit(0, '4').unwrap();

        let request = wizard.begin_resend_otp(Some("tok-2")).unwrap();
        assert_eq!(request.captcha_token, "tok-2");
        let notice = wizard.finish_resend_otp(Ok(ApiReply::ok()));

        assert!(matches!(notice, Some(Notice::Success(_))));
        assert_eq!(wizard.step(), Step::OtpVerify);
        assert_eq!(wizard.otp().filled(), 0);
    }

    #[test]
    fn passwords_stay_out_of_the_session() {
        let mut wizard = at_step_three();
        wizard.set_passwords("Str0ng!pw", "Str0ng!pw").unwrap();
        let stored = serde_json::to_string(&wizard).unwrap();
        assert!(!stored.contains("Str0ng!pw"));

        let restored: ResetWizard = serde_json::from_str(&stored).unwrap();
        assert!(restored.password_checks().all_passed());
    }

    #[test]
    fn failed_attempt_forgets_passwords_but_keeps_checks() {
        let mut wizard = at_step_three();
        wizard.set_passwords("Str0ng!pw", "Str0ng!pv").unwrap();
        assert_eq!(wizard.begin_reset_password(), Err(WizardError::PasswordMismatch));

        assert!(wizard.password_checks().all_passed());
        assert!(matches!(
            wizard.begin_reset_password(),
            Err(WizardError::WeakPassword(_))
        ));
    }

    #[test]
    fn wizard_survives_session_round_trip() {
        let wizard = at_step_two();
        let json = serde_json::to_value(&wizard).unwrap();
        let restored: ResetWizard = serde_json::from_value(json).unwrap();
        assert_eq!(restored, wizard);
    }

    #[test]
    fn notice_serializes_for_toast_trigger() {
        let value = serde_json::to_value(Notice::Error("Failed".into())).unwrap();
        assert_eq!(value, serde_json::json!({"level": "error", "message": "Failed"}));
    }
}
