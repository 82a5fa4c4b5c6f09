//! In-process async driver for [`ResetWizard`].

use super::otp_input::AUTO_SUBMIT_DELAY;
use super::wizard::{CallOutcome, Notice, ResetWizard, Step, WizardError};
use crate::services::{metrics, PasswordResetApi};

/// Count a backend call by step and outcome.
pub fn record_outcome(step: &str, outcome: &CallOutcome) {
    let label = match outcome {
        Ok(reply) if reply.success => "success",
        Ok(_) => "rejected",
        Err(_) => "error",
    };
    metrics::record_reset_step(step, label);
}

/// Drives a wizard against a [`PasswordResetApi`], one request at a time.
///
/// Validation failures come back as `Err` and leave no request behind;
/// backend failures are reflected in the wizard's inline error and in the
/// queued notices.
pub struct ResetFlow<A> {
    api: A,
    wizard: ResetWizard,
    notices: Vec<Notice>,
}

impl<A: PasswordResetApi> ResetFlow<A> {
    pub fn new(api: A) -> Self {
        Self::with_wizard(api, ResetWizard::new())
    }

    pub fn with_wizard(api: A, wizard: ResetWizard) -> Self {
        Self {
            api,
            wizard,
            notices: Vec::new(),
        }
    }

    pub fn wizard(&self) -> &ResetWizard {
        &self.wizard
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn push(&mut self, notice: Option<Notice>) {
        self.notices.extend(notice);
    }

    pub async fn send_otp(
        &mut self,
        email: &str,
        captcha_token: Option<&str>,
    ) -> Result<Step, WizardError> {
        self.wizard.set_email(email)?;
        let request = self.wizard.begin_send_otp(captcha_token)?;

        let outcome = self.api.request_otp(&request).await;
        record_outcome("request_otp", &outcome);
        let notice = self.wizard.finish_send_otp(outcome);
        self.push(notice);

        Ok(self.wizard.step())
    }

    pub async fn resend_otp(&mut self, captcha_token: Option<&str>) -> Result<Step, WizardError> {
        let request = self.wizard.begin_resend_otp(captcha_token)?;

        let outcome = self.api.request_otp(&request).await;
        record_outcome("request_otp", &outcome);
        let notice = self.wizard.finish_resend_otp(outcome);
        self.push(notice);

        Ok(self.wizard.step())
    }

    /// Type one digit. The sixth digit submits the code on its own after
    /// [`AUTO_SUBMIT_DELAY`].
    pub async fn enter_digit(&mut self, index: usize, ch: char) -> Result<Step, WizardError> {
        if self.wizard.set_otp_digit(index, ch)? {
            tokio::time::sleep(AUTO_SUBMIT_DELAY).await;
            return self.submit_otp().await;
        }
        Ok(self.wizard.step())
    }

    pub async fn submit_otp(&mut self) -> Result<Step, WizardError> {
        let request = self.wizard.begin_verify_otp()?;

        let outcome = self.api.validate_otp(&request).await;
        record_outcome("validate_otp", &outcome);
        let notice = self.wizard.finish_verify_otp(outcome);
        self.push(notice);

        Ok(self.wizard.step())
    }

    pub async fn reset_password(
        &mut self,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<Step, WizardError> {
        self.wizard.set_passwords(new_password, confirm_password)?;
        let request = self.wizard.begin_reset_password()?;

        let outcome = self.api.reset_password(&request).await;
        record_outcome("reset_password", &outcome);
        let notice = self.wizard.finish_reset_password(outcome);
        self.push(notice);

        Ok(self.wizard.step())
    }

    pub fn back(&mut self) -> bool {
        self.wizard.back()
    }

    pub fn close(&mut self) {
        self.wizard.close();
        self.notices.clear();
    }
}
