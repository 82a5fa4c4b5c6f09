//! Three-step forgot-password wizard: email, one-time code, new password.

pub mod flow;
pub mod otp_input;
pub mod validation;
pub mod wizard;

pub use flow::ResetFlow;
pub use otp_input::{OtpInput, OtpInputError, AUTO_SUBMIT_DELAY, OTP_LENGTH};
pub use validation::{is_valid_email, is_valid_otp, PasswordChecks};
pub use wizard::{Notice, ResetWizard, Step, WizardError};
