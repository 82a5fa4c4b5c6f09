pub mod api;
pub mod user;

pub use api::{ApiReply, LoginReply, OtpRequest, OtpValidation, PasswordReset};
pub use user::{AuthUser, Role, UserSession};
