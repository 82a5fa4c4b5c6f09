pub mod auth_client;
pub mod metrics;

pub use auth_client::{AuthClient, ClientError, PasswordResetApi};
