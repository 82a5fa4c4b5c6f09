pub mod app;
pub mod auth;
pub mod donation;
pub mod metrics;
pub mod password_reset;
