pub mod config;
pub mod handlers;
pub mod models;
pub mod payhere;
pub mod reset;
pub mod services;
pub mod startup;

use payhere::PayHereGateway;
use services::auth_client::AuthClient;
use std::sync::Arc;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub auth_client: Arc<AuthClient>,
    pub payhere: Arc<PayHereGateway>,
}

impl AppState {
    pub fn new(auth_client: Arc<AuthClient>, payhere: Arc<PayHereGateway>) -> Self {
        Self {
            auth_client,
            payhere,
        }
    }
}
