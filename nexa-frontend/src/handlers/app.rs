use askama::Template;
use axum::response::IntoResponse;

use crate::models::AuthUser;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub user_name: Option<String>,
    pub role: Option<String>,
}

pub async fn index(user: Option<AuthUser>) -> impl IntoResponse {
    let (user_name, role) = match user {
        Some(AuthUser(session)) => (
            Some(session.display_name().to_string()),
            Some(session.role.to_string()),
        ),
        None => (None, None),
    };
    IndexTemplate { user_name, role }
}

pub async fn health_check() -> &'static str {
    "OK"
}
