use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Content-Security-Policy applied to every rendered page.
///
/// Pages post forms to third-party checkout hosts, so those origins must be
/// listed under `form-action`.
#[derive(Clone, Debug)]
pub struct ContentSecurityPolicy(HeaderValue);

impl ContentSecurityPolicy {
    pub fn for_pages(form_action_origins: &[&str]) -> Result<Self, header::InvalidHeaderValue> {
        let mut form_action = String::from("'self'");
        for origin in form_action_origins {
            form_action.push(' ');
            form_action.push_str(origin);
        }

        let policy = format!(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline' https://unpkg.com; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data:; \
             connect-src 'self'; \
             frame-ancestors 'none'; \
             form-action {}",
            form_action
        );

        Ok(Self(HeaderValue::from_str(&policy)?))
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.0
    }
}

pub async fn security_headers_middleware(
    State(csp): State<ContentSecurityPolicy>,
    req: Request,
    next: Next,
) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(header::CONTENT_SECURITY_POLICY, csp.0.clone());

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_checkout_origin_under_form_action() {
        let csp = ContentSecurityPolicy::for_pages(&["https://sandbox.payhere.lk"]).unwrap();
        let value = csp.header_value().to_str().unwrap();
        assert!(value.ends_with("form-action 'self' https://sandbox.payhere.lk"));
        assert!(value.contains("frame-ancestors 'none'"));
    }

    #[test]
    fn defaults_to_same_origin_forms() {
        let csp = ContentSecurityPolicy::for_pages(&[]).unwrap();
        assert!(csp.header_value().to_str().unwrap().ends_with("form-action 'self'"));
    }
}
