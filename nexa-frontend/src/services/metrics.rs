//! Prometheus metrics for nexa-frontend.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec, TextEncoder,
};
use std::time::Instant;

/// HTTP request counter by method, route and status.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "nexa_http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .expect("Failed to register http_requests_total")
});

pub static HTTP_REQUEST_DURATION_SECONDS: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "nexa_http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"]
    )
    .expect("Failed to register http_request_duration_seconds")
});

/// Password-reset backend calls by step and outcome.
pub static RESET_STEPS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "nexa_password_reset_steps_total",
        "Password reset backend calls by step and outcome",
        &["step", "outcome"] // request_otp|validate_otp|reset_password, success|rejected|error
    )
    .expect("Failed to register password_reset_steps_total")
});

/// Checkout hand-offs and callback verifications by outcome.
pub static CHECKOUTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "nexa_checkouts_total",
        "PayHere checkout events by stage and outcome",
        &["stage", "outcome"] // submit|validate|return|cancel
    )
    .expect("Failed to register checkouts_total")
});

pub fn init_metrics() {
    Lazy::force(&HTTP_REQUESTS_TOTAL);
    Lazy::force(&HTTP_REQUEST_DURATION_SECONDS);
    Lazy::force(&RESET_STEPS_TOTAL);
    Lazy::force(&CHECKOUTS_TOTAL);
}

pub fn record_reset_step(step: &str, outcome: &str) {
    RESET_STEPS_TOTAL.with_label_values(&[step, outcome]).inc();
}

pub fn record_checkout(stage: &str, outcome: &str) {
    CHECKOUTS_TOTAL.with_label_values(&[stage, outcome]).inc();
}

/// Get metrics in Prometheus text format.
pub fn get_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    // Route template keeps label cardinality bounded.
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(start.elapsed().as_secs_f64());

    response
}
