use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const TIMING_HEADER: &str = "x-invite-timing-ms";

/// Report how long the tracking handler took in a response header
pub async fn record_request_timing(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let mut response = next.run(request).await;

    let elapsed_ms = start.elapsed().as_millis().to_string();
    if let Ok(value) = elapsed_ms.parse::<HeaderValue>() {
        response.headers_mut().insert(TIMING_HEADER, value);
    }
    response
}
