//! Audit logging middleware.
//!
//! Logs every API request with request id, staff user, method, path,
//! status and latency. Runs innermost on protected routes (after auth has
//! injected `StaffContext`) and directly on public ones.

use std::time::Instant;

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::api::types::StaffContext;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let started = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let request_id = Uuid::new_v4().to_string();

    let user = req
        .extensions()
        .get::<StaffContext>()
        .map(|s| s.user.username.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let mut response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    if response.status().is_server_error() {
        tracing::error!(%request_id, %user, %method, %path, status, elapsed_ms, "api request");
    } else {
        tracing::info!(%request_id, %user, %method, %path, status, elapsed_ms, "api request");
    }

    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    response
}
