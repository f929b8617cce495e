use super::{Middleware, Next};
use crate::http::{Request, Response};
use async_trait::async_trait;
use std::time::Instant;

/// Logs every request on the way in and its status on the way out
///
/// The client address prefers `X-Real-IP`, then `X-Forwarded-For`, then the
/// peer address of the connection.
pub struct Logger;

#[async_trait]
impl Middleware for Logger {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let start = Instant::now();
        let method = request.method().clone();
        let path = request.path().to_string();

        tracing::debug!(
            "==> Started {} {} for {}",
            method,
            path,
            request.client_addr()
        );

        let response = next(request).await;

        let status = match &response {
            Ok(r) | Err(r) => r.status_code(),
        };
        let reason = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");
        tracing::debug!(
            "<== Completed {} {} in {:?} ({} {})",
            status,
            reason,
            start.elapsed(),
            method,
            path
        );

        response
    }
}
