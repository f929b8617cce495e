use super::{Middleware, Next};
use crate::http::{HttpResponse, Request, Response};
use async_trait::async_trait;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;

/// Turns a panic anywhere further down the chain into a 500 response
pub struct Recovery;

#[async_trait]
impl Middleware for Recovery {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let method = request.method().clone();
        let path = request.path().to_string();

        match AssertUnwindSafe(next(request)).catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Panic while handling {} {}: {}", method, path, message);
                Err(HttpResponse::text("Internal Server Error").status(500))
            }
        }
    }
}
