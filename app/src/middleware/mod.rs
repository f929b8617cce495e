use async_trait::async_trait;
use polaris::{Middleware, Next, Request, Response, ResponseExt};

/// Tags every successful response with the framework name
pub struct PoweredBy;

#[async_trait]
impl Middleware for PoweredBy {
    async fn handle(&self, request: Request, next: Next) -> Response {
        next(request).await.header("X-Powered-By", "Polaris")
    }
}
