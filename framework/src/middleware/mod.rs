//! Middleware for Polaris
//!
//! A middleware receives the request and a [`Next`] continuation. Calling
//! `next(request).await` runs the rest of the chain; returning without
//! calling it short-circuits.
//!
//! ```rust,ignore
//! use polaris::{async_trait, Middleware, Next, Request, Response};
//!
//! pub struct Timing;
//!
//! #[async_trait]
//! impl Middleware for Timing {
//!     async fn handle(&self, request: Request, next: Next) -> Response {
//!         let start = std::time::Instant::now();
//!         let response = next(request).await;
//!         tracing::debug!("took {:?}", start.elapsed());
//!         response
//!     }
//! }
//! ```

mod database;
mod logger;
mod recovery;
mod registry;
mod render;
mod static_files;

pub use database::DatabaseMiddleware;
pub use logger::Logger;
pub use recovery::Recovery;
pub use registry::MiddlewareRegistry;
pub use render::{Render, Renderer};
pub use static_files::Static;

use crate::http::{Request, Response};
use crate::routing::BoxedHandler;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed response future
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Continuation handed to a middleware
pub type Next = Arc<dyn Fn(Request) -> BoxFuture + Send + Sync>;

/// Type-erased middleware as stored in the registry and the router
pub type BoxedMiddleware = Arc<dyn Fn(Request, Next) -> BoxFuture + Send + Sync>;

/// A request/response interceptor
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: Request, next: Next) -> Response;
}

/// Erase a middleware into its boxed form
pub fn into_boxed<M: Middleware + 'static>(middleware: M) -> BoxedMiddleware {
    let middleware = Arc::new(middleware);
    Arc::new(move |request: Request, next: Next| -> BoxFuture {
        let middleware = middleware.clone();
        Box::pin(async move { middleware.handle(request, next).await })
    })
}

/// An ordered list of middleware run around a final handler
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middleware: Vec<BoxedMiddleware>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, middleware: BoxedMiddleware) {
        self.middleware.push(middleware);
    }

    pub fn extend(&mut self, middleware: impl IntoIterator<Item = BoxedMiddleware>) {
        self.middleware.extend(middleware);
    }

    pub fn len(&self) -> usize {
        self.middleware.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middleware.is_empty()
    }

    /// Run the chain, first registered outermost, ending in `handler`
    pub async fn execute(&self, request: Request, handler: Arc<BoxedHandler>) -> Response {
        let mut next: Next = Arc::new(move |req: Request| -> BoxFuture { handler(req) });

        for middleware in self.middleware.iter().rev() {
            let middleware = middleware.clone();
            let inner = next;
            next = Arc::new(move |req: Request| -> BoxFuture { middleware(req, inner.clone()) });
        }

        next(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{text, HttpResponse};
    use bytes::Bytes;
    use std::sync::Mutex;

    struct Tag {
        name: &'static str,
        seen: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl Middleware for Tag {
        async fn handle(&self, request: Request, next: Next) -> Response {
            self.seen.lock().unwrap().push(self.name);
            next(request).await
        }
    }

    struct Deny;

    #[async_trait]
    impl Middleware for Deny {
        async fn handle(&self, _request: Request, _next: Next) -> Response {
            Err(HttpResponse::text("denied").status(403))
        }
    }

    fn request() -> Request {
        Request::new(http::Request::builder().uri("/").body(Bytes::new()).unwrap())
    }

    fn handler() -> Arc<BoxedHandler> {
        let handler: BoxedHandler = Box::new(|_req: Request| -> BoxFuture { Box::pin(async { text("done") }) });
        Arc::new(handler)
    }

    #[tokio::test]
    async fn test_chain_runs_in_registration_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(into_boxed(Tag { name: "first", seen: seen.clone() }));
        chain.push(into_boxed(Tag { name: "second", seen: seen.clone() }));

        let response = chain.execute(request(), handler()).await.unwrap();

        assert_eq!(response.status_code(), 200);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_middleware_can_short_circuit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut chain = MiddlewareChain::new();
        chain.push(into_boxed(Deny));
        chain.push(into_boxed(Tag { name: "never", seen: seen.clone() }));

        let response = chain.execute(request(), handler()).await.unwrap_err();

        assert_eq!(response.status_code(), 403);
        assert!(seen.lock().unwrap().is_empty());
    }
}
