use super::{Middleware, Next};
use crate::database::DbEngine;
use crate::http::{Request, Response};
use async_trait::async_trait;

/// Hands the shared database engine to handlers through `Request::db`
pub struct DatabaseMiddleware {
    engine: DbEngine,
}

impl DatabaseMiddleware {
    pub fn new(engine: DbEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Middleware for DatabaseMiddleware {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        request.insert_extension(self.engine.clone());
        next(request).await
    }
}
