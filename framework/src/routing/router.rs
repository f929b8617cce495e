use crate::http::{Request, Response};
use crate::middleware::{into_boxed, BoxedMiddleware, Middleware};
use matchit::Router as MatchitRouter;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for route handlers
pub type BoxedHandler =
    Box<dyn Fn(Request) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync>;

/// A registered handler together with the pattern it was registered under
#[derive(Clone)]
struct Route {
    handler: Arc<BoxedHandler>,
    pattern: String,
}

/// HTTP Router backed by one matchit table per method
pub struct Router {
    get_routes: MatchitRouter<Route>,
    post_routes: MatchitRouter<Route>,
    put_routes: MatchitRouter<Route>,
    patch_routes: MatchitRouter<Route>,
    delete_routes: MatchitRouter<Route>,
    /// Middleware assignments: (method, path pattern) -> boxed middleware instances
    route_middleware: HashMap<(http::Method, String), Vec<BoxedMiddleware>>,
}

impl Router {
    pub fn new() -> Self {
        Self {
            get_routes: MatchitRouter::new(),
            post_routes: MatchitRouter::new(),
            put_routes: MatchitRouter::new(),
            patch_routes: MatchitRouter::new(),
            delete_routes: MatchitRouter::new(),
            route_middleware: HashMap::new(),
        }
    }

    /// Get middleware for a method and route pattern
    pub fn get_route_middleware(
        &self,
        method: &http::Method,
        pattern: &str,
    ) -> Vec<BoxedMiddleware> {
        let method = if *method == http::Method::HEAD {
            http::Method::GET
        } else {
            method.clone()
        };
        self.route_middleware
            .get(&(method, pattern.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    fn table_mut(&mut self, method: &http::Method) -> Option<&mut MatchitRouter<Route>> {
        match *method {
            http::Method::GET => Some(&mut self.get_routes),
            http::Method::POST => Some(&mut self.post_routes),
            http::Method::PUT => Some(&mut self.put_routes),
            http::Method::PATCH => Some(&mut self.patch_routes),
            http::Method::DELETE => Some(&mut self.delete_routes),
            _ => None,
        }
    }

    fn table(&self, method: &http::Method) -> Option<&MatchitRouter<Route>> {
        match *method {
            // HEAD is answered by the GET handler
            http::Method::GET | http::Method::HEAD => Some(&self.get_routes),
            http::Method::POST => Some(&self.post_routes),
            http::Method::PUT => Some(&self.put_routes),
            http::Method::PATCH => Some(&self.patch_routes),
            http::Method::DELETE => Some(&self.delete_routes),
            _ => None,
        }
    }

    /// Register a handler for a method and path pattern
    pub fn route<H, Fut>(&mut self, method: http::Method, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        let handler: BoxedHandler =
            Box::new(move |req: Request| -> Pin<Box<dyn Future<Output = Response> + Send>> {
                Box::pin(handler(req))
            });
        let route = Route {
            handler: Arc::new(handler),
            pattern: path.to_string(),
        };
        match self.table_mut(&method) {
            Some(table) => {
                if let Err(e) = table.insert(path, route) {
                    tracing::warn!("Route {} {} not registered: {}", method, path, e);
                }
            }
            None => tracing::warn!("Unsupported method {} for route {}", method, path),
        }
        RouteBuilder {
            router: self,
            last_method: method,
            last_path: path.to_string(),
        }
    }

    /// Register a GET route
    pub fn get<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(http::Method::GET, path, handler)
    }

    /// Register a POST route
    pub fn post<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(http::Method::POST, path, handler)
    }

    /// Register a PUT route
    pub fn put<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(http::Method::PUT, path, handler)
    }

    /// Register a PATCH route
    pub fn patch<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(http::Method::PATCH, path, handler)
    }

    /// Register a DELETE route
    pub fn delete<H, Fut>(&mut self, path: &str, handler: H) -> RouteBuilder<'_>
    where
        H: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Response> + Send + 'static,
    {
        self.route(http::Method::DELETE, path, handler)
    }

    /// Match a request and return the handler, its pattern and extracted params
    pub fn match_route(
        &self,
        method: &http::Method,
        path: &str,
    ) -> Option<(Arc<BoxedHandler>, String, HashMap<String, String>)> {
        let table = self.table(method)?;

        table.at(path).ok().map(|matched| {
            let params: HashMap<String, String> = matched
                .params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            (
                matched.value.handler.clone(),
                matched.value.pattern.clone(),
                params,
            )
        })
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder returned after registering a route, enabling `.middleware()` chaining
pub struct RouteBuilder<'a> {
    router: &'a mut Router,
    last_method: http::Method,
    last_path: String,
}

impl RouteBuilder<'_> {
    /// Apply middleware to the most recently registered route
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// app.get("/profile", profile_handler).middleware(LoginRequired);
    /// ```
    pub fn middleware<M: Middleware + 'static>(self, middleware: M) -> Self {
        self.router
            .route_middleware
            .entry((self.last_method.clone(), self.last_path.clone()))
            .or_default()
            .push(into_boxed(middleware));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::text;

    #[test]
    fn test_match_route_with_params() {
        let mut router = Router::new();
        router.get("/users/{id}", |_req| async { text("user") });

        let (_, pattern, params) = router
            .match_route(&http::Method::GET, "/users/42")
            .expect("route should match");
        assert_eq!(pattern, "/users/{id}");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        assert!(router.match_route(&http::Method::POST, "/users/42").is_none());
        assert!(router.match_route(&http::Method::GET, "/missing").is_none());
    }

    #[test]
    fn test_head_uses_get_table() {
        let mut router = Router::new();
        router.get("/", |_req| async { text("root") });
        assert!(router.match_route(&http::Method::HEAD, "/").is_some());
    }

    #[test]
    fn test_route_middleware_found_by_pattern() {
        struct Noop;

        #[async_trait::async_trait]
        impl Middleware for Noop {
            async fn handle(&self, request: Request, next: crate::middleware::Next) -> Response {
                next(request).await
            }
        }

        let mut router = Router::new();
        router
            .get("/users/{id}", |_req| async { text("user") })
            .middleware(Noop);

        let (_, pattern, _) = router.match_route(&http::Method::GET, "/users/7").unwrap();
        assert_eq!(pattern, "/users/{id}");
        assert_eq!(router.get_route_middleware(&http::Method::GET, &pattern).len(), 1);
        assert_eq!(router.get_route_middleware(&http::Method::HEAD, &pattern).len(), 1);
    }

    #[test]
    fn test_route_middleware_is_per_method() {
        struct Noop;

        #[async_trait::async_trait]
        impl Middleware for Noop {
            async fn handle(&self, request: Request, next: crate::middleware::Next) -> Response {
                next(request).await
            }
        }

        let mut router = Router::new();
        router.get("/profile", |_req| async { text("show") }).middleware(Noop);
        router.post("/profile", |_req| async { text("update") });

        assert_eq!(router.get_route_middleware(&http::Method::GET, "/profile").len(), 1);
        assert!(router
            .get_route_middleware(&http::Method::POST, "/profile")
            .is_empty());
    }
}
