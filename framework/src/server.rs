use crate::error::FrameworkError;
use crate::http::{collect_body, HttpResponse, Request, Response};
use crate::middleware::{BoxFuture, MiddlewareChain, MiddlewareRegistry};
use crate::routing::{BoxedHandler, Router};
use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// A composed application ready to answer requests
pub struct Server {
    router: Arc<Router>,
    middleware: MiddlewareRegistry,
    host: String,
    port: u16,
}

impl Server {
    pub fn new(router: Router, middleware: MiddlewareRegistry, host: &str, port: u16) -> Self {
        Self {
            router: Arc::new(router),
            middleware,
            host: host.to_string(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Answer a single request in-process
    ///
    /// Global middleware wraps route dispatch, so it also sees requests no
    /// route matches (static files, 404s).
    pub async fn handle(&self, request: Request) -> HttpResponse {
        let is_head = request.method() == http::Method::HEAD;

        let router = self.router.clone();
        let dispatcher: BoxedHandler = Box::new(move |request: Request| -> BoxFuture {
            let router = router.clone();
            Box::pin(async move { dispatch(&router, request).await })
        });

        let mut chain = MiddlewareChain::new();
        chain.extend(self.middleware.global_middleware().iter().cloned());

        // Both Ok and Err carry a response
        let response = chain
            .execute(request, Arc::new(dispatcher))
            .await
            .unwrap_or_else(|e| e);

        if is_head {
            response.without_body()
        } else {
            response
        }
    }

    /// Bind `host:port` and serve until the process ends
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Bind` when the address cannot be bound.
    pub async fn serve(self) -> Result<(), FrameworkError> {
        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| FrameworkError::Bind {
                addr: addr.clone(),
                message: e.to_string(),
            })?;

        tracing::info!("Polaris listening on http://{}", addr);

        let server = Arc::new(self);
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(connection) => connection,
                Err(e) => {
                    tracing::warn!("Failed to accept connection: {}", e);
                    continue;
                }
            };
            let io = TokioIo::new(stream);
            let server = server.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                    let server = server.clone();
                    async move { Ok::<_, Infallible>(server.handle_hyper(req, peer).await) }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    tracing::debug!("Error serving connection: {:?}", err);
                }
            });
        }
    }

    async fn handle_hyper(
        &self,
        req: hyper::Request<hyper::body::Incoming>,
        peer: SocketAddr,
    ) -> hyper::Response<Full<Bytes>> {
        let (parts, body) = req.into_parts();
        let body = match collect_body(body).await {
            Ok(body) => body,
            Err(e) => return HttpResponse::from(e).status(400).into_hyper(),
        };
        let request = Request::new(http::Request::from_parts(parts, body)).with_remote_addr(peer);
        self.handle(request).await.into_hyper()
    }
}

async fn dispatch(router: &Router, request: Request) -> Response {
    let Some((handler, pattern, params)) = router.match_route(request.method(), request.path())
    else {
        return Err(HttpResponse::text("404 Not Found").status(404));
    };

    let mut chain = MiddlewareChain::new();
    chain.extend(router.get_route_middleware(request.method(), &pattern));
    chain.execute(request.with_params(params), handler).await
}
