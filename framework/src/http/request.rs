use super::body::{parse_form, parse_json};
use super::ParamError;
use crate::auth::AuthUser;
use crate::database::DbEngine;
use crate::error::FrameworkError;
use crate::middleware::Renderer;
use crate::session::Session;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// HTTP Request wrapper
///
/// The body is collected before the middleware chain runs, so the request
/// can be inspected and rebuilt freely by middleware and tests.
pub struct Request {
    inner: http::Request<Bytes>,
    params: HashMap<String, String>,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    pub fn new(inner: http::Request<Bytes>) -> Self {
        Self {
            inner,
            params: HashMap::new(),
            remote_addr: None,
        }
    }

    pub fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Get the request method
    pub fn method(&self) -> &http::Method {
        self.inner.method()
    }

    /// Get the request path
    pub fn path(&self) -> &str {
        self.inner.uri().path()
    }

    /// Get the raw query string, if any
    pub fn query(&self) -> Option<&str> {
        self.inner.uri().query()
    }

    /// Decoded value of a query string parameter
    pub fn query_param(&self, name: &str) -> Option<String> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(self.query()?).ok()?;
        pairs
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Get a route parameter by name (e.g., /users/{id})
    /// Returns Err(ParamError) if the parameter is missing, enabling use of `?` operator
    pub fn param(&self, name: &str) -> Result<&str, ParamError> {
        self.params
            .get(name)
            .map(|s| s.as_str())
            .ok_or_else(|| ParamError {
                param_name: name.to_string(),
            })
    }

    /// Get all route parameters
    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }

    /// Get a header value by name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    /// Get the Content-Type header
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Peer address of the TCP connection
    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Best guess at the client address
    ///
    /// `X-Real-IP` wins, then `X-Forwarded-For`, then the peer address.
    pub fn client_addr(&self) -> String {
        self.header("X-Real-IP")
            .filter(|v| !v.is_empty())
            .or_else(|| self.header("X-Forwarded-For").filter(|v| !v.is_empty()))
            .map(str::to_string)
            .or_else(|| self.remote_addr.map(|addr| addr.to_string()))
            .unwrap_or_default()
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        self.inner.body()
    }

    /// Get a typed value stored by middleware
    pub fn extension<T: Clone + Send + Sync + 'static>(&self) -> Option<T> {
        self.inner.extensions().get::<T>().cloned()
    }

    /// Store a typed value for later middleware and the handler
    pub fn insert_extension<T: Clone + Send + Sync + 'static>(&mut self, value: T) {
        self.inner.extensions_mut().insert(value);
    }

    /// Session attached by the session middleware
    pub fn session(&self) -> Result<Session, FrameworkError> {
        self.extension::<Session>()
            .ok_or_else(|| FrameworkError::internal("Session middleware is not registered"))
    }

    /// Current user attached by the authentication middleware
    pub fn user(&self) -> Result<AuthUser, FrameworkError> {
        self.extension::<AuthUser>()
            .ok_or_else(|| FrameworkError::internal("Authentication middleware is not registered"))
    }

    /// Shared database engine, when database wiring is enabled
    pub fn db(&self) -> Result<DbEngine, FrameworkError> {
        self.extension::<DbEngine>()
            .ok_or_else(|| FrameworkError::database("Database is not configured"))
    }

    /// Template renderer attached by the render middleware
    pub fn renderer(&self) -> Result<Arc<Renderer>, FrameworkError> {
        self.extension::<Arc<Renderer>>()
            .ok_or_else(|| FrameworkError::internal("Render middleware is not registered"))
    }

    /// Parse the request body as JSON
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// #[derive(Deserialize)]
    /// struct CreateUser { name: String, email: String }
    ///
    /// pub async fn store(req: Request) -> Response {
    ///     let data: CreateUser = req.json()?;
    ///     // ...
    /// }
    /// ```
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_json(self.inner.body())
    }

    /// Parse the request body as form-urlencoded
    pub fn form<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        parse_form(self.inner.body())
    }

    /// Parse the request body based on Content-Type header
    ///
    /// - `application/x-www-form-urlencoded` -> Form parsing
    /// - Otherwise -> JSON parsing (default)
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, FrameworkError> {
        match self.content_type() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => self.form(),
            _ => self.json(),
        }
    }

    /// Get the inner http request
    pub fn inner(&self) -> &http::Request<Bytes> {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/users?page=2");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        Request::new(builder.body(Bytes::new()).unwrap())
            .with_remote_addr("10.0.0.9:51000".parse().unwrap())
    }

    #[test]
    fn test_client_addr_prefers_real_ip() {
        let req = request_with(&[("X-Real-IP", "1.2.3.4"), ("X-Forwarded-For", "5.6.7.8")]);
        assert_eq!(req.client_addr(), "1.2.3.4");
    }

    #[test]
    fn test_client_addr_falls_back_to_forwarded_for() {
        let req = request_with(&[("X-Forwarded-For", "5.6.7.8")]);
        assert_eq!(req.client_addr(), "5.6.7.8");
    }

    #[test]
    fn test_client_addr_falls_back_to_peer() {
        let req = request_with(&[]);
        assert_eq!(req.client_addr(), "10.0.0.9:51000");
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query(), Some("page=2"));
        assert_eq!(req.query_param("page").as_deref(), Some("2"));
        assert_eq!(req.query_param("size"), None);
    }

    #[test]
    fn test_input_uses_content_type() {
        #[derive(serde::Deserialize)]
        struct Login {
            user: String,
        }

        let req = Request::new(
            http::Request::builder()
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Bytes::from_static(b"user=robin"))
                .unwrap(),
        );
        let login: Login = req.input().unwrap();
        assert_eq!(login.user, "robin");

        let req = Request::new(
            http::Request::builder()
                .body(Bytes::from_static(br#"{"user":"min"}"#))
                .unwrap(),
        );
        let login: Login = req.input().unwrap();
        assert_eq!(login.user, "min");
    }

    #[test]
    fn test_missing_extensions_are_errors() {
        let req = request_with(&[]);
        assert!(req.session().is_err());
        assert!(req.user().is_err());
        assert!(req.db().is_err());
    }
}
