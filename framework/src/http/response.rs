use bytes::Bytes;
use http_body_util::Full;

/// HTTP Response builder
#[derive(Debug)]
pub struct HttpResponse {
    status: u16,
    body: Bytes,
    headers: Vec<(String, String)>,
}

/// Response type alias - allows using `?` operator for early returns
pub type Response = Result<HttpResponse, HttpResponse>;

impl HttpResponse {
    pub fn new() -> Self {
        Self {
            status: 200,
            body: Bytes::new(),
            headers: Vec::new(),
        }
    }

    /// Create a response with a string body
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: Bytes::from(body.into()),
            headers: vec![("Content-Type".to_string(), "text/plain".to_string())],
        }
    }

    /// Create an HTML response announcing the given charset
    pub fn html(body: impl Into<String>, charset: &str) -> Self {
        Self {
            status: 200,
            body: Bytes::from(body.into()),
            headers: vec![(
                "Content-Type".to_string(),
                format!("text/html; charset={}", charset),
            )],
        }
    }

    /// Create a JSON response from a serde_json::Value
    pub fn json(body: serde_json::Value) -> Self {
        Self {
            status: 200,
            body: Bytes::from(body.to_string()),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        }
    }

    /// Create a response with a raw body and content type
    pub fn bytes(body: impl Into<Bytes>, content_type: &str) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: vec![("Content-Type".to_string(), content_type.to_string())],
        }
    }

    /// Set the HTTP status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header to the response
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add a header in place (used by middleware on the way out)
    pub fn push_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    /// The HTTP status code
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Value of the first header with this name (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All headers in insertion order
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The response body
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Drop the body, keeping status and headers (HEAD requests)
    pub fn without_body(mut self) -> Self {
        self.body = Bytes::new();
        self
    }

    /// Wrap this response in Ok() for use as Response type
    pub fn ok(self) -> Response {
        Ok(self)
    }

    /// Convert to hyper response
    pub fn into_hyper(self) -> hyper::Response<Full<Bytes>> {
        let mut builder = hyper::Response::builder().status(self.status);

        for (name, value) in self.headers {
            builder = builder.header(name, value);
        }

        builder.body(Full::new(self.body)).unwrap_or_else(|e| {
            tracing::error!("Invalid response dropped: {}", e);
            let mut fallback = hyper::Response::new(Full::new(Bytes::from_static(
                b"Internal Server Error",
            )));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
    }
}

impl Default for HttpResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension trait for Response to enable method chaining
pub trait ResponseExt {
    fn status(self, code: u16) -> Self;
    fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self;
}

impl ResponseExt for Response {
    fn status(self, code: u16) -> Self {
        self.map(|r| r.status(code))
    }

    fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|r| r.header(name, value))
    }
}

/// HTTP Redirect response builder
pub struct Redirect {
    location: String,
    query_params: Vec<(String, String)>,
    status: u16,
}

impl Redirect {
    /// Create a redirect to a specific URL/path
    pub fn to(path: impl Into<String>) -> Self {
        Self {
            location: path.into(),
            query_params: Vec::new(),
            status: 302,
        }
    }

    /// Add a query parameter; the value is percent-encoded
    pub fn query(mut self, key: &str, value: impl Into<String>) -> Self {
        self.query_params.push((key.to_string(), value.into()));
        self
    }

    /// Set status to 301 (Moved Permanently)
    pub fn permanent(mut self) -> Self {
        self.status = 301;
        self
    }

    fn build_url(&self) -> String {
        if self.query_params.is_empty() {
            self.location.clone()
        } else {
            let query = self
                .query_params
                .iter()
                .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", self.location, query)
        }
    }
}

/// Auto-convert Redirect to Response
impl From<Redirect> for Response {
    fn from(redirect: Redirect) -> Response {
        Ok(HttpResponse::new()
            .status(redirect.status)
            .header("Location", redirect.build_url()))
    }
}

/// Auto-convert FrameworkError to HttpResponse
///
/// This enables using the `?` operator in handlers to propagate
/// framework errors as appropriate HTTP responses.
impl From<crate::error::FrameworkError> for HttpResponse {
    fn from(err: crate::error::FrameworkError) -> HttpResponse {
        let status = err.status_code();
        if status >= 500 {
            tracing::error!("{}", err);
        }
        HttpResponse::json(serde_json::json!({ "error": err.to_string() })).status(status)
    }
}

/// Auto-convert AppError to HttpResponse
impl From<crate::error::AppError> for HttpResponse {
    fn from(err: crate::error::AppError) -> HttpResponse {
        let framework_err: crate::error::FrameworkError = err.into();
        framework_err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FrameworkError;

    #[test]
    fn test_redirect_encodes_query() {
        let response: Response = Redirect::to("/login").query("next", "/a b").into();
        let response = response.unwrap();
        assert_eq!(response.status_code(), 302);
        assert_eq!(response.header_value("location"), Some("/login?next=%2Fa%20b"));
    }

    #[test]
    fn test_error_becomes_json_response() {
        let response = HttpResponse::from(FrameworkError::param("id"));
        assert_eq!(response.status_code(), 400);
        assert_eq!(response.header_value("content-type"), Some("application/json"));
        assert!(String::from_utf8_lossy(response.body()).contains("Missing required parameter: id"));
    }
}
