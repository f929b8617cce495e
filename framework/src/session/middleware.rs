use super::{SessionStore, SESSION_MAX_AGE};
use crate::http::{HttpResponse, Request, Response};
use crate::middleware::{Middleware, Next};
use async_trait::async_trait;
use std::sync::Arc;

/// Loads the session before the handler and stores it afterwards
///
/// The session travels in the cookie named by `session_name`. Handlers
/// reach it through `Request::session`.
pub struct SessionMiddleware {
    name: String,
    store: Arc<dyn SessionStore>,
}

impl SessionMiddleware {
    pub fn new(name: impl Into<String>, store: Arc<dyn SessionStore>) -> Self {
        Self {
            name: name.into(),
            store,
        }
    }

    fn set_cookie(&self, value: &str, max_age: u64) -> String {
        format!(
            "{}={}; Path=/; Max-Age={}; HttpOnly",
            self.name, value, max_age
        )
    }
}

/// Value of the cookie `name` in a `Cookie` header
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

fn push_header(response: Response, name: &str, value: String) -> Response {
    let add = |mut r: HttpResponse| {
        r.push_header(name, value);
        r
    };
    match response {
        Ok(r) => Ok(add(r)),
        Err(r) => Err(add(r)),
    }
}

#[async_trait]
impl Middleware for SessionMiddleware {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        let cookie = request
            .header("cookie")
            .and_then(|header| cookie_value(header, &self.name))
            .map(str::to_string);

        let session = match self.store.load(cookie.as_deref()).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Failed to load session: {}", e);
                return Err(e.into());
            }
        };
        request.insert_extension(session.clone());

        let response = next(request).await;

        if session.is_destroyed() {
            if let Err(e) = self.store.destroy(&session).await {
                tracing::error!("Failed to destroy session: {}", e);
            }
            return push_header(response, "Set-Cookie", self.set_cookie("", 0));
        }

        if !session.is_modified() {
            return response;
        }

        match self.store.save(&session).await {
            Ok(value) => push_header(response, "Set-Cookie", self.set_cookie(&value, SESSION_MAX_AGE)),
            Err(e) => {
                tracing::error!("Failed to save session: {}", e);
                response
            }
        }
    }
}
