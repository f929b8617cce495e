//! Session-based authentication
//!
//! [`SessionAuth`] builds a user for every request from the factory given
//! at composition time and logs it in when the session remembers one.
//! [`LoginRequired`] guards routes by redirecting anonymous users to the
//! login page.
//!
//! ```rust,ignore
//! pub async fn login(req: Request) -> Response {
//!     let form: LoginForm = req.form()?;
//!     let user = req.user()?;
//!     // check credentials ...
//!     authenticate_session(&req.session()?, &user)?;
//!     Redirect::to("/").into()
//! }
//! ```

mod middleware;

pub use middleware::{LoginRequired, SessionAuth};

use crate::error::FrameworkError;
use crate::session::Session;
use async_trait::async_trait;
use serde_json::Value;
use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session key holding the id of the logged in user
pub const SESSION_KEY: &str = "AUTHUNIQUEID";

/// A principal that can be logged in and out
#[async_trait]
pub trait User: Send + Sync {
    /// Mark the user authenticated
    fn login(&mut self);

    fn logout(&mut self);

    fn is_authenticated(&self) -> bool;

    /// Value remembered in the session to find this user again
    fn unique_id(&self) -> Value;

    /// Populate this user from the id remembered in the session
    async fn get_by_id(&mut self, id: &Value) -> Result<(), FrameworkError>;

    /// Access to the concrete type, see [`AuthUser::with`]
    fn as_any(&self) -> &dyn Any;
}

/// Builds the anonymous user every request starts with
pub type UserFactory = Arc<dyn Fn() -> Box<dyn User> + Send + Sync>;

/// Shared handle on the current request's user
#[derive(Clone)]
pub struct AuthUser {
    user: Arc<Mutex<Box<dyn User>>>,
}

impl AuthUser {
    pub fn new(user: Box<dyn User>) -> Self {
        Self {
            user: Arc::new(Mutex::new(user)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Box<dyn User>> {
        match self.user.lock() {
            Ok(user) => user,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_authenticated()
    }

    pub fn unique_id(&self) -> Value {
        self.lock().unique_id()
    }

    /// Borrow the user as its concrete type
    ///
    /// Returns `None` when the user is not a `T`.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let user = self.lock();
        user.as_any().downcast_ref::<T>().map(f)
    }

    fn login(&self) {
        self.lock().login();
    }

    fn logout(&self) {
        self.lock().logout();
    }
}

/// Where unauthenticated users are sent, passed explicitly to the middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRedirect {
    pub url: String,
    pub param: String,
}

impl AuthRedirect {
    pub fn new(url: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            param: param.into(),
        }
    }

    /// Login URL remembering the requested path
    pub fn login_url(&self, path: &str) -> String {
        format!("{}?{}={}", self.url, self.param, urlencoding::encode(path))
    }
}

/// Log the user in and remember it in the session
pub fn authenticate_session(session: &Session, user: &AuthUser) -> Result<(), FrameworkError> {
    user.login();
    session.set(SESSION_KEY, user.unique_id())
}

/// Log the user out and forget it in the session
pub fn logout(session: &Session, user: &AuthUser) {
    user.logout();
    session.delete(SESSION_KEY);
}
