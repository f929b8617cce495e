use super::{AuthRedirect, AuthUser, UserFactory, SESSION_KEY};
use crate::http::{Redirect, Request, Response};
use crate::middleware::{Middleware, Next};
use async_trait::async_trait;

/// Attaches the current user to every request
///
/// Must run after the session middleware.
pub struct SessionAuth {
    new_user: UserFactory,
}

impl SessionAuth {
    pub fn new(new_user: UserFactory) -> Self {
        Self { new_user }
    }
}

#[async_trait]
impl Middleware for SessionAuth {
    async fn handle(&self, mut request: Request, next: Next) -> Response {
        let mut user = (self.new_user)();

        let remembered = request
            .session()
            .ok()
            .and_then(|session| session.get(SESSION_KEY));
        if let Some(id) = remembered {
            match user.get_by_id(&id).await {
                Ok(()) => user.login(),
                Err(e) => {
                    tracing::warn!("Cannot restore user {}: {}", id, e);
                    user.logout();
                }
            }
        }

        request.insert_extension(AuthUser::new(user));
        next(request).await
    }
}

/// Redirects anonymous users to the login page
///
/// ```rust,ignore
/// app.get("/profile", profile).middleware(LoginRequired::new(redirect));
/// ```
pub struct LoginRequired {
    redirect: AuthRedirect,
}

impl LoginRequired {
    pub fn new(redirect: AuthRedirect) -> Self {
        Self { redirect }
    }
}

#[async_trait]
impl Middleware for LoginRequired {
    async fn handle(&self, request: Request, next: Next) -> Response {
        let authenticated = request
            .user()
            .map(|user| user.is_authenticated())
            .unwrap_or(false);
        if authenticated {
            return next(request).await;
        }

        tracing::debug!("Anonymous access to {}, redirecting", request.path());
        Redirect::to(self.redirect.login_url(request.path())).into()
    }
}
