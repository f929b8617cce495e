//! Registry for global middleware
//!
//! Global middleware wraps every request, in registration order, before
//! route dispatch and any route-level middleware.

use super::{into_boxed, BoxedMiddleware, Middleware};

/// Ordered list of middleware that runs on every request
///
/// # Example
///
/// ```rust,ignore
/// let registry = MiddlewareRegistry::new()
///     .append(Logger)
///     .append(Recovery);
/// ```
pub struct MiddlewareRegistry {
    global: Vec<BoxedMiddleware>,
}

impl MiddlewareRegistry {
    pub fn new() -> Self {
        Self { global: Vec::new() }
    }

    /// Append global middleware, builder style
    pub fn append<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.push(middleware);
        self
    }

    /// Append global middleware in place
    pub fn push<M: Middleware + 'static>(&mut self, middleware: M) {
        self.global.push(into_boxed(middleware));
    }

    /// Get the list of global middleware
    pub fn global_middleware(&self) -> &[BoxedMiddleware] {
        &self.global
    }

    pub fn len(&self) -> usize {
        self.global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_empty()
    }
}

impl Default for MiddlewareRegistry {
    fn default() -> Self {
        Self::new()
    }
}
