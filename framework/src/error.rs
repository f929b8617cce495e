//! Framework-wide error types
//!
//! Every construction step of an application (config load, log open,
//! session store, database) reports failure through [`FrameworkError`].
//! The same type converts into an HTTP response so handlers can use `?`.

use thiserror::Error;

/// Simple wrapper for creating one-off domain errors inside handlers
///
/// # Example
///
/// ```rust,ignore
/// use polaris::{AppError, FrameworkError};
///
/// pub async fn process() -> Result<(), FrameworkError> {
///     if invalid {
///         return Err(AppError::bad_request("Invalid input").into());
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AppError {
    message: String,
    status_code: u16,
}

impl AppError {
    /// Create a new AppError with status 500 (Internal Server Error)
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status_code: 500,
        }
    }

    /// Set the HTTP status code
    pub fn status(mut self, code: u16) -> Self {
        self.status_code = code;
        self
    }

    /// Create a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message).status(404)
    }

    /// Create a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(message).status(400)
    }

    /// Create a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(message).status(401)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl From<AppError> for FrameworkError {
    fn from(e: AppError) -> Self {
        FrameworkError::Domain {
            message: e.message,
            status_code: e.status_code,
        }
    }
}

/// Framework-wide error type
///
/// Construction errors (`Config`, `Io`, `Database`, `Session`, `Bind`) are
/// returned to whoever composes the application. Request-time errors map to
/// a status code through [`FrameworkError::status_code`].
#[derive(Debug, Clone, Error)]
pub enum FrameworkError {
    /// Configuration file missing or unparsable
    #[error("Config error: {0}")]
    Config(String),

    /// File-system error (log files, static assets, trace logs)
    #[error("I/O error on {path}: {message}")]
    Io {
        /// Path that was being opened or read
        path: String,
        /// The underlying error message
        message: String,
    },

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Session store error (connection, encoding, closed store)
    #[error("Session error: {0}")]
    Session(String),

    /// Template lookup or rendering error
    #[error("Template error: {0}")]
    Template(String),

    /// Binding the listening socket failed
    #[error("Failed to bind {addr}: {message}")]
    Bind {
        /// The address that could not be bound
        addr: String,
        /// The underlying error message
        message: String,
    },

    /// Generic internal server error
    #[error("Internal server error: {message}")]
    Internal {
        /// The error message
        message: String,
    },

    /// Domain/application error with custom status code
    #[error("{message}")]
    Domain {
        /// The error message
        message: String,
        /// HTTP status code
        status_code: u16,
    },

    /// Parameter extraction failed (missing or invalid parameter)
    #[error("Missing required parameter: {param_name}")]
    ParamError {
        /// The name of the parameter that failed extraction
        param_name: String,
    },
}

impl FrameworkError {
    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an Io error for a path
    pub fn io(path: impl AsRef<std::path::Path>, err: impl std::fmt::Display) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create a Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database(message.into())
    }

    /// Create a Session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create a ParamError for a missing parameter
    pub fn param(name: impl Into<String>) -> Self {
        Self::ParamError {
            param_name: name.into(),
        }
    }

    /// Create a Domain error with custom status code
    pub fn domain(message: impl Into<String>, status_code: u16) -> Self {
        Self::Domain {
            message: message.into(),
            status_code,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::ParamError { .. } => 400,
            Self::Domain { status_code, .. } => *status_code,
            Self::Config(_)
            | Self::Io { .. }
            | Self::Database(_)
            | Self::Session(_)
            | Self::Template(_)
            | Self::Bind { .. }
            | Self::Internal { .. } => 500,
        }
    }
}

impl From<sea_orm::DbErr> for FrameworkError {
    fn from(e: sea_orm::DbErr) -> Self {
        Self::Database(e.to_string())
    }
}

impl From<redis::RedisError> for FrameworkError {
    fn from(e: redis::RedisError) -> Self {
        Self::Session(e.to_string())
    }
}

impl From<minijinja::Error> for FrameworkError {
    fn from(e: minijinja::Error) -> Self {
        Self::Template(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(FrameworkError::param("id").status_code(), 400);
        assert_eq!(FrameworkError::session("down").status_code(), 500);
        assert_eq!(FrameworkError::domain("gone", 410).status_code(), 410);
    }

    #[test]
    fn test_app_error_converts_to_domain() {
        let err: FrameworkError = AppError::not_found("No such user").into();
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.to_string(), "No such user");
    }
}
