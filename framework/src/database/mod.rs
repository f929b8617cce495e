//! Database wiring for Polaris
//!
//! Maps the configured `db_type` to a driver and dialect, opens a sea-orm
//! connection and optionally traces every statement.
//!
//! ```rust,ignore
//! use polaris::{DbConfig, DbEngine};
//!
//! let engine = DbEngine::connect(&config.database).await?;
//! let conn = engine.connection()?;
//! ```

pub mod config;
pub mod connection;

pub use config::{DatabaseKind, DbConfig, Dialect};
pub use connection::DbEngine;

// Re-export sea_orm so applications can write queries against the engine
pub use sea_orm;
