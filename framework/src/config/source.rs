//! The configuration capability an application is composed from
//!
//! Adopters implement [`ConfigSource`] to control where configuration comes
//! from and which routes get registered. [`IniConfig`] is the stock source.

use super::PolarisConfig;
use crate::app::Application;
use crate::error::FrameworkError;
use crate::http::text;
use std::path::PathBuf;

/// Body of the root handler registered when no route map is supplied
pub const PLACEHOLDER_ROOT: &str =
    "Hello, you should define your own configuration as the first step!";

/// Source of configuration and route registration for an application
///
/// # Example
///
/// ```rust,ignore
/// struct MyConfig(IniConfig);
///
/// impl ConfigSource for MyConfig {
///     fn load_config(&mut self) -> Result<(), FrameworkError> {
///         self.0.load_config()
///     }
///
///     fn basic_config(&self) -> &PolarisConfig {
///         self.0.basic_config()
///     }
///
///     fn route_map(&self, app: &mut Application) -> Result<(), FrameworkError> {
///         app.get("/", controllers::home::index);
///         Ok(())
///     }
/// }
/// ```
pub trait ConfigSource: Send + Sync {
    /// Read the configuration into this source
    fn load_config(&mut self) -> Result<(), FrameworkError>;

    /// The configuration read by the last successful `load_config`
    fn basic_config(&self) -> &PolarisConfig;

    /// Register application routes
    ///
    /// Called once, last, during composition. Returning an error aborts it.
    fn route_map(&self, app: &mut Application) -> Result<(), FrameworkError> {
        app.get("/", |_req| async { text(PLACEHOLDER_ROOT) });
        Ok(())
    }
}

/// Configuration read from an INI file on disk
pub struct IniConfig {
    path: PathBuf,
    config: PolarisConfig,
}

impl IniConfig {
    /// Point at an INI file; nothing is read until `load_config`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: PolarisConfig::default(),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl ConfigSource for IniConfig {
    fn load_config(&mut self) -> Result<(), FrameworkError> {
        self.config = PolarisConfig::load(&self.path)?;
        tracing::debug!("Loaded configuration from {}", self.path.display());
        Ok(())
    }

    fn basic_config(&self) -> &PolarisConfig {
        &self.config
    }
}
