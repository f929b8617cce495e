//! Configuration module for Polaris
//!
//! Reads an INI file with the `system`, `session`, `redis` and `database`
//! sections into a typed [`PolarisConfig`]. Every key has a default, so a
//! missing key never fails the load; only an unreadable or unparsable file
//! does.
//!
//! # Example
//!
//! ```rust,no_run
//! use polaris::PolarisConfig;
//!
//! let config = PolarisConfig::load("polaris.ini").unwrap();
//! println!("Listening port: {}", config.port);
//! ```

pub mod env;
pub mod redis;
pub mod source;

pub use env::{env, env_optional, load_dotenv};
pub use self::redis::RedisConfig;
pub use source::{ConfigSource, IniConfig, PLACEHOLDER_ROOT};

use crate::database::DbConfig;
use crate::error::FrameworkError;
use ini::{Ini, ParseOption};
use std::collections::HashMap;
use std::path::Path;

/// Key of the login redirect URL in the URL table
pub const REDIRECT_URL: &str = "RedirectUrl";
/// Key of the login redirect query parameter in the URL table
pub const REDIRECT_PARAM: &str = "RedirectParam";

/// Which backing mechanism holds session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Whole session signed into the cookie
    Cookie,
    /// Session id in the cookie, data in Redis
    Redis,
}

/// Application configuration loaded from the INI file
///
/// Directory and template fields are read once and never change for the
/// lifetime of the process.
#[derive(Debug, Clone)]
pub struct PolarisConfig {
    /// Folder for public resources (images, css, js)
    pub dir_static: String,
    /// Folder holding the template files
    pub dir_template: String,
    /// Folder for the daily log files; empty disables file logging
    pub dir_log: String,
    /// Extension of template files, including the dot
    pub tpl_extension: String,
    /// Charset announced for rendered templates
    pub tpl_encoding: String,
    /// Session store kind as written in the file (`cookie` or `redis`)
    pub session_store: String,
    /// Cookie name carrying the session
    pub session_name: String,
    /// Signing key for session cookies
    pub session_mask: String,
    /// Redis connection settings
    pub redis: RedisConfig,
    /// Database connection settings
    pub database: DbConfig,
    /// Listening port
    pub port: u16,
    urls: HashMap<String, String>,
}

/// Values are taken as written; backslashes are not escapes
fn raw_values() -> ParseOption {
    ParseOption {
        enabled_escape: false,
        ..ParseOption::default()
    }
}

impl Default for PolarisConfig {
    fn default() -> Self {
        Self::from_ini(&Ini::new())
    }
}

impl PolarisConfig {
    /// Load configuration from an INI file
    ///
    /// # Errors
    ///
    /// Returns `FrameworkError::Config` when the file cannot be opened or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FrameworkError> {
        let path = path.as_ref();
        let ini = Ini::load_from_file_opt(path, raw_values()).map_err(|e| {
            FrameworkError::config(format!(
                "Failed to load config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self::from_ini(&ini))
    }

    /// Parse configuration from INI text
    pub fn parse(content: &str) -> Result<Self, FrameworkError> {
        let ini = Ini::load_from_str_opt(content, raw_values())
            .map_err(|e| FrameworkError::config(format!("Failed to parse config: {}", e)))?;
        Ok(Self::from_ini(&ini))
    }

    /// Build configuration from an already parsed INI document
    pub fn from_ini(ini: &Ini) -> Self {
        let values = Values { ini };

        let redis = RedisConfig {
            size: values.int("redis", "redis_maxidel", 10),
            network: values.string("redis", "redis_network", "tcp"),
            address: values.string("redis", "redis_address", "localhost:6379"),
            password: values.string("redis", "redis_password", ""),
            db: values.string("redis", "redis_DB", "0"),
        };

        let database = DbConfig {
            kind: values.string("database", "db_type", "mssql"),
            host: values.string("database", "db_server", "localhost"),
            port: values.string("database", "db_port", "1433"),
            database: values.string("database", "db_database", "temdb"),
            user: values.string("database", "db_user", "sa"),
            password: values.string("database", "db_password", ""),
            verbose: values.bool("database", "db_verbose", true),
            log_file: values.string("database", "db_log", ""),
        };

        let mut urls = HashMap::new();
        urls.insert(
            REDIRECT_URL.to_string(),
            values.string("system", REDIRECT_URL, "/new-login"),
        );
        urls.insert(
            REDIRECT_PARAM.to_string(),
            values.string("system", REDIRECT_PARAM, "new-next"),
        );

        Self {
            dir_static: values.string("system", "dir_public", "public"),
            dir_template: values.string("system", "dir_template", "view"),
            dir_log: values.string("system", "dir_log", "."),
            tpl_extension: values.string("system", "tpl_extension", ".tpl"),
            tpl_encoding: values.string("system", "tpl_encoding", "UTF-8"),
            session_store: values.string("session", "session_store", "redis"),
            session_name: values.string("session", "session_name", "my_session"),
            session_mask: values.string("session", "session_mask", ""),
            redis,
            database,
            port: values.int("system", "port", 3000),
            urls,
        }
    }

    /// Look up an entry of the URL table
    pub fn url(&self, key: &str) -> Option<&str> {
        self.urls.get(key).map(String::as_str)
    }

    /// Where unauthenticated users are sent
    pub fn redirect_url(&self) -> &str {
        self.url(REDIRECT_URL).unwrap_or_default()
    }

    /// Query parameter carrying the originally requested path
    pub fn redirect_param(&self) -> &str {
        self.url(REDIRECT_PARAM).unwrap_or_default()
    }

    /// Session store kind, trimmed and case-insensitive
    ///
    /// Anything other than `redis` selects the cookie store.
    pub fn session_store_kind(&self) -> StoreKind {
        if self.session_store.trim().eq_ignore_ascii_case("redis") {
            StoreKind::Redis
        } else {
            StoreKind::Cookie
        }
    }

    /// Whether database wiring is enabled
    pub fn has_database(&self) -> bool {
        !self.database.database.is_empty()
    }
}

/// Typed lookups with defaults over an INI document
struct Values<'a> {
    ini: &'a Ini,
}

impl Values<'_> {
    fn raw(&self, section: &str, key: &str) -> Option<&str> {
        self.ini.get_from(Some(section), key).map(str::trim)
    }

    fn string(&self, section: &str, key: &str, default: &str) -> String {
        self.raw(section, key).unwrap_or(default).to_string()
    }

    fn int<T: std::str::FromStr + Copy + std::fmt::Display>(
        &self,
        section: &str,
        key: &str,
        default: T,
    ) -> T {
        match self.raw(section, key) {
            Some(value) => value.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "[{}] {} = {:?} is not a number, using {}",
                    section,
                    key,
                    value,
                    default
                );
                default
            }),
            None => default,
        }
    }

    fn bool(&self, section: &str, key: &str, default: bool) -> bool {
        match self.raw(section, key) {
            Some(value) => parse_bool(value).unwrap_or_else(|| {
                tracing::warn!(
                    "[{}] {} = {:?} is not a boolean, using {}",
                    section,
                    key,
                    value,
                    default
                );
                default
            }),
            None => default,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" | "yes" | "on" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_backslashes_are_kept_verbatim() {
        let config = PolarisConfig::parse(
            "[session]\nsession_mask = ab\\cd\\9z\n[system]\ndir_log = C:\\logs\\polaris\n[redis]\nredis_password = p\\w\n",
        )
        .unwrap();

        assert_eq!(config.session_mask, "ab\\cd\\9z");
        assert_eq!(config.dir_log, "C:\\logs\\polaris");
        assert_eq!(config.redis.password, "p\\w");
    }

    #[test]
    fn test_backslashes_survive_loading_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[database]\ndb_password = se\\cret").unwrap();

        let config = PolarisConfig::load(file.path()).unwrap();
        assert_eq!(config.database.password, "se\\cret");
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "; nothing configured").unwrap();

        let config = PolarisConfig::load(file.path()).unwrap();

        assert_eq!(config.dir_static, "public");
        assert_eq!(config.dir_template, "view");
        assert_eq!(config.dir_log, ".");
        assert_eq!(config.tpl_extension, ".tpl");
        assert_eq!(config.tpl_encoding, "UTF-8");
        assert_eq!(config.port, 3000);
        assert_eq!(config.redirect_url(), "/new-login");
        assert_eq!(config.redirect_param(), "new-next");

        assert_eq!(config.session_store, "redis");
        assert_eq!(config.session_name, "my_session");
        assert_eq!(config.session_mask, "");

        assert_eq!(config.redis.size, 10);
        assert_eq!(config.redis.network, "tcp");
        assert_eq!(config.redis.address, "localhost:6379");
        assert_eq!(config.redis.password, "");
        assert_eq!(config.redis.db, "0");

        assert_eq!(config.database.kind, "mssql");
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, "1433");
        assert_eq!(config.database.database, "temdb");
        assert_eq!(config.database.user, "sa");
        assert_eq!(config.database.password, "");
        assert!(config.database.verbose);
        assert_eq!(config.database.log_file, "");
    }

    #[test]
    fn test_missing_file_fails() {
        let result = PolarisConfig::load("/definitely/not/here/polaris.ini");
        assert!(matches!(result, Err(FrameworkError::Config(_))));
    }

    #[test]
    fn test_values_override_defaults() {
        let config = PolarisConfig::parse(
            r#"
[system]
dir_public = assets
port = 8081
RedirectUrl = /login
RedirectParam = next

[session]
session_store = " Cookie "
session_mask = secret

[redis]
redis_maxidel = 4
redis_DB = 2

[database]
db_type = sqlite
db_database =
db_verbose = false
"#,
        )
        .unwrap();

        assert_eq!(config.dir_static, "assets");
        assert_eq!(config.port, 8081);
        assert_eq!(config.redirect_url(), "/login");
        assert_eq!(config.redirect_param(), "next");
        assert_eq!(config.session_mask, "secret");
        assert_eq!(config.session_store_kind(), StoreKind::Cookie);
        assert_eq!(config.redis.size, 4);
        assert_eq!(config.redis.db, "2");
        assert_eq!(config.database.kind, "sqlite");
        assert!(!config.database.verbose);
        assert!(!config.has_database());
    }

    #[test]
    fn test_session_store_kind_is_trimmed_and_case_insensitive() {
        let mut config = PolarisConfig::default();
        assert_eq!(config.session_store_kind(), StoreKind::Redis);

        config.session_store = "  REDIS ".to_string();
        assert_eq!(config.session_store_kind(), StoreKind::Redis);

        config.session_store = "cookie".to_string();
        assert_eq!(config.session_store_kind(), StoreKind::Cookie);

        config.session_store = "memcache".to_string();
        assert_eq!(config.session_store_kind(), StoreKind::Cookie);
    }

    #[test]
    fn test_bad_numbers_fall_back_to_defaults() {
        let config = PolarisConfig::parse("[system]\nport = eighty\n[database]\ndb_verbose = maybe\n")
            .unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.database.verbose);
    }
}
