use std::path::Path;

/// Load environment variables from `.env` files
///
/// Precedence (later overrides earlier):
/// 1. .env (base defaults)
/// 2. .env.local (local overrides, not committed)
/// 3. Actual system environment variables (highest priority)
///
/// Missing files are skipped.
pub fn load_dotenv(project_root: &Path) {
    // dotenvy never overwrites existing vars, so load the most specific file first
    let _ = dotenvy::from_path(project_root.join(".env.local"));
    let _ = dotenvy::from_path(project_root.join(".env"));
}

/// Get an environment variable with a default value
///
/// # Example
/// ```
/// use polaris::config::env;
///
/// let host = env("HOST", String::new());
/// ```
pub fn env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Get an optional environment variable
///
/// # Example
/// ```
/// use polaris::config::env_optional;
///
/// let debug: Option<bool> = env_optional("APP_DEBUG");
/// ```
pub fn env_optional<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}
