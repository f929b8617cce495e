//! Sessions for Polaris
//!
//! A [`SessionStore`] turns the session cookie into a [`Session`] and back.
//! Two stores exist: [`CookieStore`] keeps the whole signed session in the
//! cookie, [`RedisStore`] keeps it in Redis and puts only a signed id in the
//! cookie. [`select_store`] picks one from the configuration.

mod cookie;
mod middleware;
mod redis;
mod signer;

pub use cookie::CookieStore;
pub use middleware::SessionMiddleware;
pub use self::redis::RedisStore;
pub use signer::Signer;

use crate::config::{PolarisConfig, StoreKind};
use crate::error::FrameworkError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lifetime of session cookies and Redis session keys, in seconds
pub const SESSION_MAX_AGE: u64 = 30 * 24 * 60 * 60;

#[derive(Default)]
struct SessionState {
    id: Option<String>,
    values: Map<String, Value>,
    modified: bool,
    destroyed: bool,
}

/// Per-request session data
///
/// Clones share the same state, so a handler and the session middleware see
/// each other's changes.
#[derive(Clone, Default)]
pub struct Session {
    state: Arc<Mutex<SessionState>>,
}

impl Session {
    /// An empty session that has never been stored
    pub fn new() -> Self {
        Self::default()
    }

    /// A session read back from a store
    pub fn restore(id: Option<String>, values: Map<String, Value>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState {
                id,
                values,
                modified: false,
                destroyed: false,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Store-assigned id, if the session has one
    pub fn id(&self) -> Option<String> {
        self.state().id.clone()
    }

    pub(crate) fn set_id(&self, id: String) {
        self.state().id = Some(id);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state().values.get(key).cloned()
    }

    /// Get a value deserialized into `T`; `None` when absent or of another shape
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key)
            .and_then(|value| serde_json::from_value(value).ok())
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<(), FrameworkError> {
        let value = serde_json::to_value(value)
            .map_err(|e| FrameworkError::session(format!("Cannot store {}: {}", key, e)))?;
        let mut state = self.state();
        state.values.insert(key.to_string(), value);
        state.modified = true;
        Ok(())
    }

    pub fn delete(&self, key: &str) -> Option<Value> {
        let mut state = self.state();
        let removed = state.values.remove(key);
        if removed.is_some() {
            state.modified = true;
        }
        removed
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.values.clear();
        state.modified = true;
    }

    /// Drop all data and expire the cookie at the end of the request
    pub fn destroy(&self) {
        let mut state = self.state();
        state.values.clear();
        state.modified = true;
        state.destroyed = true;
    }

    pub fn is_modified(&self) -> bool {
        self.state().modified
    }

    pub fn is_destroyed(&self) -> bool {
        self.state().destroyed
    }

    /// Snapshot of all values
    pub fn values(&self) -> Map<String, Value> {
        self.state().values.clone()
    }
}

/// Backing mechanism for sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Build the session for a request from its cookie value
    ///
    /// Missing, tampered or expired cookies yield an empty session.
    async fn load(&self, cookie: Option<&str>) -> Result<Session, FrameworkError>;

    /// Persist the session and return the new cookie value
    async fn save(&self, session: &Session) -> Result<String, FrameworkError>;

    /// Forget a destroyed session
    async fn destroy(&self, session: &Session) -> Result<(), FrameworkError>;

    /// Release whatever the store holds open; closing twice succeeds
    async fn close(&self) -> Result<(), FrameworkError>;

    fn kind(&self) -> StoreKind;
}

/// Build the store named by `session_store`
///
/// # Errors
///
/// For the Redis store, fails when the server cannot be reached.
pub async fn select_store(config: &PolarisConfig) -> Result<Arc<dyn SessionStore>, FrameworkError> {
    match config.session_store_kind() {
        StoreKind::Redis => {
            let store = RedisStore::connect(&config.redis, &config.session_mask).await?;
            Ok(Arc::new(store))
        }
        StoreKind::Cookie => Ok(Arc::new(CookieStore::new(&config.session_mask))),
    }
}
