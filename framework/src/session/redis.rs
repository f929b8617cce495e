use super::{Session, SessionStore, Signer, SESSION_MAX_AGE};
use crate::config::{RedisConfig, StoreKind};
use crate::error::FrameworkError;
use async_trait::async_trait;
use rand::RngCore;
use redis::aio::ConnectionManager;
use serde_json::{Map, Value};
use std::sync::RwLock;
use tokio::sync::{Semaphore, SemaphorePermit};

const KEY_PREFIX: &str = "session_";

/// Keeps session data in Redis under `session_<id>`
///
/// The cookie carries only the signed id. At most `redis_maxidel` commands
/// are in flight at once.
pub struct RedisStore {
    manager: RwLock<Option<ConnectionManager>>,
    permits: Semaphore,
    signer: Signer,
}

impl RedisStore {
    /// Connect and check the server answers `PING`
    pub async fn connect(config: &RedisConfig, mask: &str) -> Result<Self, FrameworkError> {
        let url = config.connection_url()?;
        let client = redis::Client::open(url.as_str())?;

        let mut probe = client.get_multiplexed_async_connection().await.map_err(|e| {
            tracing::error!("Cannot reach Redis at {}: {}", config.address, e);
            FrameworkError::from(e)
        })?;
        redis::cmd("PING").query_async::<_, String>(&mut probe).await?;

        let manager = ConnectionManager::new(client).await?;
        tracing::debug!("Redis session store connected to {}", config.address);

        Ok(Self {
            manager: RwLock::new(Some(manager)),
            permits: Semaphore::new(config.size.max(1)),
            signer: Signer::new(mask),
        })
    }

    /// A connection plus the permit bounding concurrent commands
    async fn connection(&self) -> Result<(ConnectionManager, SemaphorePermit<'_>), FrameworkError> {
        let permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| FrameworkError::session("Redis session store is closed"))?;
        let manager = self
            .manager
            .read()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| FrameworkError::session("Redis session store is closed"))?;
        Ok((manager, permit))
    }

    fn new_id() -> String {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[async_trait]
impl SessionStore for RedisStore {
    async fn load(&self, cookie: Option<&str>) -> Result<Session, FrameworkError> {
        let id = cookie
            .and_then(|cookie| self.signer.verify(cookie))
            .and_then(|payload| String::from_utf8(payload).ok());
        let Some(id) = id else {
            return Ok(Session::new());
        };

        let (mut conn, _permit) = self.connection().await?;
        let data: Option<String> = redis::cmd("GET")
            .arg(format!("{}{}", KEY_PREFIX, id))
            .query_async(&mut conn)
            .await?;

        let values = data
            .and_then(|data| serde_json::from_str::<Map<String, Value>>(&data).ok())
            .unwrap_or_default();
        Ok(Session::restore(Some(id), values))
    }

    async fn save(&self, session: &Session) -> Result<String, FrameworkError> {
        let id = session.id().unwrap_or_else(Self::new_id);
        let data = serde_json::to_string(&session.values())
            .map_err(|e| FrameworkError::session(format!("Cannot encode session: {}", e)))?;

        let (mut conn, _permit) = self.connection().await?;
        redis::cmd("SETEX")
            .arg(format!("{}{}", KEY_PREFIX, id))
            .arg(SESSION_MAX_AGE)
            .arg(data)
            .query_async::<_, ()>(&mut conn)
            .await?;

        session.set_id(id.clone());
        self.signer.sign(id.as_bytes())
    }

    async fn destroy(&self, session: &Session) -> Result<(), FrameworkError> {
        let Some(id) = session.id() else {
            return Ok(());
        };
        let (mut conn, _permit) = self.connection().await?;
        redis::cmd("DEL")
            .arg(format!("{}{}", KEY_PREFIX, id))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<(), FrameworkError> {
        self.permits.close();
        if let Ok(mut manager) = self.manager.write() {
            if manager.take().is_some() {
                tracing::debug!("Redis session store closed");
            }
        }
        Ok(())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Redis
    }
}
