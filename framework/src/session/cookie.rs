use super::{Session, SessionStore, Signer, SESSION_MAX_AGE};
use crate::config::StoreKind;
use crate::error::FrameworkError;
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Signed cookie body: the values and when they were written (unix seconds)
#[derive(Serialize, Deserialize)]
struct Envelope {
    issued_at: i64,
    values: Map<String, Value>,
}

/// Keeps the whole session, signed, in the cookie
///
/// Cookies older than `SESSION_MAX_AGE` are treated as empty sessions.
pub struct CookieStore {
    signer: Signer,
}

impl CookieStore {
    pub fn new(mask: &str) -> Self {
        Self {
            signer: Signer::new(mask),
        }
    }

    fn encode(&self, session: &Session, issued_at: i64) -> Result<String, FrameworkError> {
        let envelope = Envelope {
            issued_at,
            values: session.values(),
        };
        let payload = serde_json::to_vec(&envelope)
            .map_err(|e| FrameworkError::session(format!("Cannot encode session: {}", e)))?;
        self.signer.sign(&payload)
    }

    fn decode(&self, cookie: &str, now: i64) -> Option<Map<String, Value>> {
        let payload = self.signer.verify(cookie)?;
        let envelope: Envelope = serde_json::from_slice(&payload).ok()?;
        let age = now.saturating_sub(envelope.issued_at);
        if age < 0 || age as u64 > SESSION_MAX_AGE {
            tracing::debug!("Session cookie expired {}s after issue", age);
            return None;
        }
        Some(envelope.values)
    }
}

#[async_trait]
impl SessionStore for CookieStore {
    async fn load(&self, cookie: Option<&str>) -> Result<Session, FrameworkError> {
        let Some(cookie) = cookie else {
            return Ok(Session::new());
        };

        match self.decode(cookie, Utc::now().timestamp()) {
            Some(values) => Ok(Session::restore(None, values)),
            None => {
                tracing::debug!("Discarding invalid session cookie");
                Ok(Session::new())
            }
        }
    }

    async fn save(&self, session: &Session) -> Result<String, FrameworkError> {
        self.encode(session, Utc::now().timestamp())
    }

    async fn destroy(&self, _session: &Session) -> Result<(), FrameworkError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), FrameworkError> {
        Ok(())
    }

    fn kind(&self) -> StoreKind {
        StoreKind::Cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_the_cookie() {
        let store = CookieStore::new("mask");
        let session = Session::new();
        session.set("user", "robin").unwrap();

        let cookie = store.save(&session).await.unwrap();
        let restored = store.load(Some(&cookie)).await.unwrap();

        assert_eq!(restored.get_as::<String>("user").as_deref(), Some("robin"));
        assert!(!restored.is_modified());
    }

    #[tokio::test]
    async fn test_cookie_signed_with_another_mask_is_ignored() {
        let session = Session::new();
        session.set("user", "robin").unwrap();
        let cookie = CookieStore::new("one").save(&session).await.unwrap();

        let restored = CookieStore::new("two").load(Some(&cookie)).await.unwrap();
        assert!(restored.values().is_empty());
    }

    #[tokio::test]
    async fn test_cookie_older_than_max_age_is_ignored() {
        let store = CookieStore::new("mask");
        let session = Session::new();
        session.set("user", "robin").unwrap();

        let now = Utc::now().timestamp();
        let stale = store.encode(&session, now - SESSION_MAX_AGE as i64 - 60).unwrap();
        let fresh = store.encode(&session, now - 60).unwrap();

        let restored = store.load(Some(&stale)).await.unwrap();
        assert!(restored.values().is_empty());

        let restored = store.load(Some(&fresh)).await.unwrap();
        assert_eq!(restored.get_as::<String>("user").as_deref(), Some("robin"));
    }

    #[test]
    fn test_cookie_from_the_future_is_rejected() {
        let store = CookieStore::new("mask");
        let session = Session::new();
        let cookie = store.encode(&session, 2_000).unwrap();

        assert!(store.decode(&cookie, 1_000).is_none());
        assert!(store.decode(&cookie, 2_000).is_some());
    }
}
