use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Database(#[from] sqlx::Error),
}

// 1. SessionStore Contract
/// SessionStore
///
/// Maps opaque session ids (the `session_id` cookie value) to user ids. The
/// concrete store is swapped between Postgres in production and the in-memory
/// `MemorySessionStore` for local runs and tests without touching the handlers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Opens a session for `user_id` and returns its id.
    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError>;

    /// Resolves a session id. Unknown and expired sessions both yield `None`.
    async fn session_user(&self, session_id: &str) -> Result<Option<Uuid>, SessionError>;

    /// Removes a session. Deleting an unknown id is not an error.
    async fn delete_session(&self, session_id: &str) -> Result<(), SessionError>;
}

/// Session ids are random v4 UUIDs rendered as strings.
fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

fn ttl_duration(ttl_seconds: u64) -> Duration {
    Duration::seconds(i64::try_from(ttl_seconds).unwrap_or(i64::MAX))
}

// 2. The Real Implementation (Postgres)
/// PostgresSessionStore
///
/// Sessions live in the `sessions` table with an absolute `expires_at`. Expired rows
/// are ignored on lookup and removed lazily.
#[derive(Clone)]
pub struct PostgresSessionStore {
    pool: PgPool,
    ttl: Duration,
}

impl PostgresSessionStore {
    pub fn new(pool: PgPool, ttl_seconds: u64) -> Self {
        Self {
            pool,
            ttl: ttl_duration(ttl_seconds),
        }
    }
}

#[async_trait]
impl SessionStore for PostgresSessionStore {
    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError> {
        let session_id = new_session_id();
        sqlx::query("INSERT INTO sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session_id)
            .bind(user_id)
            .bind(Utc::now() + self.ttl)
            .execute(&self.pool)
            .await?;
        Ok(session_id)
    }

    async fn session_user(&self, session_id: &str) -> Result<Option<Uuid>, SessionError> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM sessions WHERE id = $1 AND expires_at > NOW()",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        if user_id.is_none() {
            sqlx::query("DELETE FROM sessions WHERE id = $1 AND expires_at <= NOW()")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(user_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// 3. The In-Memory Implementation (local runs and tests)
/// MemorySessionStore
///
/// Process-local session map. All sessions are lost on restart.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, (Uuid, DateTime<Utc>)>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: ttl_duration(ttl_seconds),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create_session(&self, user_id: Uuid) -> Result<String, SessionError> {
        let session_id = new_session_id();
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        // Sessions whose cookie never comes back would otherwise stay forever.
        sessions.retain(|_, (_, expires_at)| *expires_at > now);
        sessions.insert(session_id.clone(), (user_id, now + self.ttl));
        Ok(session_id)
    }

    async fn session_user(&self, session_id: &str) -> Result<Option<Uuid>, SessionError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Utc::now() => Ok(Some(*user_id)),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}

/// SessionState
///
/// The concrete type used to share the session store across the application state.
pub type SessionState = Arc<dyn SessionStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_resolves_and_deletes_sessions() {
        let store = MemorySessionStore::new(60);
        let user_id = Uuid::new_v4();

        let session_id = store.create_session(user_id).await.unwrap();
        assert_eq!(store.session_user(&session_id).await.unwrap(), Some(user_id));

        store.delete_session(&session_id).await.unwrap();
        assert_eq!(store.session_user(&session_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn memory_store_treats_expired_sessions_as_absent() {
        let store = MemorySessionStore::new(0);
        let session_id = store.create_session(Uuid::new_v4()).await.unwrap();

        assert_eq!(store.session_user(&session_id).await.unwrap(), None);
        assert!(store.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn expired_sessions_are_swept_on_create() {
        let store = MemorySessionStore::new(0);
        for _ in 0..1000 {
            store.create_session(Uuid::new_v4()).await.unwrap();
        }

        // Only the most recent (also already expired) entry survives the sweep.
        assert!(store.sessions.read().await.len() <= 1);
    }

    #[tokio::test]
    async fn sweep_keeps_live_sessions() {
        let store = MemorySessionStore::new(60);
        let user_id = Uuid::new_v4();
        let first = store.create_session(user_id).await.unwrap();
        store.create_session(user_id).await.unwrap();

        assert_eq!(store.sessions.read().await.len(), 2);
        assert_eq!(store.session_user(&first).await.unwrap(), Some(user_id));
    }

    #[tokio::test]
    async fn session_ids_are_unique() {
        let store = MemorySessionStore::new(60);
        let user_id = Uuid::new_v4();

        let first = store.create_session(user_id).await.unwrap();
        let second = store.create_session(user_id).await.unwrap();
        assert_ne!(first, second);
    }
}
