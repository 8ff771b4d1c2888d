use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use posty_core::domain::session::{DialogueState, Session, SessionId};
use posty_core::errors::StoreError;
use posty_core::ports::SessionStore;

use super::backend;
use crate::DbPool;

/// Sessions persist the serialized dialogue state as JSON so the state
/// machine survives process restarts mid-conversation.
pub struct SqlSessionStore {
    pool: DbPool,
}

impl SqlSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for SqlSessionStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query(
            "SELECT session_id, state, updated_at
             FROM dialogue_sessions
             WHERE session_id = ?",
        )
        .bind(&session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state: DialogueState = serde_json::from_str(&row.get::<String, _>("state"))
            .map_err(|error| StoreError::Decode(format!("dialogue state: {error}")))?;
        let updated_at = DateTime::parse_from_rfc3339(&row.get::<String, _>("updated_at"))
            .map_err(|error| StoreError::Decode(format!("updated_at: {error}")))?
            .with_timezone(&Utc);

        Ok(Some(Session { id: SessionId(row.get::<String, _>("session_id")), state, updated_at }))
    }

    async fn put(&self, session: Session) -> Result<(), StoreError> {
        let state = serde_json::to_string(&session.state)
            .map_err(|error| StoreError::Decode(format!("dialogue state: {error}")))?;

        sqlx::query(
            "INSERT INTO dialogue_sessions (session_id, state, updated_at)
             VALUES (?, ?, ?)
             ON CONFLICT(session_id) DO UPDATE SET
                state = excluded.state,
                updated_at = excluded.updated_at",
        )
        .bind(&session.id.0)
        .bind(state)
        .bind(session.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM dialogue_sessions WHERE session_id = ?")
            .bind(&session_id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use posty_core::domain::session::{DialogueState, Session, SessionId};
    use posty_core::domain::supplier::{Supplier, SupplierId};
    use posty_core::errors::StoreError;
    use posty_core::ports::SessionStore;

    use super::SqlSessionStore;
    use crate::{connect_with_settings, migrations, DbPool};

    async fn store_with_pool() -> (SqlSessionStore, DbPool) {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        (SqlSessionStore::new(pool.clone()), pool)
    }

    fn awaiting_choice() -> DialogueState {
        DialogueState::AwaitingRecipientChoice {
            topic: "iron quotation".to_string(),
            candidates: vec![Supplier {
                id: SupplierId(1),
                name: "Omar Khalil".to_string(),
                email: "khalil@supplier.example".to_string(),
                material: Some("iron".to_string()),
            }],
        }
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let (store, _pool) = store_with_pool().await;
        let id = SessionId("s-1".to_string());

        store.put(Session::new(id.clone(), awaiting_choice())).await.expect("put");

        let loaded = store.get(&id).await.expect("get").expect("session present");
        assert_eq!(loaded.id, id);
        assert_eq!(loaded.state, awaiting_choice());

        store.delete(&id).await.expect("delete");
        assert!(store.get(&id).await.expect("get").is_none());
    }

    #[tokio::test]
    async fn put_overwrites_existing_state() {
        let (store, _pool) = store_with_pool().await;
        let id = SessionId("s-2".to_string());

        store.put(Session::new(id.clone(), awaiting_choice())).await.expect("put");

        let replacement = DialogueState::AwaitingSenderChoice {
            topic: "iron quotation".to_string(),
            recipient: Supplier {
                id: SupplierId(1),
                name: "Omar Khalil".to_string(),
                email: "khalil@supplier.example".to_string(),
                material: None,
            },
            sender_candidates: vec!["sales@posty.example".to_string()],
        };
        store.put(Session::new(id.clone(), replacement.clone())).await.expect("put again");

        let loaded = store.get(&id).await.expect("get").expect("session present");
        assert_eq!(loaded.state, replacement);
    }

    #[tokio::test]
    async fn corrupt_state_json_surfaces_as_decode_error() {
        let (store, pool) = store_with_pool().await;

        sqlx::query(
            "INSERT INTO dialogue_sessions (session_id, state, updated_at)
             VALUES ('broken', 'not json', '2026-01-01T00:00:00Z')",
        )
        .execute(&pool)
        .await
        .expect("insert corrupt row");

        let error = store.get(&SessionId("broken".to_string())).await.expect_err("decode fails");
        assert!(matches!(error, StoreError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_session_is_none() {
        let (store, _pool) = store_with_pool().await;
        assert!(store.get(&SessionId("absent".to_string())).await.expect("get").is_none());
    }
}
