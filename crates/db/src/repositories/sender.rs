use async_trait::async_trait;
use sqlx::Row;

use posty_core::errors::StoreError;
use posty_core::ports::SenderRegistry;

use super::backend;
use crate::DbPool;

pub struct SqlSenderRegistry {
    pool: DbPool,
}

impl SqlSenderRegistry {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SenderRegistry for SqlSenderRegistry {
    async fn list_addresses_for(&self, account: &str) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT address
             FROM sender_addresses
             WHERE account = ?
             ORDER BY position ASC, id ASC",
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(|row| row.get::<String, _>("address")).collect())
    }
}
