use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use posty_core::domain::supplier::{Supplier, SupplierId};
use posty_core::errors::StoreError;
use posty_core::ports::SupplierDirectory;

use super::backend;
use crate::DbPool;

pub struct SqlSupplierDirectory {
    pool: DbPool,
}

impl SqlSupplierDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn supplier_from_row(row: sqlx::sqlite::SqliteRow) -> Supplier {
    Supplier {
        id: SupplierId(row.get::<i64, _>("id")),
        name: row.get::<String, _>("name"),
        email: row.get::<String, _>("email"),
        material: row.get::<Option<String>, _>("material"),
    }
}

#[async_trait]
impl SupplierDirectory for SqlSupplierDirectory {
    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Supplier>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, email, material
             FROM suppliers
             WHERE name LIKE '%' || ? || '%' COLLATE NOCASE
             ORDER BY name COLLATE NOCASE, id",
        )
        .bind(fragment)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(supplier_from_row).collect())
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Supplier>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, name, email, material
             FROM suppliers
             WHERE email = ? COLLATE NOCASE
             ORDER BY id",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        Ok(rows.into_iter().map(supplier_from_row).collect())
    }

    async fn insert(&self, name: &str, email: &str) -> Result<Supplier, StoreError> {
        let row = sqlx::query(
            "INSERT INTO suppliers (name, email, created_at)
             VALUES (?, ?, ?)
             RETURNING id, name, email, material",
        )
        .bind(name)
        .bind(email)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;

        Ok(supplier_from_row(row))
    }
}

#[cfg(test)]
mod tests {
    use posty_core::ports::SupplierDirectory;

    use super::SqlSupplierDirectory;
    use crate::{connect_with_settings, migrations};

    async fn directory() -> SqlSupplierDirectory {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        SqlSupplierDirectory::new(pool)
    }

    #[tokio::test]
    async fn name_search_is_case_insensitive_substring_with_stable_order() {
        let directory = directory().await;
        directory.insert("Omar Said", "said@supplier.example").await.expect("insert");
        directory.insert("Omar Khalil", "khalil@supplier.example").await.expect("insert");
        directory.insert("Fatima Noor", "fatima@supplier.example").await.expect("insert");

        let matches = directory.find_by_name("omar").await.expect("search");

        let names: Vec<&str> = matches.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Omar Khalil", "Omar Said"]);
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_misses_cleanly() {
        let directory = directory().await;
        directory.insert("Omar", "omar@supplier.example").await.expect("insert");

        let hit = directory.find_by_email("OMAR@supplier.example").await.expect("lookup");
        assert_eq!(hit.len(), 1);
        assert_eq!(hit[0].name, "Omar");

        let miss = directory.find_by_email("nobody@supplier.example").await.expect("lookup");
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn insert_returns_the_stored_row_with_assigned_id() {
        let directory = directory().await;

        let created = directory.insert("Yusuf", "yusuf@new.example").await.expect("insert");

        assert!(created.id.0 > 0);
        assert_eq!(created.name, "Yusuf");
        assert_eq!(created.email, "yusuf@new.example");
        assert_eq!(created.material, None);
    }
}
