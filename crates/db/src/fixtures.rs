//! Demo dataset for local development: a small supplier directory with an
//! ambiguous name pair and two sender addresses on the default account.

use chrono::Utc;
use sqlx::Row;

use crate::DbPool;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub suppliers_inserted: u32,
    pub sender_addresses_inserted: u32,
}

const DEMO_SUPPLIERS: &[(&str, &str, Option<&str>)] = &[
    ("Omar Khalil", "omar.khalil@ironworks.example", Some("iron")),
    ("Omar Said", "omar.said@metals.example", Some("copper")),
    ("Fatima Noor", "fatima@fasteners.example", Some("bolts")),
];

const DEMO_SENDER_ADDRESSES: &[(&str, &str, i64)] = &[
    ("primary", "sales@posty.example", 0),
    ("primary", "quotes@posty.example", 1),
];

/// Idempotent: re-running against an already seeded database inserts
/// nothing and reports zero counts.
pub async fn seed_demo_data(pool: &DbPool) -> Result<SeedResult, sqlx::Error> {
    let mut result = SeedResult::default();

    for (name, email, material) in DEMO_SUPPLIERS {
        let existing =
            sqlx::query("SELECT COUNT(*) AS count FROM suppliers WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_one(pool)
                .await?
                .get::<i64, _>("count");
        if existing > 0 {
            continue;
        }

        sqlx::query("INSERT INTO suppliers (name, email, material, created_at) VALUES (?, ?, ?, ?)")
            .bind(name)
            .bind(email)
            .bind(material)
            .bind(Utc::now().to_rfc3339())
            .execute(pool)
            .await?;
        result.suppliers_inserted += 1;
    }

    for (account, address, position) in DEMO_SENDER_ADDRESSES {
        let outcome = sqlx::query(
            "INSERT OR IGNORE INTO sender_addresses (account, address, position) VALUES (?, ?, ?)",
        )
        .bind(account)
        .bind(address)
        .bind(position)
        .execute(pool)
        .await?;
        result.sender_addresses_inserted += outcome.rows_affected() as u32;
    }

    Ok(result)
}
