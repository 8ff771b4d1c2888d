//! In-memory port implementations for tests and setups that do not need
//! persistence across restarts.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use posty_core::domain::session::{Session, SessionId};
use posty_core::domain::supplier::{Supplier, SupplierId};
use posty_core::errors::StoreError;
use posty_core::ports::{SenderRegistry, SessionStore, SupplierDirectory};

#[derive(Default)]
pub struct InMemorySupplierDirectory {
    suppliers: RwLock<Vec<Supplier>>,
    next_id: AtomicI64,
}

impl InMemorySupplierDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_suppliers(suppliers: Vec<Supplier>) -> Self {
        let next_id = suppliers.iter().map(|s| s.id.0).max().unwrap_or(0);
        Self { suppliers: RwLock::new(suppliers), next_id: AtomicI64::new(next_id) }
    }
}

#[async_trait]
impl SupplierDirectory for InMemorySupplierDirectory {
    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Supplier>, StoreError> {
        let needle = fragment.to_lowercase();
        let mut matches: Vec<Supplier> = self
            .suppliers
            .read()
            .await
            .iter()
            .filter(|supplier| supplier.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            a.name.to_lowercase().cmp(&b.name.to_lowercase()).then(a.id.0.cmp(&b.id.0))
        });
        Ok(matches)
    }

    async fn find_by_email(&self, email: &str) -> Result<Vec<Supplier>, StoreError> {
        Ok(self
            .suppliers
            .read()
            .await
            .iter()
            .filter(|supplier| supplier.email.eq_ignore_ascii_case(email))
            .cloned()
            .collect())
    }

    async fn insert(&self, name: &str, email: &str) -> Result<Supplier, StoreError> {
        let supplier = Supplier {
            id: SupplierId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1),
            name: name.to_string(),
            email: email.to_string(),
            material: None,
        };
        self.suppliers.write().await.push(supplier.clone());
        Ok(supplier)
    }
}

#[derive(Default)]
pub struct InMemorySenderRegistry {
    by_account: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemorySenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, account: &str, address: &str) {
        self.by_account
            .write()
            .await
            .entry(account.to_string())
            .or_default()
            .push(address.to_string());
    }
}

#[async_trait]
impl SenderRegistry for InMemorySenderRegistry {
    async fn list_addresses_for(&self, account: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.by_account.read().await.get(account).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(&session_id.0).cloned())
    }

    async fn put(&self, session: Session) -> Result<(), StoreError> {
        self.sessions.write().await.insert(session.id.0.clone(), session);
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.sessions.write().await.remove(&session_id.0);
        Ok(())
    }
}
