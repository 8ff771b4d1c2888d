//! Collaborator interfaces consumed by the dialogue engine. Implementations
//! live in `posty-db` (directory, sender registry, session store),
//! `posty-agent` (extractor, drafter) and `posty-server` (email transport);
//! tests inject stubs.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::draft::EmailDraft;
use crate::domain::session::{Session, SessionId};
use crate::domain::supplier::Supplier;
use crate::errors::{StoreError, TransportError};

/// Structured fields pulled out of a raw user message. Ephemeral: consumed
/// immediately by the engine, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedIntent {
    pub recipient_name: Option<String>,
    pub recipient_email: Option<String>,
    pub topic: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: String,
    pub to_name: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait SupplierDirectory: Send + Sync {
    /// Case-insensitive substring match on supplier name, in stable order.
    async fn find_by_name(&self, fragment: &str) -> Result<Vec<Supplier>, StoreError>;
    /// Exact (case-insensitive) email match.
    async fn find_by_email(&self, email: &str) -> Result<Vec<Supplier>, StoreError>;
    async fn insert(&self, name: &str, email: &str) -> Result<Supplier, StoreError>;
}

#[async_trait]
pub trait SenderRegistry: Send + Sync {
    /// Sender addresses on file for an account, in configured order.
    async fn list_addresses_for(&self, account: &str) -> Result<Vec<String>, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError>;
    async fn put(&self, session: Session) -> Result<(), StoreError>;
    async fn delete(&self, session_id: &SessionId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Fire-and-forget send through the outbound provider.
    async fn send(&self, email: &OutboundEmail) -> Result<(), TransportError>;
}

/// Intent extraction is infallible by contract: a parse failure yields an
/// all-empty intent, which the engine treats as "need more input".
#[async_trait]
pub trait IntentSource: Send + Sync {
    async fn extract(&self, raw_message: &str) -> ExtractedIntent;
}

/// Draft generation is infallible by contract: malformed generator output
/// falls back to a canned template.
#[async_trait]
pub trait DraftWriter: Send + Sync {
    async fn draft(&self, recipient_name: &str, topic: &str) -> EmailDraft;
}
