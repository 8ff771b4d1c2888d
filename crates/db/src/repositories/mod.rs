//! Implementations of the `posty-core` storage ports: one sqlite-backed set
//! for production and one in-memory set for tests and ephemeral setups.

use posty_core::errors::StoreError;

pub mod memory;
pub mod sender;
pub mod session;
pub mod supplier;

pub use memory::{InMemorySenderRegistry, InMemorySessionStore, InMemorySupplierDirectory};
pub use sender::SqlSenderRegistry;
pub use session::SqlSessionStore;
pub use supplier::SqlSupplierDirectory;

pub(crate) fn backend(error: sqlx::Error) -> StoreError {
    StoreError::Backend(error.to_string())
}
