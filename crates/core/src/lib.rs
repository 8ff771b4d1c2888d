pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod ports;

pub use dialogue::engine::{DialogueEngine, EngineDeps};
pub use dialogue::keywords::{classify_confirmation, ConfirmationIntent};
pub use dialogue::matcher::resolve;
pub use domain::draft::EmailDraft;
pub use domain::reply::Reply;
pub use domain::session::{DialogueState, Session, SessionId};
pub use domain::supplier::{Supplier, SupplierId};
pub use errors::{StoreError, TransportError};
pub use ports::{
    DraftWriter, EmailTransport, ExtractedIntent, IntentSource, OutboundEmail, SenderRegistry,
    SessionStore, SupplierDirectory,
};
