use thiserror::Error;

/// Faults raised by the directory, sender registry, and session store ports.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store backend failure: {0}")]
    Backend(String),
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

/// Provider rejection from the outbound email transport. Surfaced to the
/// caller as an `error` reply; the session is left untouched so the user can
/// retry by re-confirming.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("email transport rejected the message: {0}")]
pub struct TransportError(pub String);
