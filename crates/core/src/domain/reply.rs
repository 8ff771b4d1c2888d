use serde::{Deserialize, Serialize};

use crate::domain::supplier::Supplier;

/// Structured outcome of one inbound message. Serializes with a `status`
/// discriminator so callers can dispatch without inspecting field presence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Reply {
    NeedInput { message: String },
    NotFound { message: String },
    NoEmail { message: String },
    Ambiguous { message: String, options: Vec<Supplier> },
    AwaitingSenderChoice { message: String, options: Vec<String> },
    AwaitingConfirmation { message: String, recipient: String, recipient_email: String },
    Sent { message: String },
    Error { message: String },
}

impl Reply {
    /// Wire value of the `status` discriminator.
    pub fn status(&self) -> &'static str {
        match self {
            Self::NeedInput { .. } => "need_input",
            Self::NotFound { .. } => "not_found",
            Self::NoEmail { .. } => "no_email",
            Self::Ambiguous { .. } => "ambiguous",
            Self::AwaitingSenderChoice { .. } => "awaiting_sender_choice",
            Self::AwaitingConfirmation { .. } => "awaiting_confirmation",
            Self::Sent { .. } => "sent",
            Self::Error { .. } => "error",
        }
    }
}
