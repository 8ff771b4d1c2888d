use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::draft::EmailDraft;
use crate::domain::supplier::Supplier;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// Dialogue position of a conversation, carrying exactly the data that is
/// valid in that position. START is implicit: a session id with no stored
/// session is at the start of a new conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    AwaitingRecipientChoice {
        topic: String,
        candidates: Vec<Supplier>,
    },
    AwaitingSenderChoice {
        topic: String,
        recipient: Supplier,
        sender_candidates: Vec<String>,
    },
    AwaitingConfirmation {
        topic: String,
        recipient: Supplier,
        sender_address: String,
        draft: EmailDraft,
    },
}

/// Per-conversation state tracked across inbound messages. Only the latest
/// snapshot is kept; terminal outcomes delete the session entirely.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub state: DialogueState,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: SessionId, state: DialogueState) -> Self {
        Self { id, state, updated_at: Utc::now() }
    }
}
