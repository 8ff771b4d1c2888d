use serde::{Deserialize, Serialize};

/// A generated subject/body pair awaiting user approval.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

impl EmailDraft {
    /// Rendering used wherever the draft is shown back to the user.
    pub fn presentation(&self) -> String {
        format!("Subject: {}\n\n{}", self.subject, self.body)
    }
}
