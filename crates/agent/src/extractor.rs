use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use posty_core::ports::{ExtractedIntent, IntentSource};

use crate::llm::LlmClient;
use crate::parse::first_json_object;

const SYSTEM_PROMPT: &str = "You extract email intent from a user request. \
Respond with only a JSON object with exactly these keys: \
\"recipient_name\" (string or null), \"recipient_email\" (string or null), \
\"topic\" (string or null). Use null for anything not present in the request. \
Do not add commentary.";

/// Maps free text onto structured intent through the language model. A
/// request that cannot be parsed produces an empty intent rather than an
/// error; the dialogue layer turns that into a clarifying question.
pub struct LlmExtractor {
    client: Arc<dyn LlmClient>,
}

impl LlmExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct IntentPayload {
    recipient_name: Option<String>,
    recipient_email: Option<String>,
    topic: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[async_trait]
impl IntentSource for LlmExtractor {
    async fn extract(&self, raw_message: &str) -> ExtractedIntent {
        let raw = match self.client.complete(SYSTEM_PROMPT, raw_message).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(event_name = "extractor.llm_failed", error = %error, "intent extraction failed");
                return ExtractedIntent::default();
            }
        };

        let Some(object) = first_json_object(&raw) else {
            warn!(event_name = "extractor.no_json", "model output contained no json object");
            return ExtractedIntent::default();
        };

        match serde_json::from_str::<IntentPayload>(object) {
            Ok(payload) => ExtractedIntent {
                recipient_name: non_empty(payload.recipient_name),
                recipient_email: non_empty(payload.recipient_email),
                topic: non_empty(payload.topic),
            },
            Err(error) => {
                warn!(event_name = "extractor.bad_json", error = %error, "model json did not match schema");
                ExtractedIntent::default()
            }
        }
    }
}
