use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use posty_core::domain::draft::EmailDraft;
use posty_core::ports::DraftWriter;

use crate::llm::LlmClient;
use crate::parse::first_json_object;

const SYSTEM_PROMPT: &str = "You write short, professional business emails. \
Respond with only a JSON object with exactly these keys: \
\"subject\" (string) and \"body\" (string). The body is plain text, a few \
sentences, no signature placeholders. Do not add commentary.";

/// Produces an email draft for a recipient and topic. Malformed model
/// output falls back to a canned template so the dialogue never stalls.
pub struct LlmDrafter {
    client: Arc<dyn LlmClient>,
}

impl LlmDrafter {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DraftPayload {
    subject: String,
    body: String,
}

fn fallback_draft(recipient_name: &str, topic: &str) -> EmailDraft {
    let subject = if topic.is_empty() {
        "Following up".to_string()
    } else {
        format!("Follow-up: {topic}")
    };
    let about = if topic.is_empty() { "our recent discussion" } else { topic };
    EmailDraft {
        subject,
        body: format!(
            "Hello {recipient_name},\n\nI wanted to follow up regarding {about}. \
             Could you share the latest details when you have a moment?\n\nThank you."
        ),
    }
}

/// Models sometimes repeat the subject inside the body ("Subject: ..." as
/// the first line). Strip that so the presentation does not double it.
fn tidy(mut draft: EmailDraft) -> EmailDraft {
    if let Some(stripped) = draft.subject.strip_prefix("Subject:") {
        draft.subject = stripped.trim().to_string();
    }

    let mut lines = draft.body.lines();
    if let Some(first) = lines.next() {
        let first = first.trim();
        let duplicated = first
            .strip_prefix("Subject:")
            .map(|rest| rest.trim().eq_ignore_ascii_case(&draft.subject))
            .unwrap_or(false)
            || first.eq_ignore_ascii_case(&draft.subject);
        if duplicated {
            draft.body = lines.collect::<Vec<_>>().join("\n").trim_start().to_string();
        }
    }

    draft.subject = draft.subject.trim().to_string();
    draft.body = draft.body.trim().to_string();
    draft
}

#[async_trait]
impl DraftWriter for LlmDrafter {
    async fn draft(&self, recipient_name: &str, topic: &str) -> EmailDraft {
        let user_message = if topic.is_empty() {
            format!("Write an email to {recipient_name} following up on a recent conversation.")
        } else {
            format!("Write an email to {recipient_name} about: {topic}")
        };

        let raw = match self.client.complete(SYSTEM_PROMPT, &user_message).await {
            Ok(raw) => raw,
            Err(error) => {
                warn!(event_name = "drafter.llm_failed", error = %error, "draft generation failed");
                return fallback_draft(recipient_name, topic);
            }
        };

        let payload = first_json_object(&raw)
            .and_then(|object| serde_json::from_str::<DraftPayload>(object).ok());

        match payload {
            Some(DraftPayload { subject, body })
                if !subject.trim().is_empty() && !body.trim().is_empty() =>
            {
                tidy(EmailDraft { subject, body })
            }
            _ => {
                warn!(event_name = "drafter.bad_output", "model output was not a usable draft");
                fallback_draft(recipient_name, topic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    use posty_core::ports::DraftWriter;

    use crate::llm::LlmClient;

    use super::LlmDrafter;

    struct CannedClient {
        reply: Result<String>,
    }

    impl CannedClient {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(reply.to_string()) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: Err(anyhow!("timeout")) })
        }
    }

    #[async_trait]
    impl LlmClient for CannedClient {
        async fn complete(&self, _system_prompt: &str, _user_message: &str) -> Result<String> {
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(error) => Err(anyhow!("{error}")),
            }
        }
    }

    #[tokio::test]
    async fn well_formed_json_becomes_a_draft() {
        let drafter = LlmDrafter::new(CannedClient::ok(
            r#"{"subject": "Iron quotation", "body": "Hello Omar,\n\nCould you send the latest iron quotation?\n\nThanks."}"#,
        ));

        let draft = drafter.draft("Omar", "iron quotation").await;

        assert_eq!(draft.subject, "Iron quotation");
        assert!(draft.body.starts_with("Hello Omar"));
    }

    #[tokio::test]
    async fn leaked_subject_prefix_is_stripped() {
        let drafter = LlmDrafter::new(CannedClient::ok(
            r#"{"subject": "Subject: Iron quotation", "body": "Subject: Iron quotation\nHello Omar, quick follow-up."}"#,
        ));

        let draft = drafter.draft("Omar", "iron quotation").await;

        assert_eq!(draft.subject, "Iron quotation");
        assert!(!draft.body.contains("Subject:"));
        assert!(draft.body.starts_with("Hello Omar"));
    }

    #[tokio::test]
    async fn model_failure_falls_back_to_template() {
        let drafter = LlmDrafter::new(CannedClient::failing());

        let draft = drafter.draft("Omar", "iron quotation").await;

        assert_eq!(draft.subject, "Follow-up: iron quotation");
        assert!(draft.body.contains("Omar"));
        assert!(draft.body.contains("iron quotation"));
    }

    #[tokio::test]
    async fn empty_topic_falls_back_to_generic_template() {
        let drafter = LlmDrafter::new(CannedClient::ok("not json at all"));

        let draft = drafter.draft("Omar", "").await;

        assert_eq!(draft.subject, "Following up");
        assert!(draft.body.contains("our recent discussion"));
    }

    #[tokio::test]
    async fn blank_fields_are_rejected_in_favor_of_template() {
        let drafter = LlmDrafter::new(CannedClient::ok(r#"{"subject": " ", "body": ""}"#));

        let draft = drafter.draft("Omar", "bolts").await;

        assert_eq!(draft.subject, "Follow-up: bolts");
    }
}
