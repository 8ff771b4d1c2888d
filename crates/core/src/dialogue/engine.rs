use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::dialogue::keywords::{classify_confirmation, ConfirmationIntent};
use crate::dialogue::matcher::resolve;
use crate::domain::draft::EmailDraft;
use crate::domain::reply::Reply;
use crate::domain::session::{DialogueState, Session, SessionId};
use crate::domain::supplier::Supplier;
use crate::errors::StoreError;
use crate::ports::{
    DraftWriter, EmailTransport, IntentSource, OutboundEmail, SenderRegistry, SessionStore,
    SupplierDirectory,
};

const CONFIRM_PROMPT: &str =
    "Should I send this email? Please reply with 'yes' to send or 'no' to revise it.";

/// Collaborators injected into the engine. All calls are one-shot
/// request/response; the engine adds no retries of its own.
pub struct EngineDeps {
    pub directory: Arc<dyn SupplierDirectory>,
    pub senders: Arc<dyn SenderRegistry>,
    pub sessions: Arc<dyn SessionStore>,
    pub transport: Arc<dyn EmailTransport>,
    pub extractor: Arc<dyn IntentSource>,
    pub drafter: Arc<dyn DraftWriter>,
}

/// The multi-turn dialogue state machine. Dispatches an inbound message on
/// the session's current state, invokes collaborators as needed, persists
/// the mutated session, and produces a structured reply.
pub struct DialogueEngine {
    deps: EngineDeps,
    account: String,
    // Serializes submit_message per session id so concurrent requests for
    // the same conversation cannot lose read-modify-write updates. Entries
    // are evicted once no task holds or awaits them, so the map stays
    // bounded by in-flight conversations rather than growing per session.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DialogueEngine {
    pub fn new(deps: EngineDeps, account: impl Into<String>) -> Self {
        Self { deps, account: account.into(), locks: Mutex::new(HashMap::new()) }
    }

    /// Handle one inbound message for a conversation. Never panics and never
    /// returns a transport-level failure: every fault becomes a Reply with
    /// `status: error`.
    pub async fn submit_message(&self, session_id: &str, message: &str) -> Reply {
        let lock = self.session_lock(session_id).await;
        let guard = lock.lock().await;

        let reply = match self.handle(session_id, message).await {
            Ok(reply) => {
                info!(
                    event_name = "dialogue.reply",
                    session_id,
                    status = reply.status(),
                    "message handled"
                );
                reply
            }
            Err(store_error) => {
                error!(
                    event_name = "dialogue.internal_error",
                    session_id,
                    error = %store_error,
                    "message handling failed"
                );
                Reply::Error {
                    message: "Something went wrong handling your message. Please try again."
                        .to_string(),
                }
            }
        };

        drop(guard);
        self.release_session_lock(session_id, lock).await;
        reply
    }

    async fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(session_id.to_string()).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    /// Drop the map entry when no other task is holding or awaiting this
    /// session's lock. A later message for the same session recreates it.
    async fn release_session_lock(&self, session_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        // Two handles means the map entry plus our own clone; any waiter
        // would hold a third.
        if Arc::strong_count(&lock) == 2 {
            locks.remove(session_id);
        }
    }

    async fn handle(&self, session_id: &str, message: &str) -> Result<Reply, StoreError> {
        let sid = SessionId(session_id.to_string());

        match self.deps.sessions.get(&sid).await? {
            None => self.handle_start(&sid, message).await,
            Some(session) => match session.state {
                DialogueState::AwaitingRecipientChoice { topic, candidates } => {
                    self.handle_recipient_choice(&sid, message, topic, candidates).await
                }
                DialogueState::AwaitingSenderChoice { topic, recipient, sender_candidates } => {
                    self.handle_sender_choice(&sid, message, topic, recipient, sender_candidates)
                        .await
                }
                DialogueState::AwaitingConfirmation { topic, recipient, sender_address, draft } => {
                    self.handle_confirmation(&sid, message, topic, recipient, sender_address, draft)
                        .await
                }
            },
        }
    }

    /// First message of a conversation: extract intent, look up the
    /// recipient in the directory, then hand off to sender resolution.
    async fn handle_start(&self, sid: &SessionId, message: &str) -> Result<Reply, StoreError> {
        let intent = self.deps.extractor.extract(message).await;

        let Some(name) = intent.recipient_name.filter(|name| !name.trim().is_empty()) else {
            return Ok(Reply::NeedInput {
                message: "I couldn't find a recipient in that request. \
                          Who should the email go to?"
                    .to_string(),
            });
        };
        let topic = intent.topic.unwrap_or_default();

        // Exact email lookup when one was extracted; unknown addresses are
        // auto-created so the flow can continue as a single match.
        let email = intent.recipient_email.filter(|email| !email.trim().is_empty());
        let mut matches = match &email {
            Some(email) => self.deps.directory.find_by_email(email).await?,
            None => self.deps.directory.find_by_name(&name).await?,
        };
        if matches.is_empty() {
            if let Some(email) = &email {
                matches = vec![self.deps.directory.insert(&name, email).await?];
            }
        }

        if matches.is_empty() {
            return Ok(Reply::NotFound { message: format!("No suppliers found for '{name}'.") });
        }
        if matches.len() == 1 {
            let recipient = matches.remove(0);
            return self.resolve_sender(sid, topic, recipient).await;
        }

        let reply = Reply::Ambiguous {
            message: recipient_choice_prompt(&matches),
            options: matches.clone(),
        };
        let session = Session::new(
            sid.clone(),
            DialogueState::AwaitingRecipientChoice { topic, candidates: matches },
        );
        self.deps.sessions.put(session).await?;
        Ok(reply)
    }

    /// Recipient resolved; pick the sending address. Zero addresses on file
    /// is terminal, one drafts immediately, more than one asks the user.
    async fn resolve_sender(
        &self,
        sid: &SessionId,
        topic: String,
        recipient: Supplier,
    ) -> Result<Reply, StoreError> {
        let mut addresses =
            dedupe_preserving_order(self.deps.senders.list_addresses_for(&self.account).await?);

        if addresses.is_empty() {
            self.deps.sessions.delete(sid).await?;
            warn!(
                event_name = "dialogue.no_sender_address",
                session_id = %sid.0,
                account = %self.account,
                "no sender address configured for account"
            );
            return Ok(Reply::NoEmail {
                message: "No sender address is configured for this account, \
                          so the email cannot be sent."
                    .to_string(),
            });
        }

        if addresses.len() == 1 {
            let sender_address = addresses.remove(0);
            return self.compose_draft(sid, topic, recipient, sender_address).await;
        }

        let reply = Reply::AwaitingSenderChoice {
            message: sender_choice_prompt(&addresses),
            options: addresses.clone(),
        };
        let session = Session::new(
            sid.clone(),
            DialogueState::AwaitingSenderChoice {
                topic,
                recipient,
                sender_candidates: addresses,
            },
        );
        self.deps.sessions.put(session).await?;
        Ok(reply)
    }

    /// Generate a draft and park the conversation on confirmation. The
    /// stored state carries recipient, sender address, and draft together,
    /// so a session in this state is always fully populated.
    async fn compose_draft(
        &self,
        sid: &SessionId,
        topic: String,
        recipient: Supplier,
        sender_address: String,
    ) -> Result<Reply, StoreError> {
        let draft = self.deps.drafter.draft(&recipient.name, &topic).await;

        let reply = Reply::AwaitingConfirmation {
            message: format!("{}\n\n{CONFIRM_PROMPT}", draft.presentation()),
            recipient: recipient.name.clone(),
            recipient_email: recipient.email.clone(),
        };
        let session = Session::new(
            sid.clone(),
            DialogueState::AwaitingConfirmation { topic, recipient, sender_address, draft },
        );
        self.deps.sessions.put(session).await?;
        Ok(reply)
    }

    async fn handle_recipient_choice(
        &self,
        sid: &SessionId,
        message: &str,
        topic: String,
        candidates: Vec<Supplier>,
    ) -> Result<Reply, StoreError> {
        match resolve(message, &candidates, |supplier| supplier.name.as_str()) {
            Some(chosen) => {
                let recipient = chosen.clone();
                self.resolve_sender(sid, topic, recipient).await
            }
            // Reprompt without touching the stored session.
            None => Ok(Reply::Ambiguous {
                message: recipient_choice_prompt(&candidates),
                options: candidates,
            }),
        }
    }

    async fn handle_sender_choice(
        &self,
        sid: &SessionId,
        message: &str,
        topic: String,
        recipient: Supplier,
        sender_candidates: Vec<String>,
    ) -> Result<Reply, StoreError> {
        match resolve(message, &sender_candidates, String::as_str) {
            Some(chosen) => {
                let sender_address = chosen.clone();
                self.compose_draft(sid, topic, recipient, sender_address).await
            }
            None => Ok(Reply::AwaitingSenderChoice {
                message: sender_choice_prompt(&sender_candidates),
                options: sender_candidates,
            }),
        }
    }

    async fn handle_confirmation(
        &self,
        sid: &SessionId,
        message: &str,
        topic: String,
        recipient: Supplier,
        sender_address: String,
        draft: EmailDraft,
    ) -> Result<Reply, StoreError> {
        match classify_confirmation(message) {
            ConfirmationIntent::Affirmative => {
                let email = OutboundEmail {
                    from: sender_address,
                    to: recipient.email.clone(),
                    to_name: recipient.name.clone(),
                    subject: draft.subject,
                    body: draft.body,
                };
                match self.deps.transport.send(&email).await {
                    Ok(()) => {
                        self.deps.sessions.delete(sid).await?;
                        info!(
                            event_name = "dialogue.email_sent",
                            session_id = %sid.0,
                            recipient = %email.to,
                            "email dispatched and session closed"
                        );
                        Ok(Reply::Sent { message: "Email sent successfully.".to_string() })
                    }
                    // Session stays intact so re-confirming retries the send.
                    Err(transport_error) => {
                        warn!(
                            event_name = "dialogue.transport_rejected",
                            session_id = %sid.0,
                            error = %transport_error,
                            "email transport rejected the send"
                        );
                        Ok(Reply::Error { message: transport_error.to_string() })
                    }
                }
            }
            ConfirmationIntent::Negative => {
                let draft = self.deps.drafter.draft(&recipient.name, &topic).await;
                let reply = Reply::AwaitingConfirmation {
                    message: format!("{}\n\n{CONFIRM_PROMPT}", draft.presentation()),
                    recipient: recipient.name.clone(),
                    recipient_email: recipient.email.clone(),
                };
                let session = Session::new(
                    sid.clone(),
                    DialogueState::AwaitingConfirmation {
                        topic,
                        recipient,
                        sender_address,
                        draft,
                    },
                );
                self.deps.sessions.put(session).await?;
                Ok(reply)
            }
            ConfirmationIntent::Unrecognized => Ok(Reply::AwaitingConfirmation {
                message: CONFIRM_PROMPT.to_string(),
                recipient: recipient.name,
                recipient_email: recipient.email,
            }),
        }
    }
}

fn recipient_choice_prompt(candidates: &[Supplier]) -> String {
    let listing = candidates
        .iter()
        .enumerate()
        .map(|(index, supplier)| format!("{}. {}", index + 1, supplier.name))
        .collect::<Vec<_>>()
        .join("\n");
    format!("I found multiple matches. Please reply with the full name of your choice:\n{listing}")
}

fn sender_choice_prompt(addresses: &[String]) -> String {
    let listing = addresses
        .iter()
        .enumerate()
        .map(|(index, address)| format!("{}. {address}", index + 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Which address should the email be sent from?\n{listing}")
}

fn dedupe_preserving_order(addresses: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    addresses.into_iter().filter(|address| seen.insert(address.to_lowercase())).collect()
}
