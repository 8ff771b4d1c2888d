use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, routing::post, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use posty_core::domain::reply::Reply;
use posty_core::DialogueEngine;
use posty_db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DialogueEngine>,
    pub db_pool: DbPool,
}

#[derive(Debug, Deserialize)]
pub struct ChatCommand {
    pub session_id: String,
    pub message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat-command", post(chat_command))
        .route("/health", get(health))
        .with_state(state)
}

/// Conversational entry point. Always answers 200 with a structured reply;
/// faults inside the dialogue surface as `status: error` payloads rather
/// than HTTP failures.
pub async fn chat_command(
    State(state): State<AppState>,
    Json(command): Json<ChatCommand>,
) -> Json<Reply> {
    let correlation_id = Uuid::new_v4().to_string();
    info!(
        event_name = "http.chat_command",
        correlation_id = %correlation_id,
        session_id = %command.session_id,
        "inbound chat command"
    );

    let reply = state.engine.submit_message(&command.session_id, &command.message).await;
    Json(reply)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub database: HealthCheck,
    pub checked_at: String,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_check(&state.db_pool).await;
    let ready = database.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "posty-server runtime initialized".to_string(),
        },
        database,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn database_check(pool: &DbPool) -> HealthCheck {
    match sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(pool).await {
        Ok(_) => HealthCheck { status: "ready", detail: "database query succeeded".to_string() },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("database query failed: {error}") }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use posty_core::domain::draft::EmailDraft;
    use posty_core::domain::supplier::{Supplier, SupplierId};
    use posty_core::errors::TransportError;
    use posty_core::ports::{
        DraftWriter, EmailTransport, ExtractedIntent, IntentSource, OutboundEmail,
    };
    use posty_core::{DialogueEngine, EngineDeps};
    use posty_db::{
        connect_with_settings, InMemorySenderRegistry, InMemorySessionStore,
        InMemorySupplierDirectory,
    };

    use super::{router, AppState};

    struct KeywordExtractor;

    #[async_trait]
    impl IntentSource for KeywordExtractor {
        async fn extract(&self, raw_message: &str) -> ExtractedIntent {
            if raw_message.to_lowercase().contains("omar") {
                ExtractedIntent {
                    recipient_name: Some("Omar".to_string()),
                    recipient_email: None,
                    topic: Some("iron quotation".to_string()),
                }
            } else {
                ExtractedIntent::default()
            }
        }
    }

    struct TemplateDrafter;

    #[async_trait]
    impl DraftWriter for TemplateDrafter {
        async fn draft(&self, recipient_name: &str, topic: &str) -> EmailDraft {
            EmailDraft {
                subject: format!("Re: {topic}"),
                body: format!("Hello {recipient_name}, following up on {topic}."),
            }
        }
    }

    struct AcceptingTransport;

    #[async_trait]
    impl EmailTransport for AcceptingTransport {
        async fn send(&self, _email: &OutboundEmail) -> Result<(), TransportError> {
            Ok(())
        }
    }

    async fn test_state() -> AppState {
        let directory = InMemorySupplierDirectory::with_suppliers(vec![
            Supplier {
                id: SupplierId(1),
                name: "Omar Khalil".to_string(),
                email: "khalil@supplier.example".to_string(),
                material: Some("iron".to_string()),
            },
            Supplier {
                id: SupplierId(2),
                name: "Omar Said".to_string(),
                email: "said@supplier.example".to_string(),
                material: Some("copper".to_string()),
            },
        ]);
        let registry = InMemorySenderRegistry::new();
        registry.register("primary", "sales@posty.example").await;

        let engine = Arc::new(DialogueEngine::new(
            EngineDeps {
                directory: Arc::new(directory),
                senders: Arc::new(registry),
                sessions: Arc::new(InMemorySessionStore::new()),
                transport: Arc::new(AcceptingTransport),
                extractor: Arc::new(KeywordExtractor),
                drafter: Arc::new(TemplateDrafter),
            },
            "primary",
        ));
        let db_pool = connect_with_settings("sqlite::memory:?cache=shared", 1, 5)
            .await
            .expect("pool should connect");

        AppState { engine, db_pool }
    }

    async fn post_chat(state: &AppState, session_id: &str, message: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/chat-command")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({ "session_id": session_id, "message": message }).to_string(),
            ))
            .expect("build request");

        let response = router(state.clone()).oneshot(request).await.expect("send request");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: Value = serde_json::from_slice(&bytes).expect("parse body");
        (status, payload)
    }

    #[tokio::test]
    async fn chat_command_walks_a_full_conversation_to_sent() {
        let state = test_state().await;

        let (status, payload) = post_chat(&state, "s-1", "email Omar about iron").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "ambiguous");
        assert_eq!(payload["options"].as_array().map(Vec::len), Some(2));

        let (_, payload) = post_chat(&state, "s-1", "Omar Said").await;
        assert_eq!(payload["status"], "awaiting_confirmation");
        assert_eq!(payload["recipient"], "Omar Said");
        assert_eq!(payload["recipient_email"], "said@supplier.example");

        let (_, payload) = post_chat(&state, "s-1", "yes").await;
        assert_eq!(payload["status"], "sent");
    }

    #[tokio::test]
    async fn unintelligible_first_message_asks_for_input() {
        let state = test_state().await;

        let (status, payload) = post_chat(&state, "s-2", "hello there").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["status"], "need_input");
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_the_engine() {
        let state = test_state().await;

        let request = Request::builder()
            .method("POST")
            .uri("/chat-command")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"session_id": "s-3"}"#))
            .expect("build request");

        let response = router(state).oneshot(request).await.expect("send request");

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn health_reports_ready_with_reachable_database() {
        let state = test_state().await;

        let request =
            Request::builder().uri("/health").body(Body::empty()).expect("build request");
        let response = router(state.clone()).oneshot(request).await.expect("send request");

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        let payload: Value = serde_json::from_slice(&bytes).expect("parse body");
        assert_eq!(payload["status"], "ready");
        assert_eq!(payload["database"]["status"], "ready");

        state.db_pool.close().await;
    }

    #[tokio::test]
    async fn health_degrades_when_database_is_unavailable() {
        let state = test_state().await;
        state.db_pool.close().await;

        let request =
            Request::builder().uri("/health").body(Body::empty()).expect("build request");
        let response = router(state).oneshot(request).await.expect("send request");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
