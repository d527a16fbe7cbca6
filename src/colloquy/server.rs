//! REST + SSE conversation service.
//!
//! Available on the `server` feature (requires `axum` and `tower`). Exposes
//! conversations over HTTP with an in-memory store that resets on restart:
//!
//! - `POST /conversations` — create a conversation from a scenario, a roster
//!   of agent descriptors, and a turn budget; returns its id
//! - `GET /conversations/{id}` — record with status and stored messages
//! - `POST /conversations/{id}/start` — run the orchestrator and stream each
//!   message as a Server-Sent Event as soon as it is produced
//! - `DELETE /conversations/{id}` — remove the record
//! - `GET /` — health check
//!
//! The SSE stream first re-emits the seed utterance as turn 0, then one event
//! per generated turn. A failed run emits a final `{"error": ...}` event and
//! marks the record `failed`; a client that disconnects cancels the run
//! before the next agent call begins.
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::config::CompletionConfig;
//! use colloquy::server::{router, AppState};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     colloquy::init_logger();
//!     let app = router(AppState::new(CompletionConfig::from_env()));
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

use crate::colloquy::agent::{Agent, ModelAgent, Persona};
use crate::colloquy::clients::chat::ChatCompletionClient;
use crate::colloquy::config::{CompletionConfig, DEFAULT_MAX_TURNS};
use crate::colloquy::orchestrator::{Conversation, ConversationError, RunStatus, TurnMessage};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use futures_util::Stream;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Roster entry describing one participant of a requested conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    pub company: String,
    pub role: String,
    pub objective: String,
    /// Model override; falls back to the service-wide default model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Request to create a new conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationRequest {
    /// Topic the agents are asked to discuss; becomes the seed utterance.
    pub scenario: String,
    /// Participants in speaking order; the first agent opens.
    pub agents: Vec<AgentSpec>,
    /// Turn budget for the run.
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    DEFAULT_MAX_TURNS
}

/// Response carrying the id of a created conversation.
#[derive(Debug, Serialize)]
pub struct ConversationCreated {
    pub conversation_id: Uuid,
}

/// Stored state of one conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationRecord {
    pub scenario: String,
    pub agents: Vec<AgentSpec>,
    pub max_turns: usize,
    /// `created`, `running`, `completed`, `stopped`, or `failed`.
    pub status: String,
    /// Messages streamed so far, seed (turn 0) included.
    pub messages: Vec<TurnMessage>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Shared service state: the in-memory store plus the endpoint configuration
/// handed to every agent's completion client.
#[derive(Clone)]
pub struct AppState {
    store: Arc<RwLock<HashMap<Uuid, ConversationRecord>>>,
    config: CompletionConfig,
}

impl AppState {
    pub fn new(config: CompletionConfig) -> Self {
        AppState {
            store: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }
}

/// Build the service router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/conversations", post(create_conversation))
        .route(
            "/conversations/{id}",
            get(get_conversation).delete(delete_conversation),
        )
        .route("/conversations/{id}/start", post(start_conversation))
        .with_state(state)
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn not_found() -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"detail": "Conversation not found"})),
    )
}

fn unprocessable(detail: &str) -> ApiError {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(serde_json::json!({"detail": detail})),
    )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "colloquy"}))
}

async fn create_conversation(
    State(state): State<AppState>,
    Json(req): Json<ConversationRequest>,
) -> Result<Json<ConversationCreated>, ApiError> {
    if req.scenario.trim().is_empty() {
        return Err(unprocessable("scenario must not be empty"));
    }
    if req.agents.len() < 2 || req.agents.len() > 6 {
        return Err(unprocessable("roster must contain between 2 and 6 agents"));
    }
    if req.max_turns == 0 || req.max_turns > 100 {
        return Err(unprocessable("max_turns must be between 1 and 100"));
    }

    let conv_id = Uuid::new_v4();
    let record = ConversationRecord {
        scenario: req.scenario.clone(),
        agents: req.agents,
        max_turns: req.max_turns,
        status: "created".to_string(),
        messages: Vec::new(),
        created_at: Utc::now(),
        error: None,
    };
    state.store.write().await.insert(conv_id, record);

    info!("Created conversation {}: {}", conv_id, req.scenario);
    Ok(Json(ConversationCreated {
        conversation_id: conv_id,
    }))
}

async fn get_conversation(
    State(state): State<AppState>,
    Path(conv_id): Path<Uuid>,
) -> Result<Json<ConversationRecord>, ApiError> {
    state
        .store
        .read()
        .await
        .get(&conv_id)
        .cloned()
        .map(Json)
        .ok_or_else(not_found)
}

async fn delete_conversation(
    State(state): State<AppState>,
    Path(conv_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.store.write().await.remove(&conv_id).is_none() {
        return Err(not_found());
    }
    info!("Deleted conversation {}", conv_id);
    Ok(Json(serde_json::json!({
        "status": "deleted",
        "conversation_id": conv_id,
    })))
}

async fn start_conversation(
    State(state): State<AppState>,
    Path(conv_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (scenario, specs, max_turns) = {
        let mut store = state.store.write().await;
        let record = store.get_mut(&conv_id).ok_or_else(not_found)?;
        record.status = "running".to_string();
        (
            record.scenario.clone(),
            record.agents.clone(),
            record.max_turns,
        )
    };

    info!("Starting conversation {}", conv_id);

    let agents = build_roster(&specs, &state.config);
    let seed = format!("Let's discuss: {}", scenario);
    let conversation = Conversation::new(agents, max_turns, seed)
        .map_err(|err| unprocessable(&err.to_string()))?;

    let (tx, rx) = mpsc::channel::<Event>(16);
    tokio::spawn(run_and_publish(state, conv_id, conversation, tx));

    Ok(Sse::new(ReceiverStream::new(rx).map(Ok::<Event, Infallible>)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keep-alive"),
    ))
}

/// Instantiate the roster for a run. Each agent gets its own completion
/// client (pooled per endpoint) so per-agent model overrides apply.
fn build_roster(specs: &[AgentSpec], config: &CompletionConfig) -> Vec<Agent> {
    specs
        .iter()
        .map(|spec| {
            let model = spec.model.as_deref().unwrap_or(&config.model);
            let client = Arc::new(
                ChatCompletionClient::new_with_endpoint(
                    &config.endpoint,
                    &config.api_token,
                    model,
                )
                .with_timeout(config.timeout),
            );
            Agent::Model(ModelAgent::new(
                Persona::new(&spec.name, &spec.company, &spec.role, &spec.objective),
                client,
            ))
        })
        .collect()
}

/// Drive one run, mirroring every message into the store and the SSE channel.
async fn run_and_publish(
    state: AppState,
    conv_id: Uuid,
    mut conversation: Conversation,
    tx: mpsc::Sender<Event>,
) {
    let seed = conversation.seed_message().clone();
    if publish_message(&state, conv_id, &tx, seed).await.is_err() {
        set_status(&state, conv_id, "stopped", None).await;
        return;
    }

    let mut stream = conversation.stream();
    let mut failure: Option<ConversationError> = None;
    loop {
        match stream.next().await {
            Some(Ok(msg)) => {
                if publish_message(&state, conv_id, &tx, msg).await.is_err() {
                    // Consumer went away; dropping the stream cancels the run.
                    break;
                }
            }
            Some(Err(err)) => {
                failure = Some(err);
                break;
            }
            None => break,
        }
    }
    drop(stream);

    if let Some(err) = failure {
        error!("Conversation {} failed: {}", conv_id, err);
        set_status(&state, conv_id, "failed", Some(err.to_string())).await;
        let payload = serde_json::json!({
            "error": err.to_string(),
            "category": err.category(),
        });
        let _ = tx.send(Event::default().data(payload.to_string())).await;
        return;
    }

    match conversation.status() {
        RunStatus::Completed => {
            let count = conversation.turns_taken();
            set_status(&state, conv_id, "completed", None).await;
            info!("Conversation {} completed with {} messages", conv_id, count);
        }
        _ => {
            set_status(&state, conv_id, "stopped", None).await;
            info!("Conversation {} stopped by consumer", conv_id);
        }
    }
}

async fn publish_message(
    state: &AppState,
    conv_id: Uuid,
    tx: &mpsc::Sender<Event>,
    msg: TurnMessage,
) -> Result<(), ()> {
    if let Some(record) = state.store.write().await.get_mut(&conv_id) {
        record.messages.push(msg.clone());
    }
    let payload = serde_json::to_string(&msg).map_err(|_| ())?;
    tx.send(Event::default().data(payload)).await.map_err(|_| ())
}

async fn set_status(state: &AppState, conv_id: Uuid, status: &str, err: Option<String>) {
    if let Some(record) = state.store.write().await.get_mut(&conv_id) {
        record.status = status.to_string();
        record.error = err;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> AgentSpec {
        AgentSpec {
            name: name.to_string(),
            company: "Acme".to_string(),
            role: "Engineer".to_string(),
            objective: "Discuss".to_string(),
            model: None,
        }
    }

    fn request(agents: Vec<AgentSpec>, max_turns: usize) -> ConversationRequest {
        ConversationRequest {
            scenario: "server procurement".to_string(),
            agents,
            max_turns,
        }
    }

    #[tokio::test]
    async fn create_then_get_roundtrip() {
        let state = AppState::new(CompletionConfig::default());
        let created = create_conversation(
            State(state.clone()),
            Json(request(vec![spec("a"), spec("b")], 10)),
        )
        .await
        .unwrap();

        let record = get_conversation(State(state), Path(created.0.conversation_id))
            .await
            .unwrap();
        assert_eq!(record.0.status, "created");
        assert_eq!(record.0.max_turns, 10);
        assert!(record.0.messages.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_invalid_requests() {
        let state = AppState::new(CompletionConfig::default());

        let err = create_conversation(State(state.clone()), Json(request(vec![spec("solo")], 10)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        let err = create_conversation(
            State(state.clone()),
            Json(request(vec![spec("a"), spec("b")], 0)),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);

        let err = create_conversation(
            State(state),
            Json(ConversationRequest {
                scenario: "  ".to_string(),
                agents: vec![spec("a"), spec("b")],
                max_turns: 10,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn missing_conversation_is_not_found() {
        let state = AppState::new(CompletionConfig::default());
        let err = get_conversation(State(state.clone()), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);

        let err = delete_conversation(State(state), Path(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let state = AppState::new(CompletionConfig::default());
        let created = create_conversation(
            State(state.clone()),
            Json(request(vec![spec("a"), spec("b")], 5)),
        )
        .await
        .unwrap();
        let conv_id = created.0.conversation_id;

        delete_conversation(State(state.clone()), Path(conv_id))
            .await
            .unwrap();
        assert!(get_conversation(State(state), Path(conv_id)).await.is_err());
    }

    #[test]
    fn max_turns_defaults_when_omitted() {
        let req: ConversationRequest = serde_json::from_value(serde_json::json!({
            "scenario": "pricing",
            "agents": [
                {"name": "a", "company": "X", "role": "r", "objective": "o"},
                {"name": "b", "company": "Y", "role": "r", "objective": "o"},
            ],
        }))
        .unwrap();
        assert_eq!(req.max_turns, DEFAULT_MAX_TURNS);
    }
}
