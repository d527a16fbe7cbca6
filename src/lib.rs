//! # Colloquy
//!
//! Colloquy simulates multi-party text conversations between autonomous agents, each
//! backed by a remote chat-completion endpoint, coordinating turns round-robin,
//! detecting natural termination, and exposing the exchange either as a complete
//! transcript or as an incrementally-pulled stream of messages.
//!
//! The crate provides carefully layered abstractions for:
//!
//! * **Agents**: [`Agent`] participants with a persona (name, company, role,
//!   objective), either model-backed or externally driven, producing one reply per
//!   turn via the [`client_wrapper::ClientWrapper`] boundary
//! * **Orchestration**: [`Conversation`] owns the roster and transcript and drives
//!   the turn-scheduling state machine with batch and streaming execution over a
//!   single internal engine
//! * **Termination**: the [`termination`] module decides when an exchange is over —
//!   budget exhaustion or a completion-keyword match in the latest message
//! * **Provider access**: [`clients::chat::ChatCompletionClient`] speaks the common
//!   `{model, messages}` wire shape to Ollama and OpenAI-compatible endpoints with
//!   pooled connections and typed failures
//! * **Serving** (optional `server` feature): a REST + SSE service exposing
//!   conversations over HTTP with an in-memory store, mirroring how a UI consumes
//!   the stream
//!
//! ## Core Concepts
//!
//! ### Conversations: The Heart of Colloquy
//!
//! A [`Conversation`] is one scheduled exchange. Agents take strictly sequential
//! round-robin turns; each turn's input depends on the previous turn's output, so
//! there is no fan-out within a run. The only await point per turn is the outbound
//! completion call.
//!
//! ```rust,no_run
//! use colloquy::{Agent, Conversation, ModelAgent, Persona};
//! use colloquy::clients::chat::ChatCompletionClient;
//! use colloquy::config::CompletionConfig;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     colloquy::init_logger();
//!
//!     let client = Arc::new(ChatCompletionClient::new(&CompletionConfig::from_env()));
//!     let agents = vec![
//!         Agent::Model(ModelAgent::new(
//!             Persona::new("Sarah", "HPE", "Sales Engineer", "Sell servers and close the deal"),
//!             client.clone(),
//!         )),
//!         Agent::Model(ModelAgent::new(
//!             Persona::new("Yuki", "Toyota", "IT Procurement Manager", "Get the best price"),
//!             client,
//!         )),
//!     ];
//!
//!     let mut conversation = Conversation::new(agents, 30, "Let's discuss: a server deal")?;
//!     for message in conversation.run().await? {
//!         println!("[{}] {}: {}", message.turn, message.agent, message.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Streaming
//!
//! [`Conversation::stream`] exposes the same run as a lazy pull sequence: each
//! [`TurnStream::next`] call executes exactly one turn, so messages reach the
//! consumer as soon as they are appended and a consumer that stops pulling
//! cancels the run before the next agent call begins. Collecting the stream
//! yields the same transcript the batch call returns.
//!
//! ### Failure Semantics
//!
//! A completion failure ([`client_wrapper::CompletionError`]: timeout, transport,
//! or protocol) fails the turn and the run — no retries, no fabricated replies.
//! The error identifies the agent and turn, and the transcript prefix produced
//! before the failure stays available.

use std::sync::Once;

static INIT_LOGGER: Once = Once::new();

/// Initialise the global [`env_logger`] subscriber exactly once.
///
/// The helper is intentionally lightweight so that applications embedding Colloquy
/// can opt in to simple `RUST_LOG` driven diagnostics without having to choose a
/// specific logging backend upfront.
///
/// ```rust
/// colloquy::init_logger();
/// log::info!("Logger is ready");
/// ```
pub fn init_logger() {
    INIT_LOGGER.call_once(|| {
        env_logger::init();
    });
}

// Import the top-level `colloquy` module.
pub mod colloquy;

// Re-exporting key items for easier external access.
pub use crate::colloquy::agent::{Agent, AgentError, ExternalAgent, ModelAgent, Persona};
pub use crate::colloquy::client_wrapper;
pub use crate::colloquy::client_wrapper::{ChatMessage, ClientWrapper, CompletionError, Role};
pub use crate::colloquy::clients;
pub use crate::colloquy::config;
pub use crate::colloquy::config::CompletionConfig;
pub use crate::colloquy::orchestrator;
pub use crate::colloquy::orchestrator::{
    Conversation, ConversationError, RunStatus, TurnMessage, TurnStream,
};
pub use crate::colloquy::termination;

#[cfg(feature = "server")]
pub use crate::colloquy::server;
