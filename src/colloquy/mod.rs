// src/colloquy/mod.rs

pub mod agent;
pub mod client_wrapper;
pub mod clients;
pub mod config;
pub mod orchestrator;
pub mod termination;

#[cfg(feature = "server")]
pub mod server;

// Explicitly export the core types so callers reach them as colloquy::Conversation
// instead of colloquy::orchestrator::Conversation.
pub use agent::{Agent, AgentError, ExternalAgent, ModelAgent, Persona};
pub use orchestrator::{Conversation, ConversationError, RunStatus, TurnMessage, TurnStream};
