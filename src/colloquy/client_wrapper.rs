use async_trait::async_trait;
use std::error::Error;
use std::fmt;

/// A ClientWrapper is a wrapper around a specific chat-completion endpoint.
/// It provides a common interface to request one reply from a remote model.
/// It does not keep track of the conversation; the [`Conversation`](crate::Conversation)
/// owns the transcript and uses agents (which hold a ClientWrapper) to produce turns.

/// Represents the possible roles for a wire message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Set by the orchestration layer to steer the model's behavior.
    System,
    /// A message spoken by any participant other than the responding agent.
    User,
    /// A message the responding agent itself produced on an earlier turn.
    Assistant,
}

impl Role {
    /// The string identifier expected by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Represents a generic role-tagged message to be sent to an LLM.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    /// The role associated with the message.
    pub role: Role,
    /// The actual content of the message.
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }
}

/// A completion call failed. One attempt per call — retry is a caller concern.
///
/// The three variants mirror the ways a remote chat endpoint can let us down:
/// no answer in time, no connection at all, or an answer we cannot use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    /// No response arrived within the configured deadline.
    Timeout,
    /// The connection was refused, reset, or otherwise failed below HTTP.
    Transport(String),
    /// The endpoint answered with a non-success status or a malformed body.
    Protocol(String),
}

impl CompletionError {
    /// Stable lowercase tag used when reporting failures across a boundary
    /// (e.g. in HTTP error payloads).
    pub fn category(&self) -> &'static str {
        match self {
            CompletionError::Timeout => "timeout",
            CompletionError::Transport(_) => "transport",
            CompletionError::Protocol(_) => "protocol",
        }
    }
}

impl fmt::Display for CompletionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionError::Timeout => write!(f, "completion request timed out"),
            CompletionError::Transport(msg) => write!(f, "transport failure: {}", msg),
            CompletionError::Protocol(msg) => write!(f, "protocol failure: {}", msg),
        }
    }
}

impl Error for CompletionError {}

/// Trait defining the interface to request replies from a chat-completion service.
#[async_trait]
pub trait ClientWrapper: Send + Sync {
    /// Send an ordered list of role-tagged messages and get the model's reply.
    ///
    /// The list must be non-empty and every message must carry non-empty text;
    /// implementations may reject violations as [`CompletionError::Protocol`].
    /// A single attempt is made — no retries, no caching, no state between calls.
    async fn send_message(&self, messages: &[ChatMessage]) -> Result<ChatMessage, CompletionError>;

    /// Identifier of the model this client targets, as sent on the wire.
    fn model_name(&self) -> &str;
}
