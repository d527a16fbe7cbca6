//! Conversation orchestration engine.
//!
//! A [`Conversation`] owns a roster of [`Agent`]s, a turn budget, and the
//! live transcript, and drives a strictly sequential round-robin turn loop:
//! select the current speaker, ask it to respond, append the resulting
//! [`TurnMessage`], evaluate the [termination policy](crate::termination),
//! advance the speaker cursor, repeat.
//!
//! One internal turn engine serves both execution modes:
//!
//! - [`Conversation::run`] drains the engine and returns the full transcript
//!   after the run reaches a terminal state (batch).
//! - [`Conversation::stream`] hands out a [`TurnStream`], a lazy forward-only
//!   sequence that executes exactly one turn per [`next`](TurnStream::next)
//!   call. Dropping the stream mid-run cancels the conversation: no further
//!   agent calls are made and the transcript prefix stays inspectable.
//!
//! Both modes therefore produce identical transcripts for identical inputs
//! and a deterministic client, by construction rather than by duplication.
//!
//! Any agent failure is fatal to the run — the conversation transitions to
//! [`RunStatus::Failed`] and the error surfaces immediately with the agent
//! name and turn number attached. Messages appended before the failure are
//! retained and remain available through [`Conversation::transcript`].
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::{Agent, Conversation, ModelAgent, Persona};
//! use colloquy::clients::chat::ChatCompletionClient;
//! use colloquy::config::CompletionConfig;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ChatCompletionClient::new(&CompletionConfig::from_env()));
//! let agents = vec![
//!     Agent::Model(ModelAgent::new(
//!         Persona::new("Sarah", "HPE", "Sales Engineer", "Close the deal"),
//!         client.clone(),
//!     )),
//!     Agent::Model(ModelAgent::new(
//!         Persona::new("Yuki", "Toyota", "Procurement Manager", "Get the best price"),
//!         client,
//!     )),
//! ];
//!
//! let mut conversation = Conversation::new(agents, 30, "Let's discuss: server procurement")?;
//! let mut stream = conversation.stream();
//! while let Some(message) = stream.next().await {
//!     let message = message?;
//!     println!("[{}] {}: {}", message.turn, message.agent, message.message);
//! }
//! # Ok(())
//! # }
//! ```

use crate::colloquy::agent::{Agent, AgentError};
use crate::colloquy::termination;
use chrono::{DateTime, Utc};
use log::{error, info};
use serde::Serialize;
use std::error::Error;
use std::fmt;

/// Lifecycle of a conversation run.
///
/// A run starts `Idle`, enters `Running` on the first turn, and ends in
/// exactly one of the terminal states: `Completed` (termination policy fired
/// or the budget was exhausted), `Stopped` (the streaming consumer cancelled),
/// or `Failed` (an agent or completion call failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl RunStatus {
    /// Whether the run can make no further progress.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Stopped | RunStatus::Failed
        )
    }
}

/// One utterance in a conversation transcript.
///
/// Created by the orchestrator immediately after an agent produces a reply
/// and immutable afterward. Turn indices are contiguous from 1 within a run;
/// the seed utterance is carried internally as turn 0 and exposed through
/// [`Conversation::seed_message`] rather than the transcript.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnMessage {
    /// 1-based turn index; 0 only for the seed utterance.
    pub turn: usize,
    /// Name of the speaking participant.
    pub agent: String,
    /// Company the speaker represents.
    pub company: String,
    /// The speaker's professional role.
    pub role: String,
    /// The utterance text; never empty.
    pub message: String,
    /// UTC timestamp recorded when the message was created.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock seconds the completion call took, absent on the seed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
}

/// Errors raised while configuring or executing a conversation.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationError {
    /// The run request was rejected before any turn executed (roster too
    /// small, non-positive budget, blank seed).
    InvalidInput(String),
    /// An agent failed to produce its turn; fatal to the run.
    AgentFailed {
        /// Name of the agent whose turn failed.
        agent: String,
        /// The 1-based turn that was being generated.
        turn: usize,
        /// The underlying failure.
        source: AgentError,
    },
}

impl ConversationError {
    /// Stable lowercase tag for boundary reporting: `invalid-input`,
    /// `timeout`, `transport`, `protocol`, or `unsupported`.
    pub fn category(&self) -> &'static str {
        match self {
            ConversationError::InvalidInput(_) => "invalid-input",
            ConversationError::AgentFailed { source, .. } => source.category(),
        }
    }
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            ConversationError::AgentFailed {
                agent,
                turn,
                source,
            } => write!(f, "turn {} failed for agent {}: {}", turn, agent, source),
        }
    }
}

impl Error for ConversationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ConversationError::InvalidInput(_) => None,
            ConversationError::AgentFailed { source, .. } => Some(source),
        }
    }
}

/// One scheduled exchange between a roster of agents.
///
/// Owns the agents and the transcript for the lifetime of a single run. The
/// transcript is mutated only by this run's turn loop; once the status turns
/// terminal the conversation is effectively immutable and can be handed to
/// whatever store or transport the host application uses.
pub struct Conversation {
    agents: Vec<Agent>,
    max_turns: usize,
    /// Internal history; index 0 holds the seed utterance.
    history: Vec<TurnMessage>,
    /// Index into `agents` of the next speaker.
    cursor: usize,
    /// 1-based index the next generated message will carry.
    next_turn: usize,
    status: RunStatus,
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("agents", &self.agents.len())
            .field("max_turns", &self.max_turns)
            .field("history", &self.history)
            .field("cursor", &self.cursor)
            .field("next_turn", &self.next_turn)
            .field("status", &self.status)
            .finish()
    }
}

impl Conversation {
    /// Create a run from a roster, a turn budget, and a seed utterance.
    ///
    /// The seed is attributed to the first agent as the conversation opener,
    /// so the first generated turn belongs to the second agent and turn `i`
    /// is spoken by `roster[i % len]`.
    ///
    /// Validation happens here, before any completion call: the roster must
    /// hold at least two agents, the budget must be positive, and the seed
    /// must not be blank.
    pub fn new(
        agents: Vec<Agent>,
        max_turns: usize,
        seed: impl Into<String>,
    ) -> Result<Self, ConversationError> {
        if agents.len() < 2 {
            return Err(ConversationError::InvalidInput(format!(
                "roster must contain at least two agents, got {}",
                agents.len()
            )));
        }
        if max_turns == 0 {
            return Err(ConversationError::InvalidInput(
                "turn budget must be positive".to_string(),
            ));
        }
        let seed = seed.into();
        if seed.trim().is_empty() {
            return Err(ConversationError::InvalidInput(
                "seed message must not be empty".to_string(),
            ));
        }

        let opener = agents[0].persona().clone();
        let seed_message = TurnMessage {
            turn: 0,
            agent: opener.name,
            company: opener.company,
            role: opener.role,
            message: seed,
            timestamp: Utc::now(),
            generation_time: None,
        };

        Ok(Conversation {
            cursor: 1 % agents.len(),
            agents,
            max_turns,
            history: vec![seed_message],
            next_turn: 1,
            status: RunStatus::Idle,
        })
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The generated transcript so far: turns `1..=n`, in order.
    pub fn transcript(&self) -> &[TurnMessage] {
        &self.history[1..]
    }

    /// The seed utterance, carried as turn 0 and attributed to the opener.
    pub fn seed_message(&self) -> &TurnMessage {
        &self.history[0]
    }

    /// Number of generated messages so far.
    pub fn turns_taken(&self) -> usize {
        self.history.len() - 1
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    pub fn roster(&self) -> &[Agent] {
        &self.agents
    }

    /// Run the conversation to completion and return the full transcript.
    ///
    /// On failure the error carries the failing agent and turn; the partial
    /// transcript produced before the failure remains available through
    /// [`transcript`](Conversation::transcript).
    pub async fn run(&mut self) -> Result<Vec<TurnMessage>, ConversationError> {
        let mut stream = self.stream();
        while let Some(result) = stream.next().await {
            result?;
        }
        drop(stream);
        Ok(self.transcript().to_vec())
    }

    /// Expose the run as a lazy, forward-only sequence of messages.
    ///
    /// Each [`next`](TurnStream::next) call executes exactly one turn, so a
    /// consumer that stops pulling performs no further agent calls. Dropping
    /// the stream while the run is live marks the conversation `Stopped`.
    pub fn stream(&mut self) -> TurnStream<'_> {
        TurnStream { conversation: self }
    }

    /// Execute a single turn: speaker selection, agent call, append, policy.
    ///
    /// Returns `None` once the run is in a terminal state.
    async fn execute_turn(&mut self) -> Option<Result<TurnMessage, ConversationError>> {
        match self.status {
            RunStatus::Idle => {
                info!("Starting conversation with {} agents", self.agents.len());
                self.status = RunStatus::Running;
            }
            RunStatus::Running => {}
            _ => return None,
        }

        let speaker = self.cursor;
        let turn = self.next_turn;
        info!(
            "Turn {}: {} is thinking...",
            turn,
            self.agents[speaker].persona().name
        );

        let result = self.agents[speaker].respond(&self.history).await;
        let persona = self.agents[speaker].persona().clone();

        match result {
            Ok((text, latency)) => {
                let generation_secs = latency.as_secs_f64();
                let msg = TurnMessage {
                    turn,
                    agent: persona.name,
                    company: persona.company,
                    role: persona.role,
                    message: text,
                    timestamp: Utc::now(),
                    generation_time: Some(generation_secs),
                };
                self.history.push(msg.clone());
                self.next_turn += 1;
                self.cursor = (self.cursor + 1) % self.agents.len();
                info!(
                    "Turn {}: {} completed ({:.2}s)",
                    turn, msg.agent, generation_secs
                );

                if termination::should_stop(self.turns_taken(), self.max_turns, &msg.message) {
                    if self.turns_taken() >= self.max_turns {
                        info!("Turn budget exhausted at {} messages", self.turns_taken());
                    } else if let Some(keyword) = termination::completion_keyword(&msg.message) {
                        info!(
                            "Detected completion keyword {:?} in: {}...",
                            keyword,
                            msg.message.chars().take(50).collect::<String>()
                        );
                    }
                    self.status = RunStatus::Completed;
                    info!("Conversation complete: {} messages", self.turns_taken());
                }

                Some(Ok(msg))
            }
            Err(err) => {
                error!("Turn {} failed: {}", turn, err);
                error!("Stopping conversation due to error");
                self.status = RunStatus::Failed;
                Some(Err(ConversationError::AgentFailed {
                    agent: persona.name,
                    turn,
                    source: err,
                }))
            }
        }
    }
}

/// A lazy, forward-only view over a live conversation run.
///
/// Created by [`Conversation::stream`]. Messages are delivered strictly in
/// turn order with no lookahead; the turn that produces message *n+1* does
/// not start until `next` is called again after message *n*.
pub struct TurnStream<'a> {
    conversation: &'a mut Conversation,
}

impl<'a> TurnStream<'a> {
    /// Execute the next turn and yield its message.
    ///
    /// Returns `None` once the run has reached a terminal state: the
    /// termination policy fired, the budget ran out, or a previous call
    /// already reported a failure.
    pub async fn next(&mut self) -> Option<Result<TurnMessage, ConversationError>> {
        self.conversation.execute_turn().await
    }

    /// Inspect the underlying conversation mid-stream.
    pub fn conversation(&self) -> &Conversation {
        self.conversation
    }
}

impl Drop for TurnStream<'_> {
    fn drop(&mut self) {
        if self.conversation.status == RunStatus::Running {
            info!(
                "Conversation cancelled by consumer after {} messages",
                self.conversation.turns_taken()
            );
            self.conversation.status = RunStatus::Stopped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colloquy::agent::{ExternalAgent, Persona};

    fn persona(name: &str) -> Persona {
        Persona::new(name, "Acme", "Engineer", "Discuss")
    }

    fn external(name: &str) -> Agent {
        Agent::External(ExternalAgent::new(persona(name)))
    }

    #[test]
    fn rejects_small_rosters() {
        let err = Conversation::new(vec![], 10, "hello").unwrap_err();
        assert_eq!(err.category(), "invalid-input");

        let err = Conversation::new(vec![external("solo")], 10, "hello").unwrap_err();
        assert!(matches!(err, ConversationError::InvalidInput(_)));
    }

    #[test]
    fn rejects_zero_budget_and_blank_seed() {
        let err = Conversation::new(vec![external("a"), external("b")], 0, "hi").unwrap_err();
        assert!(matches!(err, ConversationError::InvalidInput(_)));

        let err = Conversation::new(vec![external("a"), external("b")], 5, "   ").unwrap_err();
        assert!(matches!(err, ConversationError::InvalidInput(_)));
    }

    #[test]
    fn seed_is_attributed_to_the_opener() {
        let conversation =
            Conversation::new(vec![external("a"), external("b")], 5, "kickoff").unwrap();
        let seed = conversation.seed_message();
        assert_eq!(seed.turn, 0);
        assert_eq!(seed.agent, "a");
        assert_eq!(seed.message, "kickoff");
        assert!(seed.generation_time.is_none());
        assert!(conversation.transcript().is_empty());
        assert_eq!(conversation.status(), RunStatus::Idle);
    }
}
