//! Conversational agents.
//!
//! An [`Agent`] is one participant in a simulated conversation: a persona
//! (name, company, role, objective) plus a way to produce one reply per turn.
//! Two variants exist, dispatched through a single [`respond`](Agent::respond)
//! capability:
//!
//! - [`ModelAgent`] generates replies through a [`ClientWrapper`] backed by a
//!   remote chat-completion endpoint.
//! - [`ExternalAgent`] stands in for an out-of-band participant (a human at a
//!   keyboard, another system). No input channel is wired up, so its `respond`
//!   fails fast with [`AgentError::Unsupported`] instead of blocking.
//!
//! Agents hold no conversation state — the transcript lives in the
//! [`Conversation`](crate::Conversation) — so the same agent value can serve
//! multiple concurrent runs.
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::{Agent, ModelAgent, Persona};
//! use colloquy::clients::chat::ChatCompletionClient;
//! use colloquy::config::CompletionConfig;
//! use std::sync::Arc;
//!
//! let client = Arc::new(ChatCompletionClient::new(&CompletionConfig::from_env()));
//! let agent = Agent::Model(ModelAgent::new(
//!     Persona::new("Sarah", "HPE", "Sales Engineer", "Sell servers and close the deal"),
//!     client,
//! ));
//! assert_eq!(agent.persona().name, "Sarah");
//! ```

use crate::client_wrapper::{ChatMessage, ClientWrapper, CompletionError, Role};
use crate::colloquy::orchestrator::TurnMessage;
use log::{error, info};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Identity of a conversational participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    /// The participant's name, e.g. `"Sarah"`.
    pub name: String,
    /// Company or affiliation the participant represents.
    pub company: String,
    /// Professional role, e.g. `"Sales Engineer"`.
    pub role: String,
    /// What the participant is trying to achieve, in natural language.
    pub objective: String,
}

impl Persona {
    pub fn new(
        name: impl Into<String>,
        company: impl Into<String>,
        role: impl Into<String>,
        objective: impl Into<String>,
    ) -> Self {
        Persona {
            name: name.into(),
            company: company.into(),
            role: role.into(),
            objective: objective.into(),
        }
    }

    /// Generate the system prompt steering the model into this persona.
    pub fn system_prompt(&self) -> String {
        format!(
            "You are {name}, a {role} at {company}.\n\n\
             Your objective: {objective}\n\n\
             Guidelines:\n\
             - Stay in character as {name}\n\
             - Be professional and realistic\n\
             - Keep responses concise (2-3 sentences)\n\
             - Focus on your objective\n\
             - Respond naturally as if in a business conversation",
            name = self.name,
            role = self.role,
            company = self.company,
            objective = self.objective,
        )
    }
}

/// An agent's `respond` call failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// The underlying completion call failed; carries the original category.
    Completion(CompletionError),
    /// The agent is externally driven and cannot generate replies on its own.
    Unsupported,
}

impl AgentError {
    /// Stable lowercase tag for boundary reporting.
    pub fn category(&self) -> &'static str {
        match self {
            AgentError::Completion(err) => err.category(),
            AgentError::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::Completion(err) => write!(f, "{}", err),
            AgentError::Unsupported => {
                write!(f, "externally-driven agents cannot generate replies")
            }
        }
    }
}

impl Error for AgentError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AgentError::Completion(err) => Some(err),
            AgentError::Unsupported => None,
        }
    }
}

/// An agent whose replies are generated by a remote model.
pub struct ModelAgent {
    persona: Persona,
    client: Arc<dyn ClientWrapper>,
}

impl ModelAgent {
    /// Create a model-backed agent. The target model identifier is carried by
    /// the client (see [`ClientWrapper::model_name`]).
    pub fn new(persona: Persona, client: Arc<dyn ClientWrapper>) -> Self {
        ModelAgent { persona, client }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    /// Identifier of the model this agent generates with.
    pub fn model(&self) -> &str {
        self.client.model_name()
    }

    /// Generate one reply from the conversation history so far.
    ///
    /// The full history is included deterministically, translated into the
    /// agent's point of view: its own prior turns become `assistant` messages,
    /// everyone else's become `user` messages, after the persona system prompt.
    /// Returns the reply text (never empty) and the wall-clock latency of the
    /// call. A failed or empty completion propagates as an error — no fallback
    /// reply is fabricated.
    pub async fn respond(
        &self,
        history: &[TurnMessage],
    ) -> Result<(String, Duration), AgentError> {
        let started = Instant::now();

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::new(Role::System, self.persona.system_prompt()));
        for msg in history {
            let role = if msg.agent == self.persona.name {
                Role::Assistant
            } else {
                Role::User
            };
            messages.push(ChatMessage::new(role, msg.message.clone()));
        }

        info!("{} generating response...", self.persona.name);

        let reply = self
            .client
            .send_message(&messages)
            .await
            .map_err(|err| {
                error!("{}: {}", self.persona.name, err);
                AgentError::Completion(err)
            })?;

        let text = reply.content.trim().to_string();
        if text.is_empty() {
            error!("{}: Received empty response", self.persona.name);
            return Err(AgentError::Completion(CompletionError::Protocol(
                "empty completion text".to_string(),
            )));
        }

        let latency = started.elapsed();
        info!(
            "{}: {}... [SUCCESS] ({:.2}s)",
            self.persona.name,
            text.chars().take(50).collect::<String>(),
            latency.as_secs_f64()
        );
        Ok((text, latency))
    }
}

/// A participant driven from outside the orchestration core.
///
/// No input channel is wired up: asking this agent to respond yields
/// [`AgentError::Unsupported`] rather than blocking on input that cannot
/// arrive.
pub struct ExternalAgent {
    persona: Persona,
}

impl ExternalAgent {
    pub fn new(persona: Persona) -> Self {
        ExternalAgent { persona }
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }
}

/// A conversational participant, polymorphic over how replies are produced.
pub enum Agent {
    /// Replies come from a remote model via a [`ClientWrapper`].
    Model(ModelAgent),
    /// Replies would come from outside the core; currently unsupported.
    External(ExternalAgent),
}

impl Agent {
    pub fn persona(&self) -> &Persona {
        match self {
            Agent::Model(agent) => agent.persona(),
            Agent::External(agent) => agent.persona(),
        }
    }

    /// Produce one reply and the latency taken to generate it.
    pub async fn respond(
        &self,
        history: &[TurnMessage],
    ) -> Result<(String, Duration), AgentError> {
        match self {
            Agent::Model(agent) => agent.respond(history).await,
            Agent::External(agent) => {
                error!(
                    "{}: external agent asked to respond without an input channel",
                    agent.persona().name
                );
                Err(AgentError::Unsupported)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_embeds_persona() {
        let persona = Persona::new("Yuki", "Toyota", "IT Procurement Manager", "Get the best price");
        let prompt = persona.system_prompt();
        assert!(prompt.contains("You are Yuki, a IT Procurement Manager at Toyota."));
        assert!(prompt.contains("Your objective: Get the best price"));
        assert!(prompt.contains("Stay in character as Yuki"));
    }

    #[tokio::test]
    async fn external_agent_fails_fast() {
        let agent = Agent::External(ExternalAgent::new(Persona::new(
            "Ken", "Toyota", "CFO", "Minimize costs",
        )));
        let err = agent.respond(&[]).await.unwrap_err();
        assert_eq!(err, AgentError::Unsupported);
        assert_eq!(err.category(), "unsupported");
    }
}
