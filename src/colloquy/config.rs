//! Configuration for completion endpoints.
//!
//! Provides the [`CompletionConfig`] struct consumed by
//! [`ChatCompletionClient`](crate::clients::chat::ChatCompletionClient).
//! Configuration is always passed explicitly to constructors — there is no
//! hidden process-wide state — but [`CompletionConfig::from_env`] mirrors the
//! environment variables the deployment scripts set.
//!
//! # Example
//!
//! ```rust
//! use colloquy::config::CompletionConfig;
//! use std::time::Duration;
//!
//! // Use the defaults (a local Ollama endpoint)
//! let config = CompletionConfig::default();
//! assert_eq!(config.timeout, Duration::from_secs(60));
//!
//! // Or read LLM_API_ENDPOINT / LLM_API_TOKEN / DEFAULT_MODEL from the env
//! let config = CompletionConfig::from_env();
//! # let _ = config;
//! ```

use std::env;
use std::time::Duration;

/// Recommended default turn budget for a conversation run.
pub const DEFAULT_MAX_TURNS: usize = 30;

/// Connection settings for one chat-completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionConfig {
    /// Full URL of the chat endpoint.
    pub endpoint: String,
    /// Bearer token; empty disables the Authorization header.
    pub api_token: String,
    /// Default model identifier for agents that don't override it.
    pub model: String,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        CompletionConfig {
            endpoint: "http://localhost:11434/api/chat".to_string(),
            api_token: String::new(),
            model: "meta/llama-3.1-8b-instruct".to_string(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl CompletionConfig {
    /// Build a config from the environment, falling back to the defaults:
    ///
    /// - `LLM_API_ENDPOINT` — chat endpoint URL
    /// - `LLM_API_TOKEN` — bearer token (optional)
    /// - `DEFAULT_MODEL` — model identifier
    pub fn from_env() -> Self {
        let defaults = CompletionConfig::default();
        CompletionConfig {
            endpoint: env::var("LLM_API_ENDPOINT").unwrap_or(defaults.endpoint),
            api_token: env::var("LLM_API_TOKEN").unwrap_or(defaults.api_token),
            model: env::var("DEFAULT_MODEL").unwrap_or(defaults.model),
            timeout: defaults.timeout,
        }
    }
}

/// Default turn budget, overridable with the `MAX_TURNS` environment variable.
pub fn max_turns_from_env() -> usize {
    env::var("MAX_TURNS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(DEFAULT_MAX_TURNS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_ollama() {
        let config = CompletionConfig::default();
        assert_eq!(config.endpoint, "http://localhost:11434/api/chat");
        assert!(config.api_token.is_empty());
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn default_budget_is_thirty() {
        assert_eq!(DEFAULT_MAX_TURNS, 30);
    }
}
