//! The `ChatCompletionClient` implements [`ClientWrapper`] against any
//! chat-completion endpoint speaking the common `{model, messages}` JSON shape
//! (Ollama's `/api/chat`, OpenAI-compatible `/v1/chat/completions`, and the
//! self-hosted gateways in between).
//!
//! # Key Features
//!
//! - **Single attempt**: one POST per call, bounded by a per-request deadline.
//!   Failures are reported as a typed [`CompletionError`]; nothing is retried.
//! - **Bearer auth**: an `Authorization: Bearer` header is attached when the
//!   configured token is non-empty.
//! - **Connection reuse**: requests go through the shared client pool in
//!   [`http_pool`](crate::clients::http_pool), one pooled client per endpoint.
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy::client_wrapper::{ChatMessage, ClientWrapper, Role};
//! use colloquy::clients::chat::ChatCompletionClient;
//! use colloquy::config::CompletionConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ChatCompletionClient::new(&CompletionConfig::from_env());
//!     let reply = client
//!         .send_message(&[
//!             ChatMessage::new(Role::System, "You are terse."),
//!             ChatMessage::new(Role::User, "Say hello."),
//!         ])
//!         .await?;
//!     println!("{}", reply.content);
//!     Ok(())
//! }
//! ```

use crate::client_wrapper::{ChatMessage, ClientWrapper, CompletionError, Role};
use crate::colloquy::clients::http_pool::get_http_client;
use crate::colloquy::config::CompletionConfig;
use async_trait::async_trait;
use log::error;
use std::time::Duration;

/// Sampling temperature sent with every request.
const TEMPERATURE: f32 = 0.7;

/// Cap on generated tokens per reply; personas answer in 2-3 sentences.
const NUM_PREDICT: u32 = 200;

/// Client wrapper for chat-completion endpoints.
///
/// The wrapper holds the endpoint URL, an optional bearer token, the model
/// identifier injected into each request, and the per-request deadline. It is
/// stateless between calls and safe to share across concurrent conversations.
pub struct ChatCompletionClient {
    /// Pooled HTTP client for this endpoint.
    http: reqwest::Client,
    /// Full URL of the chat endpoint, e.g. `http://ollama:11434/api/chat`.
    endpoint: String,
    /// Bearer token; empty means no Authorization header.
    api_token: String,
    /// Model name that will be injected into each request.
    model: String,
    /// Deadline applied to each request.
    timeout: Duration,
}

impl ChatCompletionClient {
    /// Construct a client from a [`CompletionConfig`].
    pub fn new(config: &CompletionConfig) -> Self {
        Self::new_with_endpoint(&config.endpoint, &config.api_token, &config.model)
            .with_timeout(config.timeout)
    }

    /// Construct a client from explicit endpoint, token, and model values.
    ///
    /// This is the most general constructor; pass an empty token for
    /// unauthenticated endpoints such as a local Ollama.
    pub fn new_with_endpoint(endpoint: &str, api_token: &str, model_name: &str) -> Self {
        ChatCompletionClient {
            http: get_http_client(endpoint),
            endpoint: endpoint.to_string(),
            api_token: api_token.to_string(),
            model: model_name.to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Override the per-request deadline (builder pattern).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The endpoint URL this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Pull the reply text out of a response body.
    ///
    /// Accepts both wire shapes the simulation has been pointed at: Ollama's
    /// `{"message": {"content": ...}}` and the OpenAI-style
    /// `{"choices": [{"message": {"content": ...}}]}`.
    fn extract_content(body: &serde_json::Value) -> Option<String> {
        if let Some(content) = body
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
        {
            return Some(content.to_string());
        }
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|c| c.to_string())
    }
}

#[async_trait]
impl ClientWrapper for ChatCompletionClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_message(&self, messages: &[ChatMessage]) -> Result<ChatMessage, CompletionError> {
        if messages.is_empty() {
            return Err(CompletionError::Protocol(
                "request must carry at least one message".to_string(),
            ));
        }
        if messages.iter().any(|msg| msg.content.trim().is_empty()) {
            return Err(CompletionError::Protocol(
                "message content must not be empty".to_string(),
            ));
        }

        let formatted_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                serde_json::json!({
                    "role": msg.role.as_str(),
                    "content": msg.content,
                })
            })
            .collect();

        let body = serde_json::json!({
            "model": self.model,
            "messages": formatted_messages,
            "stream": false,
            "options": {
                "temperature": TEMPERATURE,
                "num_predict": NUM_PREDICT,
            },
        });

        let mut request = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body);
        if !self.api_token.is_empty() {
            request = request.bearer_auth(&self.api_token);
        }

        let response = request.send().await.map_err(|err| {
            if err.is_timeout() {
                error!(
                    "ChatCompletionClient::send_message(...): request to {} timed out after {:?}",
                    self.endpoint, self.timeout
                );
                CompletionError::Timeout
            } else {
                error!(
                    "ChatCompletionClient::send_message(...): transport error: {}",
                    err
                );
                CompletionError::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(
                "ChatCompletionClient::send_message(...): endpoint returned {}",
                status
            );
            return Err(CompletionError::Protocol(format!(
                "endpoint returned status {}",
                status
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|err| CompletionError::Protocol(format!("invalid response body: {}", err)))?;

        match Self::extract_content(&parsed) {
            Some(content) => Ok(ChatMessage::new(Role::Assistant, content)),
            None => Err(CompletionError::Protocol(
                "response carried no message content".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ollama_shape() {
        let body = serde_json::json!({"message": {"content": "hello"}});
        assert_eq!(
            ChatCompletionClient::extract_content(&body).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn extracts_openai_shape() {
        let body = serde_json::json!({"choices": [{"message": {"content": "hi"}}]});
        assert_eq!(
            ChatCompletionClient::extract_content(&body).as_deref(),
            Some("hi")
        );
    }

    #[test]
    fn missing_content_is_none() {
        let body = serde_json::json!({"done": true});
        assert!(ChatCompletionClient::extract_content(&body).is_none());
    }

    #[tokio::test]
    async fn empty_message_list_is_protocol_error() {
        let client = ChatCompletionClient::new_with_endpoint("http://localhost:1/api/chat", "", "m");
        let err = client.send_message(&[]).await.unwrap_err();
        assert_eq!(err.category(), "protocol");
    }
}
