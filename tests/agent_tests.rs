use async_trait::async_trait;
use chrono::Utc;
use colloquy::client_wrapper::{ChatMessage, ClientWrapper, CompletionError, Role};
use colloquy::{AgentError, ModelAgent, Persona, TurnMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Records every message list it is asked to complete.
struct RecordingClient {
    reply: String,
    requests: Mutex<Vec<Vec<(Role, String)>>>,
}

impl RecordingClient {
    fn new(reply: &str) -> Self {
        RecordingClient {
            reply: reply.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ClientWrapper for RecordingClient {
    async fn send_message(&self, messages: &[ChatMessage]) -> Result<ChatMessage, CompletionError> {
        self.requests.lock().await.push(
            messages
                .iter()
                .map(|m| (m.role, m.content.clone()))
                .collect(),
        );
        Ok(ChatMessage::new(Role::Assistant, self.reply.clone()))
    }

    fn model_name(&self) -> &str {
        "recording"
    }
}

fn turn(turn: usize, agent: &str, message: &str) -> TurnMessage {
    TurnMessage {
        turn,
        agent: agent.to_string(),
        company: "Acme".to_string(),
        role: "Negotiator".to_string(),
        message: message.to_string(),
        timestamp: Utc::now(),
        generation_time: if turn == 0 { None } else { Some(0.5) },
    }
}

#[tokio::test]
async fn prompt_starts_with_the_persona_system_message() {
    let client = Arc::new(RecordingClient::new("Understood."));
    let agent = ModelAgent::new(
        Persona::new("Yuki", "Toyota", "IT Procurement Manager", "Get the best price"),
        client.clone(),
    );

    agent
        .respond(&[turn(0, "Sarah", "Let's discuss: servers")])
        .await
        .unwrap();

    let requests = client.requests.lock().await;
    let request = &requests[0];
    assert_eq!(request[0].0, Role::System);
    assert!(request[0]
        .1
        .contains("You are Yuki, a IT Procurement Manager at Toyota."));
    assert!(request[0].1.contains("Your objective: Get the best price"));
}

#[tokio::test]
async fn history_is_tagged_from_the_agents_point_of_view() {
    let client = Arc::new(RecordingClient::new("Noted."));
    let agent = ModelAgent::new(
        Persona::new("Yuki", "Toyota", "Procurement", "Best price"),
        client.clone(),
    );

    let history = vec![
        turn(0, "Sarah", "Let's discuss: servers"),
        turn(1, "Yuki", "What discounts are on the table?"),
        turn(2, "Sarah", "Ten percent for a three year term."),
    ];
    agent.respond(&history).await.unwrap();

    let requests = client.requests.lock().await;
    let request = &requests[0];
    // system + three history entries, in order
    assert_eq!(request.len(), 4);
    assert_eq!(request[1].0, Role::User);
    assert_eq!(request[1].1, "Let's discuss: servers");
    assert_eq!(request[2].0, Role::Assistant);
    assert_eq!(request[2].1, "What discounts are on the table?");
    assert_eq!(request[3].0, Role::User);
}

#[tokio::test]
async fn reply_text_is_trimmed_and_latency_measured() {
    struct SlowClient;

    #[async_trait]
    impl ClientWrapper for SlowClient {
        async fn send_message(
            &self,
            _messages: &[ChatMessage],
        ) -> Result<ChatMessage, CompletionError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(ChatMessage::new(Role::Assistant, "  A fine offer.  "))
        }

        fn model_name(&self) -> &str {
            "slow"
        }
    }

    let agent = ModelAgent::new(
        Persona::new("Sarah", "HPE", "Sales Engineer", "Close the deal"),
        Arc::new(SlowClient),
    );

    let (text, latency) = agent.respond(&[turn(0, "Yuki", "Hello")]).await.unwrap();
    assert_eq!(text, "A fine offer.");
    assert!(latency >= Duration::from_millis(20));
}

#[tokio::test]
async fn empty_reply_is_a_protocol_failure() {
    let client = Arc::new(RecordingClient::new("   "));
    let agent = ModelAgent::new(
        Persona::new("Sarah", "HPE", "Sales Engineer", "Close the deal"),
        client,
    );

    let err = agent
        .respond(&[turn(0, "Yuki", "Hello")])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AgentError::Completion(CompletionError::Protocol(_))
    ));
    assert_eq!(err.category(), "protocol");
}

#[tokio::test]
async fn completion_failures_propagate_unchanged() {
    struct FailingClient;

    #[async_trait]
    impl ClientWrapper for FailingClient {
        async fn send_message(
            &self,
            _messages: &[ChatMessage],
        ) -> Result<ChatMessage, CompletionError> {
            Err(CompletionError::Timeout)
        }

        fn model_name(&self) -> &str {
            "failing"
        }
    }

    let agent = ModelAgent::new(
        Persona::new("Sarah", "HPE", "Sales Engineer", "Close the deal"),
        Arc::new(FailingClient),
    );

    let err = agent
        .respond(&[turn(0, "Yuki", "Hello")])
        .await
        .unwrap_err();
    assert_eq!(err, AgentError::Completion(CompletionError::Timeout));
}

#[test]
fn model_identifier_comes_from_the_client() {
    let agent = ModelAgent::new(
        Persona::new("Sarah", "HPE", "Sales Engineer", "Close the deal"),
        Arc::new(RecordingClient::new("hi")),
    );
    assert_eq!(agent.model(), "recording");
}
