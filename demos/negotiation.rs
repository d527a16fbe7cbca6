//! Streams a simulated sales negotiation between three model-backed agents.
//!
//! Point `LLM_API_ENDPOINT` / `DEFAULT_MODEL` at a chat endpoint (a local
//! Ollama works) and run:
//!
//! ```bash
//! LLM_API_ENDPOINT=http://localhost:11434/api/chat DEFAULT_MODEL=llama3.1 \
//!     cargo run --example negotiation
//! ```

use colloquy::clients::chat::ChatCompletionClient;
use colloquy::config::CompletionConfig;
use colloquy::{Agent, Conversation, ModelAgent, Persona};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    colloquy::init_logger();

    let config = CompletionConfig::from_env();
    let client: Arc<ChatCompletionClient> = Arc::new(ChatCompletionClient::new(&config));

    let agents = vec![
        Agent::Model(ModelAgent::new(
            Persona::new(
                "Sarah",
                "HPE",
                "Sales Engineer",
                "Sell servers and close the deal",
            ),
            client.clone(),
        )),
        Agent::Model(ModelAgent::new(
            Persona::new(
                "Yuki",
                "Toyota",
                "IT Procurement Manager",
                "Get the best price and terms",
            ),
            client.clone(),
        )),
        Agent::Model(ModelAgent::new(
            Persona::new(
                "Marcus",
                "Toyota",
                "Technical Lead",
                "Ensure technical requirements are met",
            ),
            client,
        )),
    ];

    let mut conversation = Conversation::new(
        agents,
        colloquy::config::max_turns_from_env(),
        "Let's discuss: a server upgrade for the Nagoya data center",
    )?;

    let seed = conversation.seed_message();
    println!("[seed] {}: {}", seed.agent, seed.message);

    let mut stream = conversation.stream();
    while let Some(message) = stream.next().await {
        let message = message?;
        println!(
            "[turn {}] {} ({}): {}",
            message.turn, message.agent, message.company, message.message
        );
    }
    drop(stream);

    println!(
        "-- conversation {:?} after {} turns",
        conversation.status(),
        conversation.turns_taken()
    );
    Ok(())
}
