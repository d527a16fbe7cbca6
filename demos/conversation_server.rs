//! Serves the conversation API over HTTP.
//!
//! ```bash
//! cargo run --example conversation_server --features server
//! # then, from another shell:
//! curl -s -X POST localhost:8000/conversations \
//!   -H 'content-type: application/json' \
//!   -d '{"scenario": "a server deal", "agents": [
//!         {"name": "Sarah", "company": "HPE", "role": "Sales Engineer",
//!          "objective": "Sell servers and close the deal"},
//!         {"name": "Yuki", "company": "Toyota", "role": "IT Procurement Manager",
//!          "objective": "Get the best price and terms"}], "max_turns": 10}'
//! curl -N -X POST localhost:8000/conversations/<id>/start
//! ```

use colloquy::config::CompletionConfig;
use colloquy::server::{router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    colloquy::init_logger();

    let app = router(AppState::new(CompletionConfig::from_env()));
    let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
    log::info!("conversation service listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
