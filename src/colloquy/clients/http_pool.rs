//! HTTP client pool for maintaining persistent connections per endpoint.
//!
//! Provides a singleton pool of `reqwest::Client` instances, one per endpoint
//! URL, so that connections, DNS lookups, and TLS handshakes are reused across
//! the many sequential completion calls a conversation makes:
//! - `pool_idle_timeout`: keeps idle connections alive for 90 seconds
//! - `pool_max_idle_per_host`: allows up to 10 idle connections per host
//! - `tcp_keepalive`: sends keepalive packets every 60 seconds
//!
//! Request deadlines are applied per call by the owning client, not here.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<String, reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Get or create a shared HTTP client for the given endpoint URL.
///
/// Each endpoint gets its own client to ensure proper connection pooling.
/// Returns a cloned `reqwest::Client`; clones share the underlying pool.
pub fn get_http_client(endpoint: &str) -> reqwest::Client {
    let mut pool = HTTP_CLIENT_POOL.lock().unwrap();

    if let Some(client) = pool.get(endpoint) {
        return client.clone();
    }

    let client = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .build()
        .expect("Failed to build HTTP client");

    pool.insert(endpoint.to_string(), client.clone());
    client
}
