pub mod chat;
pub mod http_pool;

pub use chat::ChatCompletionClient;
