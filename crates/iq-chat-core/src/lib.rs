pub mod api;
pub mod config;
pub mod error;
pub mod session;
pub mod state;

// Re-export main types for convenience
pub use api::{ApiClient, ChatBackend, ChatReply, ChatRequest};
pub use config::{Config, DEFAULT_API_URL};
pub use error::RequestFailed;
pub use session::Conversation;
pub use state::{ChatMessage, ChatRole, Citation, ERROR_REPLY};
