pub mod analyzer;
pub mod config;
pub mod controller;
pub mod conversation;
pub mod error;
pub mod prompts;
pub mod repo_url;
pub mod state;

// Re-export main types for convenience
pub use analyzer::{
    AnalyzerApi, AnalyzerClient, AnalyzerHandle, Answer, HttpAnalyzerApi, PollSchedule, QueryHandle,
};
pub use config::Config;
pub use controller::Controller;
pub use conversation::{Conversation, ConversationPhase};
pub use error::{AnalyzerError, TransportError, ValidationError};
pub use repo_url::RepoUrl;
pub use state::{ChatMessage, ChatRole, MessageStore};
