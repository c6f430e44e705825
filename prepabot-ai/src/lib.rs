pub mod models;
pub mod provider;
pub mod traits;

// Re-export public APIs
pub use models::CompletionConfig;
pub use provider::OpenAiProvider;
pub use traits::{ChatMessage, ModelProvider};
