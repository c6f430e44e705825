use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One role-tagged unit of conversational text sent to the completion API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Trait for AI model providers
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Name of the provider
    fn name(&self) -> &str;

    /// Chat completion over an ordered turn list, oldest first. Returns the
    /// single response choice; `user_tag` is forwarded for abuse tracking.
    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        user_tag: Option<&str>,
    ) -> anyhow::Result<String>;
}
