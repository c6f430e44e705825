use prepabot_common::config::CompletionSettings;
use serde::{Deserialize, Serialize};

/// Configuration for a completion provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// API key for authentication
    pub api_key: String,

    /// Model identifier and sampling parameters, as configured.
    #[serde(flatten)]
    pub settings: CompletionSettings,
}

impl CompletionConfig {
    pub fn new(api_key: impl Into<String>, settings: CompletionSettings) -> Self {
        Self { api_key: api_key.into(), settings }
    }
}
