use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::models::CompletionConfig;
use crate::traits::{ChatMessage, ModelProvider};

/// OpenAI-compatible provider implementation
pub struct OpenAiProvider {
    config: CompletionConfig,
    client: Client,
}

impl OpenAiProvider {
    /// Create a new provider with the given configuration
    pub fn new(config: CompletionConfig) -> Self {
        let client = Client::new();
        Self { config, client }
    }

    fn api_base(&self) -> String {
        self.config
            .settings
            .api_base
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1".to_string())
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        user_tag: Option<&str>,
    ) -> anyhow::Result<String> {
        let api_base = self.api_base();
        let settings = &self.config.settings;

        let formatted_messages: Vec<serde_json::Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role,
                    "content": msg.content
                })
            })
            .collect();

        let mut request_payload = json!({
            "model": settings.model,
            "messages": formatted_messages,
            "temperature": settings.temperature,
            "top_p": settings.top_p,
            "n": 1,
            "presence_penalty": settings.presence_penalty,
            "frequency_penalty": settings.frequency_penalty,
        });
        if let Some(max_tokens) = settings.max_tokens {
            request_payload["max_tokens"] = json!(max_tokens);
        }
        if let Some(user) = user_tag {
            request_payload["user"] = json!(user);
        }

        tracing::debug!("Making API call to {}/chat/completions", api_base);

        let response = self
            .client
            .post(format!("{}/chat/completions", api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&request_payload)
            .send()
            .await?;

        // Get the raw response text first for better error handling
        let response_text = response.text().await?;
        tracing::trace!("Raw API response: {}", response_text);

        let data = match serde_json::from_str::<serde_json::Value>(&response_text) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to parse API response as JSON: {:?}", e);
                return Err(anyhow::anyhow!("API returned non-JSON response: {}", e));
            }
        };

        if let Some(error) = data.get("error") {
            let error_message = error
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error");
            tracing::error!("API returned error: {}", error_message);
            return Err(anyhow::anyhow!("API error: {}", error_message));
        }

        let choices = match data.get("choices").and_then(|c| c.as_array()) {
            Some(choices) => choices,
            None => {
                tracing::error!("Response missing 'choices' array: {:?}", data);
                return Err(anyhow::anyhow!("Response missing 'choices' array"));
            }
        };

        if choices.is_empty() {
            return Err(anyhow::anyhow!("No completions returned"));
        }

        let message = choices[0]
            .get("message")
            .ok_or_else(|| anyhow::anyhow!("Response choice missing 'message'"))?;

        let content = message
            .get("content")
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("Response message missing 'content'"))?
            .to_string();

        Ok(content)
    }
}
