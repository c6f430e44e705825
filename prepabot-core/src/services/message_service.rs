// File: src/services/message_service.rs

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use rand::seq::IndexedRandom;
use rand::Rng;
use tracing::{error, warn};

use prepabot_ai::{ChatMessage, ModelProvider};
use prepabot_common::config::BotConfig;
use prepabot_common::Error;

use crate::cache::MessageCache;
use crate::persons::PersonStore;
use crate::platforms::discord::InboundMessage;
use crate::platforms::DiscordPlatform;
use crate::services::history::HistoryResolver;

const PROVOCATIONS: [&str; 2] = ["tu veux te battre", "vous voulez vous battre"];

/// Reacts to every guild message: completion replies when the bot is
/// addressed, plus the canned emoji behaviors.
///
/// Owns the message cache; only this service's task ever touches it.
pub struct MessageService {
    platform: Arc<DiscordPlatform>,
    provider: Option<Arc<dyn ModelProvider>>,
    persons: Arc<PersonStore>,
    config: Arc<BotConfig>,
    timezone: Tz,

    cache: MessageCache,
    resolver: Option<HistoryResolver>,
}

impl MessageService {
    pub fn new(
        platform: Arc<DiscordPlatform>,
        provider: Option<Arc<dyn ModelProvider>>,
        persons: Arc<PersonStore>,
        config: Arc<BotConfig>,
        timezone: Tz,
    ) -> Self {
        let cache = MessageCache::new(config.cache_capacity);
        Self {
            platform,
            provider,
            persons,
            config,
            timezone,
            cache,
            resolver: None,
        }
    }

    /// The resolver needs the bot's own id, which only READY reveals.
    pub fn on_ready(&mut self, bot_user_id: u64) {
        if self.resolver.is_none() {
            self.resolver = Some(HistoryResolver::new(bot_user_id, self.config.history_limit));
        }
    }

    pub async fn handle_message(&mut self, inbound: InboundMessage) {
        if inbound.guild_id != Some(self.config.guild_id) {
            return;
        }
        let Some(bot_id) = self.platform.bot_user_id() else {
            return;
        };
        if inbound.message.author_id == bot_id {
            return;
        }

        if self.provider.is_some() && self.is_addressed_to_bot(&inbound, bot_id) {
            if let Err(e) = self.dispatch_completion(&inbound).await {
                // One failed interaction; the next message gets a fresh try.
                error!("completion dispatch failed: {e}");
            }
        }

        self.apply_canned_reactions(&inbound).await;
    }

    /// Mentioned directly, or replying to one of the bot's own messages.
    fn is_addressed_to_bot(&self, inbound: &InboundMessage, bot_id: u64) -> bool {
        inbound.mentions.contains(&bot_id)
            || inbound.message.resolved_parent_author() == Some(bot_id)
    }

    async fn dispatch_completion(&mut self, inbound: &InboundMessage) -> Result<(), Error> {
        let (Some(provider), Some(resolver)) = (&self.provider, &self.resolver) else {
            return Ok(());
        };

        let mut messages: Vec<ChatMessage> = Vec::new();

        if let Some(prompt) = &self.config.persona_prompt {
            if roll_one_in(self.config.persona_one_in) {
                messages.push(ChatMessage::system(prompt.clone()));
            }
        }

        let username = self
            .persons
            .get(inbound.message.author_id)
            .map(|p| p.first_name.clone())
            .unwrap_or_else(|| inbound.author_name.clone());
        messages.push(ChatMessage::system(format!("The user is called {username}.")));

        let history = resolver
            .resolve(&mut self.cache, self.platform.as_ref(), inbound.message.clone())
            .await;
        messages.extend(history);

        let response = provider
            .chat(messages, Some(username.as_str()))
            .await
            .map_err(|e| Error::Completion(e.to_string()))?;

        self.platform
            .reply(inbound.message.channel_id, inbound.message.id, &response, false)
            .await?;
        Ok(())
    }

    async fn apply_canned_reactions(&self, inbound: &InboundMessage) {
        let channel_id = inbound.message.channel_id;
        let message_id = inbound.message.id;
        let content = inbound.message.content.to_lowercase();

        let today = Utc::now().with_timezone(&self.timezone).date_naive();
        if self.persons.is_birthday(inbound.message.author_id, today) {
            self.react_unicode(channel_id, message_id, "🎉").await;
        }

        if content.contains("cqfd") {
            if let Some(emoji) = &self.config.prof_emoji {
                if let Err(e) = self
                    .platform
                    .add_custom_reaction(channel_id, message_id, emoji.id, &emoji.name)
                    .await
                {
                    warn!("cqfd reaction failed: {e}");
                }
            }
        }

        if PROVOCATIONS.iter().any(|p| content.contains(p)) {
            self.react_unicode(channel_id, message_id, "⭕").await;
            self.react_unicode(channel_id, message_id, "🇺").await;
            self.react_unicode(channel_id, message_id, "🇮").await;
        }

        let rule = self
            .config
            .user_reactions
            .iter()
            .find(|r| r.user_id == inbound.message.author_id);
        if let Some(rule) = rule {
            let triggered = rule.triggers.iter().any(|t| content.contains(t.as_str()));
            if triggered || roll_one_in(self.config.reaction_one_in) {
                if let Some(emoji) = rule.emojis.choose(&mut rand::rng()) {
                    self.react_unicode(channel_id, message_id, emoji).await;
                }
            }
        }
    }

    async fn react_unicode(&self, channel_id: u64, message_id: u64, emoji: &str) {
        if let Err(e) = self
            .platform
            .add_unicode_reaction(channel_id, message_id, emoji)
            .await
        {
            warn!("reaction {emoji} failed: {e}");
        }
    }
}

fn roll_one_in(denominator: u32) -> bool {
    if denominator <= 1 {
        return true;
    }
    rand::rng().random_range(0..denominator) == 0
}
