// File: src/services/history.rs

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use prepabot_ai::ChatMessage;
use prepabot_common::models::{CachedMessage, ReplyReference};
use prepabot_common::Error;

use crate::cache::MessageCache;

/// One fetch-by-id against the platform. `Ok(None)` means the message is
/// gone (deleted or never existed), which ends a chain without error.
#[async_trait]
pub trait MessageFetcher: Send + Sync {
    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<Option<CachedMessage>, Error>;
}

/// Walks a reply chain backward and assembles the role-tagged turns sent to
/// the completion API, oldest first.
///
/// The walk is an explicit loop with an accumulator: the hard cap bounds
/// both the payload size and the number of platform round-trips, and a
/// broken link truncates the chain instead of failing the interaction.
pub struct HistoryResolver {
    bot_user_id: u64,
    limit: usize,
    mention_pattern: Regex,
}

impl HistoryResolver {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(bot_user_id: u64, limit: usize) -> Self {
        // The only variable part of the pattern is the numeric id.
        let mention_pattern =
            Regex::new(&format!(r"^<@!?{bot_user_id}> ?")).expect("valid mention pattern");
        Self {
            bot_user_id,
            limit,
            mention_pattern,
        }
    }

    /// Strip one leading mention of the bot (and its trailing space) so the
    /// model does not see the raw mention token.
    pub fn sanitize(&self, content: &str) -> String {
        self.mention_pattern.replace(content, "").into_owned()
    }

    /// Resolve the chain starting at `message`. Messages encountered along
    /// the way are added to the cache; cached parents skip the network.
    pub async fn resolve<F>(
        &self,
        cache: &mut MessageCache,
        fetcher: &F,
        message: CachedMessage,
    ) -> Vec<ChatMessage>
    where
        F: MessageFetcher + ?Sized,
    {
        let mut turns: Vec<ChatMessage> = Vec::new();
        let mut current = message;

        loop {
            if turns.len() >= self.limit {
                break;
            }

            if !cache.contains(current.id) {
                cache.append(current.clone());
            }

            let turn = if current.author_id == self.bot_user_id {
                ChatMessage::assistant(self.sanitize(&current.content))
            } else {
                ChatMessage::user(self.sanitize(&current.content))
            };
            // Walking backward, so prepend to keep chronological order.
            turns.insert(0, turn);

            match current.reference.clone() {
                None => break,
                Some(ReplyReference::Deleted) => break,
                Some(ReplyReference::Resolved(parent)) => {
                    current = *parent;
                }
                Some(ReplyReference::Unresolved(parent_id)) => {
                    if let Some(cached) = cache.get(parent_id) {
                        current = cached.clone();
                        continue;
                    }
                    match fetcher.fetch_message(current.channel_id, parent_id).await {
                        Ok(Some(fetched)) => current = fetched,
                        Ok(None) => {
                            debug!("reply chain ends at missing message {parent_id}");
                            break;
                        }
                        Err(e) => {
                            debug!("reply chain fetch for {parent_id} failed: {e}");
                            break;
                        }
                    }
                }
            }
        }

        turns
    }
}
