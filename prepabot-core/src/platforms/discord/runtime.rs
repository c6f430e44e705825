use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    Shard,
    MessageSender,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::request::channel::reaction::RequestReactionType;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::{AllowedMentions, Component, MentionType, Message};
use twilight_model::channel::ChannelType;
use twilight_model::gateway::payload::incoming::{InteractionCreate, MessageCreate, Ready as ReadyPayload};
use twilight_model::id::marker::{ChannelMarker, EmojiMarker, GuildMarker, MessageMarker, UserMarker};
use twilight_model::id::Id;

use prepabot_common::models::{CachedMessage, ReplyReference};
use prepabot_common::Error;

use crate::services::discord::components::happy_birthday_row;
use crate::services::history::MessageFetcher;
use crate::tasks::birthday::BirthdayNotifier;

/// A guild chat message as forwarded out of the shard runner.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message: CachedMessage,
    pub guild_id: Option<u64>,
    pub author_name: String,
    /// Users mentioned in the message body.
    pub mentions: Vec<u64>,
}

/// Gateway events the rest of the bot cares about.
#[derive(Debug)]
pub enum DiscordEvent {
    Ready { bot_user_id: u64 },
    Message(InboundMessage),
    Interaction(Box<InteractionCreate>),
}

/// Map a twilight message into the platform-agnostic cached form.
///
/// The gateway either inlines the parent message (resolved) or gives only
/// its id (unresolved); a deleted parent is indistinguishable from an
/// unresolved one here and surfaces as a failed fetch later.
pub fn to_cached_message(msg: &Message) -> CachedMessage {
    let reference = if let Some(parent) = &msg.referenced_message {
        Some(ReplyReference::Resolved(Box::new(to_cached_message(parent))))
    } else {
        msg.reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| ReplyReference::Unresolved(id.get()))
    };

    CachedMessage {
        id: msg.id.get(),
        channel_id: msg.channel_id.get(),
        author_id: msg.author.id.get(),
        content: msg.content.clone(),
        reference,
    }
}

/// The shard runner:
///   - calls `shard.next_event(...)`
///   - updates the in-memory cache
///   - forwards chat messages and interactions to `tx`.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<DiscordEvent>,
    cache: Arc<InMemoryCache>,
    bot_user_id: Arc<OnceLock<u64>>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);

                match &event {
                    Event::Ready(ready) => {
                        let data: &ReadyPayload = ready.as_ref();
                        info!(
                            "Shard {shard_id} => READY as {} (ID={})",
                            data.user.name, data.user.id
                        );
                        let _ = bot_user_id.set(data.user.id.get());
                        let _ = tx.send(DiscordEvent::Ready {
                            bot_user_id: data.user.id.get(),
                        });
                    }
                    Event::MessageCreate(msg_create) => {
                        let msg: &MessageCreate = msg_create;
                        if msg.author.bot {
                            debug!("Ignoring bot message from {}", msg.author.name);
                            continue;
                        }

                        let _ = tx.send(DiscordEvent::Message(InboundMessage {
                            message: to_cached_message(msg),
                            guild_id: msg.guild_id.map(|g| g.get()),
                            author_name: msg.author.name.clone(),
                            mentions: msg.mentions.iter().map(|m| m.id.get()).collect(),
                        }));
                    }
                    Event::InteractionCreate(inter) => {
                        let _ = tx.send(DiscordEvent::Interaction(inter.clone()));
                    }
                    _ => {
                        trace!("Shard {shard_id} => unhandled event: {event:?}");
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connected,
}

/// Twilight-backed Discord runtime: owns the HTTP client, the gateway
/// shards, and the channel the shard runners feed.
pub struct DiscordPlatform {
    token: String,
    pub connection_status: ConnectionStatus,

    /// Receiver is parked here until `connect` creates it.
    rx: Mutex<Option<UnboundedReceiver<DiscordEvent>>>,

    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,

    bot_user_id: Arc<OnceLock<u64>>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
            bot_user_id: Arc::new(OnceLock::new()),
        }
    }

    /// Set once the first READY arrives.
    pub fn bot_user_id(&self) -> Option<u64> {
        self.bot_user_id.get().copied()
    }

    /// Await the next inbound event, if connected.
    pub async fn next_event(&self) -> Option<DiscordEvent> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }

    pub async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Config("Discord token is empty".into()));
        }

        let (tx, rx) = unbounded_channel::<DiscordEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        // Guild + channel cache feeds the channel-by-name lookups.
        let cache = InMemoryCache::builder()
            .resource_types(ResourceType::GUILD | ResourceType::CHANNEL)
            .build();
        let cache = Arc::new(cache);
        self.cache = Some(cache.clone());

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let cache_for_shard = cache.clone();
            let bot_user_id = self.bot_user_id.clone();

            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, cache_for_shard, bot_user_id).await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();

        {
            let mut guard = self.rx.lock().await;
            *guard = None;
        }

        Ok(())
    }

    fn http(&self) -> Result<&Arc<HttpClient>, Error> {
        self.http
            .as_ref()
            .ok_or_else(|| Error::Platform("Discord HTTP client not connected".into()))
    }

    pub async fn send_message(&self, channel_id: u64, message: &str) -> Result<(), Error> {
        let http = self.http()?;
        http.create_message(Id::<ChannelMarker>::new(channel_id))
            .content(message)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;
        Ok(())
    }

    /// Send a message carrying interactive components.
    pub async fn send_message_with_components(
        &self,
        channel_id: u64,
        message: &str,
        components: &[Component],
    ) -> Result<(), Error> {
        let http = self.http()?;
        http.create_message(Id::<ChannelMarker>::new(channel_id))
            .content(message)
            .components(components)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;
        Ok(())
    }

    /// Reply to a message. Returns the id of the reply so callers can react
    /// to it. `suppress_mentions` sends an empty allowed-mentions set.
    pub async fn reply(
        &self,
        channel_id: u64,
        message_id: u64,
        message: &str,
        suppress_mentions: bool,
    ) -> Result<u64, Error> {
        let http = self.http()?;
        let no_mentions = AllowedMentions::default();

        let mut req = http
            .create_message(Id::<ChannelMarker>::new(channel_id))
            .content(message)
            .reply(Id::<MessageMarker>::new(message_id));
        if suppress_mentions {
            req = req.allowed_mentions(Some(&no_mentions));
        }

        let created = req
            .await
            .map_err(|e| Error::Platform(format!("Error replying to Discord message: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing created message: {e:?}")))?;
        Ok(created.id.get())
    }

    pub async fn add_unicode_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji: &str,
    ) -> Result<(), Error> {
        let http = self.http()?;
        http.create_reaction(
            Id::<ChannelMarker>::new(channel_id),
            Id::<MessageMarker>::new(message_id),
            &RequestReactionType::Unicode { name: emoji },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error adding reaction: {e:?}")))?;
        Ok(())
    }

    pub async fn add_custom_reaction(
        &self,
        channel_id: u64,
        message_id: u64,
        emoji_id: u64,
        emoji_name: &str,
    ) -> Result<(), Error> {
        let http = self.http()?;
        http.create_reaction(
            Id::<ChannelMarker>::new(channel_id),
            Id::<MessageMarker>::new(message_id),
            &RequestReactionType::Custom {
                id: Id::<EmojiMarker>::new(emoji_id),
                name: Some(emoji_name),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error adding reaction: {e:?}")))?;
        Ok(())
    }

    /// Role ids held by a guild member; `Ok(None)` when the member lookup
    /// fails (left the guild, unknown id).
    pub async fn guild_member_roles(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<Vec<u64>>, Error> {
        let http = self.http()?;
        match http
            .guild_member(Id::<GuildMarker>::new(guild_id), Id::<UserMarker>::new(user_id))
            .await
        {
            Ok(resp) => {
                let member = resp
                    .model()
                    .await
                    .map_err(|e| Error::Platform(format!("Error parsing member: {e:?}")))?;
                Ok(Some(member.roles.iter().map(|r| r.get()).collect()))
            }
            Err(e) => {
                debug!("guild member {user_id} lookup failed: {e:?}");
                Ok(None)
            }
        }
    }

    /// The most recent messages of a channel, newest first.
    pub async fn recent_channel_messages(
        &self,
        channel_id: u64,
        limit: u16,
    ) -> Result<Vec<CachedMessage>, Error> {
        let http = self.http()?;
        let messages = http
            .channel_messages(Id::<ChannelMarker>::new(channel_id))
            .limit(limit)
            .await
            .map_err(|e| Error::Platform(format!("Error fetching channel history: {e:?}")))?
            .models()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing channel history: {e:?}")))?;
        Ok(messages.iter().map(to_cached_message).collect())
    }

    /// Cached guild text channels carrying the given name.
    pub fn channels_named(&self, name: &str) -> Vec<u64> {
        let Some(cache) = &self.cache else {
            return Vec::new();
        };
        cache
            .iter()
            .channels()
            .filter(|ch| ch.kind == ChannelType::GuildText && ch.name.as_deref() == Some(name))
            .map(|ch| ch.id.get())
            .collect()
    }

    /// Application id, needed for interaction responses and command
    /// registration.
    pub async fn application_id(&self) -> Result<u64, Error> {
        let http = self.http()?;
        let app = http
            .current_user_application()
            .await
            .map_err(|e| Error::Platform(format!("Error fetching application: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error parsing application: {e:?}")))?;
        Ok(app.id.get())
    }

    /// Allowed-mentions set that pings users only.
    pub fn user_mentions_allowed() -> AllowedMentions {
        AllowedMentions {
            parse: vec![MentionType::Users],
            ..Default::default()
        }
    }
}

#[async_trait]
impl BirthdayNotifier for DiscordPlatform {
    async fn member_roles(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<Vec<u64>>, Error> {
        self.guild_member_roles(guild_id, user_id).await
    }

    async fn send_plain(&self, channel_id: u64, text: &str) -> Result<(), Error> {
        self.send_message(channel_id, text).await
    }

    async fn send_with_button(
        &self,
        channel_id: u64,
        text: &str,
        user_id: u64,
    ) -> Result<(), Error> {
        self.send_message_with_components(channel_id, text, &[happy_birthday_row(user_id)])
            .await
    }
}

#[async_trait]
impl MessageFetcher for DiscordPlatform {
    async fn fetch_message(
        &self,
        channel_id: u64,
        message_id: u64,
    ) -> Result<Option<CachedMessage>, Error> {
        let http = self.http()?;
        match http
            .message(
                Id::<ChannelMarker>::new(channel_id),
                Id::<MessageMarker>::new(message_id),
            )
            .await
        {
            Ok(resp) => {
                let msg = resp
                    .model()
                    .await
                    .map_err(|e| Error::Platform(format!("Error parsing message: {e:?}")))?;
                Ok(Some(to_cached_message(&msg)))
            }
            // NotFound and transport errors both just end the chain.
            Err(e) => {
                debug!("message {message_id} fetch failed: {e:?}");
                Ok(None)
            }
        }
    }
}
