// File: prepabot-core/tests/history_tests.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use prepabot_common::models::{CachedMessage, ReplyReference};
use prepabot_common::Error;
use prepabot_core::cache::MessageCache;
use prepabot_core::services::{HistoryResolver, MessageFetcher};

const BOT_ID: u64 = 999;

/// In-memory fetcher standing in for the platform, counting its calls.
#[derive(Default)]
struct MockFetcher {
    messages: HashMap<u64, CachedMessage>,
    calls: AtomicUsize,
}

impl MockFetcher {
    fn with(messages: Vec<CachedMessage>) -> Self {
        Self {
            messages: messages.into_iter().map(|m| (m.id, m)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageFetcher for MockFetcher {
    async fn fetch_message(
        &self,
        _channel_id: u64,
        message_id: u64,
    ) -> Result<Option<CachedMessage>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.messages.get(&message_id).cloned())
    }
}

fn msg(id: u64, author_id: u64, content: &str, reference: Option<ReplyReference>) -> CachedMessage {
    CachedMessage {
        id,
        channel_id: 1,
        author_id,
        content: content.to_string(),
        reference,
    }
}

#[tokio::test]
async fn message_without_reference_yields_one_sanitized_turn() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    let fetcher = MockFetcher::default();

    let trigger = msg(1, 42, &format!("<@!{BOT_ID}> hello"), None);
    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, "user");
    assert_eq!(turns[0].content, "hello");
    assert_eq!(fetcher.call_count(), 0);
    // The trigger itself landed in the cache.
    assert!(cache.contains(1));
}

#[tokio::test]
async fn cached_chain_resolves_oldest_first_without_fetching() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    let fetcher = MockFetcher::default();

    // C replies to B, B replies to A.
    let a = msg(1, 42, "A", None);
    let b = msg(2, BOT_ID, "B", Some(ReplyReference::Unresolved(1)));
    let c = msg(3, 42, "C", Some(ReplyReference::Unresolved(2)));
    cache.append(a);
    cache.append(b);

    let turns = resolver.resolve(&mut cache, &fetcher, c).await;

    let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents, vec!["A", "B", "C"]);
    let roles: Vec<&str> = turns.iter().map(|t| t.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "user"]);
    assert_eq!(fetcher.call_count(), 0, "cached parents skip the network");
}

#[tokio::test]
async fn resolved_parents_are_walked_inline() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    let fetcher = MockFetcher::default();

    let parent = msg(1, BOT_ID, "earlier answer", None);
    let trigger = msg(
        2,
        42,
        "follow-up",
        Some(ReplyReference::Resolved(Box::new(parent))),
    );

    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "earlier answer");
    assert_eq!(turns[0].role, "assistant");
    assert_eq!(fetcher.call_count(), 0);
    assert!(cache.contains(1) && cache.contains(2));
}

#[tokio::test]
async fn uncached_parent_is_fetched_once() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    let fetcher = MockFetcher::with(vec![msg(1, 42, "root", None)]);

    let trigger = msg(2, 42, "reply", Some(ReplyReference::Unresolved(1)));
    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].content, "root");
    assert_eq!(fetcher.call_count(), 1);
    assert!(cache.contains(1), "fetched parent joins the cache");
}

#[tokio::test]
async fn deleted_parent_truncates_the_chain_silently() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    let fetcher = MockFetcher::default();

    let trigger = msg(2, 42, "reply to nothing", Some(ReplyReference::Deleted));
    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].content, "reply to nothing");
}

#[tokio::test]
async fn missing_parent_truncates_the_chain_silently() {
    let resolver = HistoryResolver::new(BOT_ID, 10);
    let mut cache = MessageCache::new(100);
    // Fetcher knows nothing: every fetch comes back empty.
    let fetcher = MockFetcher::default();

    let trigger = msg(2, 42, "reply", Some(ReplyReference::Unresolved(1)));
    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].content, "reply");
    assert_eq!(fetcher.call_count(), 1);
}

#[tokio::test]
async fn chain_is_capped_at_the_turn_limit() {
    let limit = 10;
    let resolver = HistoryResolver::new(BOT_ID, limit);
    let mut cache = MessageCache::new(100);

    // 25-deep chain: message i replies to i-1.
    let mut messages = vec![msg(1, 42, "m1", None)];
    for id in 2..=25 {
        messages.push(msg(id, 42, &format!("m{id}"), Some(ReplyReference::Unresolved(id - 1))));
    }
    let trigger = messages.pop().unwrap();
    let fetcher = MockFetcher::with(messages);

    let turns = resolver.resolve(&mut cache, &fetcher, trigger).await;

    assert_eq!(turns.len(), limit);
    // The cap keeps the most recent turns, chronological order preserved.
    let contents: Vec<&str> = turns.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(contents.last(), Some(&"m25"));
    assert_eq!(contents.first(), Some(&"m16"));
}
