// File: src/cache/message_cache.rs

use std::collections::VecDeque;

use prepabot_common::models::CachedMessage;

/// Bounded, insertion-ordered store of recently seen messages.
///
/// Capacity is fixed at construction; appending to a full cache evicts the
/// oldest entry first. Lookup is a linear scan, which is fine at this size.
/// Owned by a single task, so no locking.
pub struct MessageCache {
    entries: VecDeque<CachedMessage>,
    capacity: usize,
}

impl MessageCache {
    pub const DEFAULT_CAPACITY: usize = 100;

    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append to the back, evicting the front entry when full.
    pub fn append(&mut self, message: CachedMessage) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(message);
    }

    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: u64) -> Option<&CachedMessage> {
        self.entries.iter().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CachedMessage> {
        self.entries.iter()
    }

    pub fn get_index(&self, index: usize) -> Option<&CachedMessage> {
        self.entries.get(index)
    }
}

impl Default for MessageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}
