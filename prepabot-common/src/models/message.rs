/// Single cached chat message. Lives only inside the bounded cache,
/// never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedMessage {
    pub id: u64,
    pub channel_id: u64,
    pub author_id: u64,
    pub content: String,
    pub reference: Option<ReplyReference>,
}

/// What a message's "replying to" link points at.
///
/// The gateway hands us either the parent message inline or just its id;
/// `Deleted` marks a parent known to be gone, which ends a chain walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyReference {
    Resolved(Box<CachedMessage>),
    Deleted,
    Unresolved(u64),
}

impl CachedMessage {
    /// Author id of the resolved parent, if the gateway supplied one.
    pub fn resolved_parent_author(&self) -> Option<u64> {
        match &self.reference {
            Some(ReplyReference::Resolved(parent)) => Some(parent.author_id),
            _ => None,
        }
    }
}
