use std::fmt;

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Board thread id. Numeric on the wire, carried as a string because it is
/// only ever compared and interpolated into URLs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ThreadId(pub String);

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row from the board's thread index. The subject is consulted only at
/// match time and not stored beyond the matching decision.
#[derive(Clone, Debug)]
pub struct ThreadSummary {
    pub id: ThreadId,
    pub subject: String,
}

/// Payload passed from the discovery loop to the dispatch loop through the
/// bounded channel. Not persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageMessage {
    pub link: String,
    pub thread: ThreadId,
}

/// A chat receiving forwarded images.
///
/// `has_blocked_bot` is in-memory only: set by a forbidden delivery outcome,
/// never persisted and never reset automatically.
#[derive(Clone, Debug)]
pub struct Subscriber {
    pub chat_id: ChatId,
    pub username: String,
    pub is_active: bool,
    pub has_blocked_bot: bool,
}

impl Subscriber {
    pub fn eligible(&self) -> bool {
        self.is_active && !self.has_blocked_bot
    }
}
