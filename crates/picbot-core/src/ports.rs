use async_trait::async_trait;

use crate::{
    domain::{ChatId, Subscriber, ThreadId, ThreadSummary},
    Result,
};

/// Read side of the board's JSON API.
#[async_trait]
pub trait BoardPort: Send + Sync {
    /// The board's thread index: id + subject per thread.
    async fn fetch_index(&self) -> Result<Vec<ThreadSummary>>;

    /// Absolute image links attached to the posts of one thread.
    async fn fetch_thread_images(&self, thread: &ThreadId) -> Result<Vec<String>>;
}

/// Classified delivery failure. The dispatch loop branches on this, so it is
/// a dedicated type rather than a variant of the generic error.
#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// The recipient forbids the bot (blocked it, deactivated, kicked it).
    #[error("recipient forbids bot")]
    Forbidden,

    #[error("delivery failed: {0}")]
    Other(String),
}

/// Outbound message transport (Telegram in production).
#[async_trait]
pub trait DeliveryPort: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> std::result::Result<(), SendError>;
}

/// Persistent storage for subscribers and filter patterns.
///
/// Called outside the hot loops only: at startup and from the periodic
/// refresh / command paths.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    async fn load_subscribers(&self) -> Result<Vec<Subscriber>>;
    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()>;
    async fn set_active(&self, chat_id: ChatId, active: bool) -> Result<()>;
    async fn load_patterns(&self) -> Result<Vec<String>>;
}
