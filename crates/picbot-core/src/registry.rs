use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;
use tracing::info;

use crate::{
    domain::{ChatId, Subscriber},
    ports::SubscriberStore,
    Result,
};

/// Working copy of the persisted subscriber list.
///
/// Shared between the dispatch loop (snapshot reads, block marking) and the
/// command router (activation changes). A single coarse lock covers the map;
/// store calls happen outside it. The pipeline never deletes subscribers.
pub struct SubscriberRegistry {
    store: Arc<dyn SubscriberStore>,
    subscribers: Mutex<HashMap<i64, Subscriber>>,
}

impl SubscriberRegistry {
    pub fn new(store: Arc<dyn SubscriberStore>) -> Self {
        Self {
            store,
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Replaces the working copy with the persisted list.
    pub async fn load_from_store(&self) -> Result<()> {
        let loaded = self.store.load_subscribers().await?;
        let mut map = self.subscribers.lock().await;
        map.clear();
        for subscriber in loaded {
            map.insert(subscriber.chat_id.0, subscriber);
        }
        info!(count = map.len(), "subscribers loaded");
        Ok(())
    }

    pub async fn lookup(&self, chat_id: ChatId) -> Option<Subscriber> {
        self.subscribers.lock().await.get(&chat_id.0).cloned()
    }

    /// Snapshot used for fan-out. Iteration order is not stable across
    /// registry mutation, and does not need to be.
    pub async fn snapshot(&self) -> Vec<Subscriber> {
        self.subscribers.lock().await.values().cloned().collect()
    }

    /// Inserts an inactive subscriber on first contact and writes it
    /// through to the store. Returns true if the chat was new.
    pub async fn register(&self, chat_id: ChatId, username: &str) -> Result<bool> {
        let subscriber = Subscriber {
            chat_id,
            username: username.to_string(),
            is_active: false,
            has_blocked_bot: false,
        };

        {
            let mut map = self.subscribers.lock().await;
            if map.contains_key(&chat_id.0) {
                return Ok(false);
            }
            map.insert(chat_id.0, subscriber.clone());
        }

        self.store.insert_subscriber(&subscriber).await?;
        Ok(true)
    }

    /// Flips the active flag and writes through to the store.
    pub async fn set_active(&self, chat_id: ChatId, active: bool) -> Result<()> {
        {
            let mut map = self.subscribers.lock().await;
            if let Some(subscriber) = map.get_mut(&chat_id.0) {
                subscriber.is_active = active;
            }
        }
        self.store.set_active(chat_id, active).await
    }

    /// Excludes a chat from all future fan-outs. In-memory only; cleared by
    /// a restart or an explicit reactivation.
    pub async fn mark_blocked(&self, chat_id: ChatId) {
        let mut map = self.subscribers.lock().await;
        if let Some(subscriber) = map.get_mut(&chat_id.0) {
            subscriber.has_blocked_bot = true;
        }
    }
}
