//! Hand-rolled mock ports shared by the core tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;

use crate::{
    domain::{ChatId, Subscriber, ThreadId, ThreadSummary},
    ports::{BoardPort, DeliveryPort, SendError, SubscriberStore},
    Error, Result,
};

/// Board stub whose index and per-thread images can be rewritten mid-test.
#[derive(Default)]
pub(crate) struct ScriptedBoard {
    pub index: Mutex<Vec<ThreadSummary>>,
    pub images: Mutex<HashMap<ThreadId, Vec<String>>>,
    pub fail_index: Mutex<bool>,
    pub fail_threads: Mutex<HashSet<ThreadId>>,
}

impl ScriptedBoard {
    pub fn set_index(&self, entries: &[(&str, &str)]) {
        *self.index.lock().unwrap() = entries
            .iter()
            .map(|(id, subject)| ThreadSummary {
                id: ThreadId(id.to_string()),
                subject: subject.to_string(),
            })
            .collect();
    }

    pub fn set_images(&self, id: &str, links: &[&str]) {
        self.images.lock().unwrap().insert(
            ThreadId(id.to_string()),
            links.iter().map(|s| s.to_string()).collect(),
        );
    }
}

#[async_trait]
impl BoardPort for ScriptedBoard {
    async fn fetch_index(&self) -> Result<Vec<ThreadSummary>> {
        if *self.fail_index.lock().unwrap() {
            return Err(Error::Board("scripted index failure".to_string()));
        }
        Ok(self.index.lock().unwrap().clone())
    }

    async fn fetch_thread_images(&self, thread: &ThreadId) -> Result<Vec<String>> {
        if self.fail_threads.lock().unwrap().contains(thread) {
            return Err(Error::Board("scripted thread failure".to_string()));
        }
        Ok(self
            .images
            .lock()
            .unwrap()
            .get(thread)
            .cloned()
            .unwrap_or_default())
    }
}

/// Delivery stub recording every successful send; failures scripted per chat.
#[derive(Default)]
pub(crate) struct RecordingDelivery {
    pub sent: Mutex<Vec<(i64, String)>>,
    pub forbidden: Mutex<HashSet<i64>>,
    pub failing: Mutex<HashSet<i64>>,
}

#[async_trait]
impl DeliveryPort for RecordingDelivery {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> std::result::Result<(), SendError> {
        if self.forbidden.lock().unwrap().contains(&chat_id.0) {
            return Err(SendError::Forbidden);
        }
        if self.failing.lock().unwrap().contains(&chat_id.0) {
            return Err(SendError::Other("scripted delivery failure".to_string()));
        }
        self.sent.lock().unwrap().push((chat_id.0, text.to_string()));
        Ok(())
    }
}

/// In-memory store standing in for Postgres.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub subscribers: Mutex<Vec<Subscriber>>,
    pub patterns: Mutex<Vec<String>>,
    pub active_writes: Mutex<Vec<(i64, bool)>>,
}

#[async_trait]
impl SubscriberStore for MemoryStore {
    async fn load_subscribers(&self) -> Result<Vec<Subscriber>> {
        Ok(self.subscribers.lock().unwrap().clone())
    }

    async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        self.subscribers.lock().unwrap().push(subscriber.clone());
        Ok(())
    }

    async fn set_active(&self, chat_id: ChatId, active: bool) -> Result<()> {
        self.active_writes.lock().unwrap().push((chat_id.0, active));
        Ok(())
    }

    async fn load_patterns(&self) -> Result<Vec<String>> {
        Ok(self.patterns.lock().unwrap().clone())
    }
}

pub(crate) fn subscriber(chat_id: i64, active: bool) -> Subscriber {
    Subscriber {
        chat_id: ChatId(chat_id),
        username: format!("user{chat_id}"),
        is_active: active,
        has_blocked_bot: false,
    }
}
