use std::collections::HashMap;

use crate::domain::ThreadId;

/// Dedup bookkeeping for image links: what discovery has seen, and what has
/// already been handed to dispatch. URL equality is image identity.
#[derive(Debug, Default)]
pub struct ImageLedger {
    discovered: HashMap<String, ThreadId>,
    sent: HashMap<String, ThreadId>,
}

impl ImageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a discovered link, overwriting a stale thread association.
    pub fn record_discovered(&mut self, link: String, thread: ThreadId) {
        self.discovered.insert(link, thread);
    }

    /// Links discovered but not yet handed to dispatch.
    pub fn unsent(&self) -> Vec<(String, ThreadId)> {
        self.discovered
            .iter()
            .filter(|(link, _)| !self.sent.contains_key(*link))
            .map(|(link, thread)| (link.clone(), thread.clone()))
            .collect()
    }

    /// Marks a link as handed off. Returns false if it already was.
    pub fn mark_sent(&mut self, link: String, thread: ThreadId) -> bool {
        self.sent.insert(link, thread).is_none()
    }

    pub fn is_sent(&self, link: &str) -> bool {
        self.sent.contains_key(link)
    }

    /// Drops both mappings. Runs on thread eviction; every link becomes
    /// eligible for delivery again once re-discovered.
    pub fn clear(&mut self) {
        self.discovered.clear();
        self.sent.clear();
    }
}
