use std::collections::HashSet;

use crate::domain::ThreadId;

/// The served set: threads whose subject currently matches the filter.
#[derive(Debug, Default)]
pub struct ThreadCatalog {
    served: HashSet<ThreadId>,
}

impl ThreadCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the thread was not already served.
    pub fn mark_served(&mut self, id: ThreadId) -> bool {
        self.served.insert(id)
    }

    pub fn is_served(&self, id: &ThreadId) -> bool {
        self.served.contains(id)
    }

    pub fn len(&self) -> usize {
        self.served.len()
    }

    pub fn is_empty(&self) -> bool {
        self.served.is_empty()
    }

    /// Drops every served thread absent from this cycle's matches and
    /// returns the evicted ids.
    pub fn evict_missing(&mut self, current: &HashSet<ThreadId>) -> Vec<ThreadId> {
        let evicted: Vec<ThreadId> = self
            .served
            .iter()
            .filter(|id| !current.contains(*id))
            .cloned()
            .collect();
        for id in &evicted {
            self.served.remove(id);
        }
        evicted
    }
}
