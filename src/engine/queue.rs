use super::cache::ResultCache;
use std::collections::HashSet;

/// Deduplicating buffer of texts waiting for the next batch.
#[derive(Debug, Default)]
pub struct PendingQueue {
    order: Vec<String>,
    members: HashSet<String>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `text` unless it is already queued or already resolved in `cache`.
    ///
    /// Returns `true` when the text was added.
    pub fn add(&mut self, text: &str, cache: &ResultCache) -> bool {
        if self.members.contains(text) || cache.contains(text) {
            return false;
        }
        self.members.insert(text.to_string());
        self.order.push(text.to_string());
        true
    }

    /// Take every queued text in insertion order, leaving the queue empty.
    pub fn drain_all(&mut self) -> Vec<String> {
        self.members.clear();
        std::mem::take(&mut self.order)
    }

    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
