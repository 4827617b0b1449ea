//! Deadline scheduler.
//!
//! "Wait N seconds then resume" control flow is modeled as an entry keyed by
//! an absolute epoch-ms deadline, checked once per tick. Cancellation is
//! removing the entry - the deferred effect simply never runs, which is what
//! teardown needs to leave persisted state recoverable.

/// Keyed set of absolute deadlines.
pub struct DeadlineScheduler<K> {
    entries: Vec<(K, i64)>,
}

impl<K: PartialEq + Copy> DeadlineScheduler<K> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Schedule `key` at `deadline_ms`, replacing any existing entry for it.
    pub fn schedule(&mut self, key: K, deadline_ms: i64) {
        self.cancel(key);
        self.entries.push((key, deadline_ms));
    }

    /// Remove the entry for `key`, if any. Its effect never runs.
    pub fn cancel(&mut self, key: K) {
        self.entries.retain(|(k, _)| *k != key);
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_scheduled(&self, key: K) -> bool {
        self.entries.iter().any(|(k, _)| *k == key)
    }

    /// Remove and return every key whose deadline has passed, in deadline
    /// order.
    pub fn drain_due(&mut self, now_ms: i64) -> Vec<K> {
        let mut due: Vec<(K, i64)> = Vec::new();
        self.entries.retain(|(k, deadline)| {
            if *deadline <= now_ms {
                due.push((*k, *deadline));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(_, deadline)| *deadline);
        due.into_iter().map(|(k, _)| k).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: PartialEq + Copy> Default for DeadlineScheduler<K> {
    fn default() -> Self {
        Self::new()
    }
}
