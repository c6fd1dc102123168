//! Recently relayed message texts per task, for the duplicate check

use dashmap::DashMap;
use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

/// How many texts are remembered per task
pub const RECENT_PER_TASK: usize = 200;

/// Bounded per-task memory of message fingerprints.
#[derive(Debug)]
pub struct RecentMessages {
    capacity: usize,
    seen: DashMap<i64, VecDeque<u64>>,
}

impl Default for RecentMessages {
    fn default() -> Self {
        Self::with_capacity(RECENT_PER_TASK)
    }
}

impl RecentMessages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            seen: DashMap::new(),
        }
    }

    /// Records `text` for the task and reports whether it was already there.
    /// Blank texts are never duplicates.
    pub fn check_and_record(&self, task_id: i64, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let fingerprint = fingerprint(text);

        let mut recent = self.seen.entry(task_id).or_default();
        if recent.contains(&fingerprint) {
            return true;
        }
        if recent.len() == self.capacity {
            recent.pop_front();
        }
        recent.push_back(fingerprint);
        false
    }
}

fn fingerprint(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicates_are_per_task() {
        let recent = RecentMessages::new();
        assert!(!recent.check_and_record(1, "hello"));
        assert!(recent.check_and_record(1, " hello "));
        assert!(!recent.check_and_record(2, "hello"));
        assert!(!recent.check_and_record(1, ""));
        assert!(!recent.check_and_record(1, ""));
    }

    #[test]
    fn test_oldest_fingerprint_is_evicted() {
        let recent = RecentMessages::with_capacity(2);
        recent.check_and_record(1, "a");
        recent.check_and_record(1, "b");
        recent.check_and_record(1, "c");
        assert!(!recent.check_and_record(1, "a"));
        assert!(recent.check_and_record(1, "c"));
    }
}
