//! Bounded task history (`SPEC_FULL.md`'s supplemented `TaskHistory`
//! accessor): every parent task's final [`OrchestrationResult`], kept
//! up to a fixed capacity so a long-running orchestrator's memory
//! usage does not grow without bound.

use std::collections::VecDeque;
use std::sync::Mutex;

use orchestra_primitives::TaskId;

use crate::aggregate::OrchestrationResult;

/// Maximum number of entries [`TaskHistory`] retains before evicting
/// the oldest.
pub const HISTORY_CAPACITY: usize = 256;

/// One retained history entry: the result plus when it was recorded,
/// expressed as a monotonically increasing sequence number rather than
/// a wall-clock timestamp (this crate may not call `Instant::now`/`SystemTime::now`
/// freely here since history entries must stay deterministic for replay
/// in tests that construct an `Orchestrator` and drive it by hand).
#[derive(Clone, Debug)]
pub struct TaskHistoryEntry {
    /// Monotonically increasing sequence number assigned at insertion.
    pub sequence: u64,
    /// The recorded outcome.
    pub result: OrchestrationResult,
}

/// A fixed-capacity, FIFO-eviction ring buffer of recent task outcomes.
#[derive(Default)]
pub struct TaskHistory {
    entries: Mutex<VecDeque<TaskHistoryEntry>>,
    next_sequence: Mutex<u64>,
}

impl TaskHistory {
    /// Builds an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(HISTORY_CAPACITY)),
            next_sequence: Mutex::new(0),
        }
    }

    /// Records `result`, evicting the oldest entry if the history is at
    /// [`HISTORY_CAPACITY`].
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    pub fn record(&self, result: OrchestrationResult) {
        let mut sequence = self.next_sequence.lock().expect("history sequence lock poisoned");
        let entry = TaskHistoryEntry {
            sequence: *sequence,
            result,
        };
        *sequence += 1;
        drop(sequence);

        let mut entries = self.entries.lock().expect("history lock poisoned");
        if entries.len() == HISTORY_CAPACITY {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Returns every retained entry for `task_id`, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn for_task(&self, task_id: &TaskId) -> Vec<TaskHistoryEntry> {
        self.entries
            .lock()
            .expect("history lock poisoned")
            .iter()
            .filter(|entry| &entry.result.task_id == task_id)
            .cloned()
            .collect()
    }

    /// Returns the `limit` most recently recorded entries, newest first.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<TaskHistoryEntry> {
        self.entries
            .lock()
            .expect("history lock poisoned")
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    /// Number of entries currently retained.
    ///
    /// # Panics
    ///
    /// Panics if an internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().expect("history lock poisoned").len()
    }

    /// Returns `true` if no entries are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, OrchestrationStatus};
    use std::collections::HashMap;

    fn result_for(task_id: &str) -> OrchestrationResult {
        aggregate(TaskId::new(task_id).unwrap(), HashMap::new(), Vec::new())
    }

    #[test]
    fn records_are_retained_in_order() {
        let history = TaskHistory::new();
        history.record(result_for("t-1"));
        history.record(result_for("t-2"));
        assert_eq!(history.len(), 2);
        let recent = history.recent(10);
        assert_eq!(recent[0].result.task_id, TaskId::new("t-2").unwrap());
        assert_eq!(recent[1].result.task_id, TaskId::new("t-1").unwrap());
    }

    #[test]
    fn for_task_filters_by_identifier() {
        let history = TaskHistory::new();
        history.record(result_for("a"));
        history.record(result_for("b"));
        history.record(result_for("a"));
        assert_eq!(history.for_task(&TaskId::new("a").unwrap()).len(), 2);
    }

    #[test]
    fn capacity_evicts_the_oldest_entry() {
        let history = TaskHistory::new();
        for index in 0..HISTORY_CAPACITY + 5 {
            history.record(result_for(&format!("t-{index}")));
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert!(history.for_task(&TaskId::new("t-0").unwrap()).is_empty());
        assert!(!history.for_task(&TaskId::new("t-4").unwrap()).is_empty());
    }
}
