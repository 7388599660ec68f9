//! Run history
//!
//! Collects execution records as actions reach a terminal state. The engine
//! appends to it while a run is in flight; callers holding the same `Arc`
//! can take snapshots at any time.

use gantry_core::domain::run::ExecutionRecord;
use std::sync::{Mutex, PoisonError};

/// Append-only execution history for one run
#[derive(Debug, Default)]
pub struct RunHistory {
    records: Mutex<Vec<ExecutionRecord>>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a terminal record
    pub fn append(&self, record: ExecutionRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    /// Returns a copy of the records appended so far, in completion order
    pub fn snapshot(&self) -> Vec<ExecutionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
