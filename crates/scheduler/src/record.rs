//! Per-run result collector
//!
//! Records which vertices were applied and which failed during one run.
//! It is purely observational: scheduling decisions never read it.

use crate::types::{UnitOutcome, Vertex, VertexFailure};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Entries {
    applied: Vec<Vertex>,
    failed: Vec<VertexFailure>,
}

/// Thread-safe record of vertex outcomes for a single run
#[derive(Debug, Default)]
pub struct RunRecord {
    entries: Mutex<Entries>,
}

impl RunRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one vertex
    pub fn record(&self, vertex: &Vertex, outcome: &UnitOutcome) {
        let mut entries = self.lock();
        match outcome {
            UnitOutcome::Applied => entries.applied.push(vertex.clone()),
            UnitOutcome::Failed { error } => entries.failed.push(VertexFailure {
                vertex: vertex.clone(),
                error: error.clone(),
            }),
        }
    }

    /// Vertices applied so far, in completion order
    pub fn applied(&self) -> Vec<Vertex> {
        self.lock().applied.clone()
    }

    /// Failures recorded so far, in completion order
    pub fn failed(&self) -> Vec<VertexFailure> {
        self.lock().failed.clone()
    }

    /// Whether `vertex` was applied in this run
    pub fn is_applied(&self, vertex: &Vertex) -> bool {
        self.lock().applied.contains(vertex)
    }

    // A panicking worker must not hide the outcomes recorded by the others
    fn lock(&self) -> MutexGuard<'_, Entries> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_record_splits_outcomes() {
        let record = RunRecord::new();
        record.record(&Vertex::new("vpc", "dev"), &UnitOutcome::Applied);
        record.record(
            &Vertex::new("eks", "dev"),
            &UnitOutcome::Failed {
                error: "timeout".into(),
            },
        );

        assert_eq!(record.applied(), vec![Vertex::new("vpc", "dev")]);
        assert_eq!(record.failed().len(), 1);
        assert_eq!(record.failed()[0].error, "timeout");
        assert!(record.is_applied(&Vertex::new("vpc", "dev")));
        assert!(!record.is_applied(&Vertex::new("eks", "dev")));
    }

    #[test]
    fn test_record_recovers_from_poisoned_mutex() {
        let record = Arc::new(RunRecord::new());
        let poisoned = Arc::clone(&record);

        let _ = std::thread::spawn(move || {
            let _guard = poisoned
                .entries
                .lock()
                .expect("lock should succeed before poisoning");
            panic!("intentional poison");
        })
        .join();

        record.record(&Vertex::new("vpc", "dev"), &UnitOutcome::Applied);
        assert_eq!(record.applied().len(), 1);
    }
}
