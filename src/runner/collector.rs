//! Outcome collection
//!
//! Thread-safe, append-only accumulator for test outcomes. The only
//! mutable state shared across concurrent poll loops.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::TestOutcome;

/// Append-only log of outcomes, in arrival order.
///
/// Appends are serialized by a mutex; the completion counter is atomic
/// so progress can be read without taking the lock.
#[derive(Debug, Default)]
pub struct ResultCollector {
    outcomes: Mutex<Vec<TestOutcome>>,
    completed: AtomicUsize,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one outcome. Called exactly once per spec file.
    pub fn append(&self, outcome: TestOutcome) {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        outcomes.push(outcome);
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of outcomes recorded so far
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Snapshot of all outcomes in arrival order
    pub fn snapshot(&self) -> Vec<TestOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Look up the outcome for a spec path
    pub fn find(&self, spec_path: &str) -> Option<TestOutcome> {
        self.outcomes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|o| o.spec.as_str() == spec_path)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpecFile;
    use std::sync::Arc;

    #[test]
    fn test_append_and_snapshot() {
        let collector = ResultCollector::new();
        collector.append(TestOutcome::finished(
            SpecFile::new("a.spec.js"),
            "s1",
            true,
            Vec::new(),
        ));
        collector.append(TestOutcome::create_failed(SpecFile::new("b.spec.js"), "boom"));

        assert_eq!(collector.completed(), 2);

        let snapshot = collector.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].spec.as_str(), "a.spec.js");
        assert_eq!(snapshot[1].spec.as_str(), "b.spec.js");
    }

    #[test]
    fn test_find_by_spec_path() {
        let collector = ResultCollector::new();
        collector.append(TestOutcome::finished(
            SpecFile::new("a.spec.js"),
            "s1",
            false,
            Vec::new(),
        ));

        assert!(collector.find("a.spec.js").is_some());
        assert!(collector.find("missing.spec.js").is_none());
    }

    #[tokio::test]
    async fn test_concurrent_appends() {
        let collector = Arc::new(ResultCollector::new());
        let mut handles = Vec::new();

        for i in 0..32 {
            let collector = collector.clone();
            handles.push(tokio::spawn(async move {
                collector.append(TestOutcome::finished(
                    SpecFile::new(format!("spec-{i}.spec.js")),
                    format!("sess-{i}"),
                    true,
                    Vec::new(),
                ));
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(collector.completed(), 32);
        assert_eq!(collector.snapshot().len(), 32);
    }
}
