//! Outcome models
//!
//! Defines per-spec outcomes and the run summary built from them.

#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::fmt;

use super::session::{LogEntry, SpecFile};

/// Terminal state of one spec's remote session
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Passed,
    Failed,
    Errored,
}

impl OutcomeStatus {
    pub fn symbol(&self) -> &'static str {
        match self {
            OutcomeStatus::Passed => "✓",
            OutcomeStatus::Failed => "✗",
            OutcomeStatus::Errored => "!",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OutcomeStatus::Passed)
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeStatus::Passed => write!(f, "PASSED"),
            OutcomeStatus::Failed => write!(f, "FAILED"),
            OutcomeStatus::Errored => write!(f, "ERROR"),
        }
    }
}

/// Final verdict for one spec file, recorded exactly once per run.
///
/// Error paths still produce an outcome so the run's accounting stays
/// complete; a session that never got created carries no session id.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Spec file this outcome belongs to
    pub spec: SpecFile,

    /// Remote session identifier, if a session was created
    pub session_id: Option<String>,

    /// Terminal state
    pub status: OutcomeStatus,

    /// Progress entries buffered before the verdict, in arrival order
    pub logs: Vec<LogEntry>,

    /// Transport error message, for errored outcomes
    pub error: Option<String>,
}

impl TestOutcome {
    /// Outcome for a session that reached a verdict
    pub fn finished(
        spec: SpecFile,
        session_id: impl Into<String>,
        passed: bool,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self {
            spec,
            session_id: Some(session_id.into()),
            status: if passed {
                OutcomeStatus::Passed
            } else {
                OutcomeStatus::Failed
            },
            logs,
            error: None,
        }
    }

    /// Outcome for a session whose creation failed
    pub fn create_failed(spec: SpecFile, error: impl Into<String>) -> Self {
        Self {
            spec,
            session_id: None,
            status: OutcomeStatus::Errored,
            logs: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// Outcome for a session lost to a poll transport error
    pub fn poll_failed(
        spec: SpecFile,
        session_id: impl Into<String>,
        error: impl Into<String>,
        logs: Vec<LogEntry>,
    ) -> Self {
        Self {
            spec,
            session_id: Some(session_id.into()),
            status: OutcomeStatus::Errored,
            logs,
            error: Some(error.into()),
        }
    }

    pub fn passed(&self) -> bool {
        self.status.is_success()
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} [{}]", self.status.symbol(), self.spec, self.status)?;
        if let Some(err) = &self.error {
            write!(f, " - {err}")?;
        }
        Ok(())
    }
}

/// Summary of one complete run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,

    /// Outcomes in arrival order
    pub outcomes: Vec<TestOutcome>,
}

impl RunSummary {
    pub fn new(outcomes: Vec<TestOutcome>, duration_ms: u64) -> Self {
        let total = outcomes.len();
        let passed = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Passed)
            .count();
        let failed = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Failed)
            .count();
        let errored = outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Errored)
            .count();

        Self {
            total,
            passed,
            failed,
            errored,
            duration_ms,
            outcomes,
        }
    }

    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.passed as f64 / self.total as f64) * 100.0
        }
    }

    pub fn is_all_passed(&self) -> bool {
        self.passed == self.total
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total: {} | Pass: {} | Fail: {} | Error: {}",
            self.total, self.passed, self.failed, self.errored
        )?;
        write!(
            f,
            "Pass Rate: {:.1}% | Duration: {}ms",
            self.pass_rate(),
            self.duration_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let passed = TestOutcome::finished(SpecFile::new("a.spec.js"), "s1", true, Vec::new());
        assert!(passed.passed());
        assert_eq!(passed.session_id.as_deref(), Some("s1"));

        let errored = TestOutcome::create_failed(SpecFile::new("b.spec.js"), "connection refused");
        assert_eq!(errored.status, OutcomeStatus::Errored);
        assert!(errored.session_id.is_none());
        assert!(errored.logs.is_empty());
    }

    #[test]
    fn test_run_summary_counts() {
        let outcomes = vec![
            TestOutcome::finished(SpecFile::new("a.spec.js"), "s1", true, Vec::new()),
            TestOutcome::finished(SpecFile::new("b.spec.js"), "s2", false, Vec::new()),
            TestOutcome::create_failed(SpecFile::new("c.spec.js"), "boom"),
        ];

        let summary = RunSummary::new(outcomes, 1500);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.passed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.errored, 1);
        assert!(!summary.is_all_passed());
    }

    #[test]
    fn test_pass_rate_empty() {
        let summary = RunSummary::new(Vec::new(), 0);
        assert_eq!(summary.pass_rate(), 0.0);
    }
}
