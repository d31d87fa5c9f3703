//! Per-session poll loop
//!
//! Drives one spec file through its remote session:
//! `Created → Polling → (Passed | Failed | Errored)`.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::client::{SessionRequest, SessionService};
use crate::models::{PollEvent, Session, TestOutcome};
use crate::report::ReportStore;

use super::collector::ResultCollector;

/// Poll loop timing.
///
/// The poll interval is fixed rather than adaptive: it keeps remote
/// load bounded and latency predictable. The grace delay gives the
/// remote side room to finalize its report before the session is
/// deleted.
#[derive(Clone, Copy, Debug)]
pub struct PollConfig {
    /// Wait between poll round-trips
    pub poll_interval: Duration,

    /// Wait between report fetch and session deletion
    pub grace_delay: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            grace_delay: Duration::from_secs(3),
        }
    }
}

/// State machine for one spec file's remote session.
///
/// Produces exactly one outcome per run, on every path. Cleanup
/// (report fetch, session delete) is detached so it cannot block or
/// fail the loop itself.
#[derive(Clone)]
pub struct PollLoop {
    service: Arc<dyn SessionService>,
    collector: Arc<ResultCollector>,
    reports: Arc<ReportStore>,
    config: PollConfig,
}

impl PollLoop {
    pub fn new(
        service: Arc<dyn SessionService>,
        collector: Arc<ResultCollector>,
        reports: Arc<ReportStore>,
        config: PollConfig,
    ) -> Self {
        Self {
            service,
            collector,
            reports,
            config,
        }
    }

    /// Run the session to a terminal state and record its outcome.
    ///
    /// Returns the detached cleanup task's handle when the session
    /// reached a verdict, so the caller can drain cleanup before
    /// process exit.
    pub async fn run(&self, request: SessionRequest) -> Option<JoinHandle<()>> {
        let spec = request.spec.clone();

        // Created: a create failure ends the loop with no further
        // network calls for this spec.
        let session_id = match self.service.create_session(&request).await {
            Ok(id) => id,
            Err(e) => {
                error!("{e}");
                self.collector
                    .append(TestOutcome::create_failed(spec, e.to_string()));
                return None;
            }
        };

        let session = Session::new(session_id, spec.clone());
        debug!("Created session {session}");

        // Polling: buffer progress entries until a verdict arrives.
        // The first terminal entry in a batch wins; the remainder of
        // that batch is not consumed. A transport error is terminal
        // with no retry.
        let mut logs = Vec::new();
        let verdict = loop {
            match self.service.poll_logs(&session.id).await {
                Ok(batch) => {
                    let mut terminal = None;
                    for entry in batch {
                        match entry.into_event() {
                            PollEvent::Progress(entry) => logs.push(entry),
                            PollEvent::Terminal { passed } => {
                                terminal = Some(passed);
                                break;
                            }
                        }
                    }
                    if let Some(passed) = terminal {
                        break Ok(passed);
                    }
                }
                Err(e) => break Err(e),
            }

            tokio::time::sleep(self.config.poll_interval).await;
        };

        match verdict {
            Ok(passed) => {
                let outcome = TestOutcome::finished(spec, &session.id, passed, logs);
                info!("{outcome}");
                self.collector.append(outcome);

                let service = self.service.clone();
                let reports = self.reports.clone();
                let grace_delay = self.config.grace_delay;
                Some(tokio::spawn(async move {
                    cleanup_session(service, reports, session, grace_delay).await;
                }))
            }
            Err(e) => {
                // Errored: the outcome still lands so the run's
                // accounting stays complete; nothing to clean up.
                error!("{e}");
                self.collector
                    .append(TestOutcome::poll_failed(spec, &session.id, e.to_string(), logs));
                None
            }
        }
    }
}

/// Best-effort post-verdict cleanup: persist the raw report, wait out
/// the grace delay, delete the session. Failures are logged and never
/// escalate.
async fn cleanup_session(
    service: Arc<dyn SessionService>,
    reports: Arc<ReportStore>,
    session: Session,
    grace_delay: Duration,
) {
    match service.fetch_report(&session.id).await {
        Ok(bytes) => {
            if let Err(e) = reports.save_raw(&session.id, &bytes) {
                warn!("Could not persist report for session {}: {e}", session.id);
            }
        }
        Err(e) => warn!("{e}"),
    }

    tokio::time::sleep(grace_delay).await;

    if let Err(e) = service.delete_session(&session.id).await {
        warn!("{e}");
    } else {
        debug!("Removed session {}", session.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SpecFile;
    use crate::runner::testing::{plan, FakeGrid};
    use tempfile::tempdir;

    fn test_config() -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(5),
            grace_delay: Duration::from_millis(5),
        }
    }

    fn poll_loop(grid: Arc<FakeGrid>, reports: Arc<ReportStore>) -> (PollLoop, Arc<ResultCollector>) {
        let collector = Arc::new(ResultCollector::new());
        (
            PollLoop::new(grid, collector.clone(), reports, test_config()),
            collector,
        )
    }

    fn request(spec: &str) -> SessionRequest {
        SessionRequest {
            spec: SpecFile::new(spec),
            suite_url: "https://cdn.test/suite".to_string(),
            org: "acme".to_string(),
            dependencies: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_terminal_entry_ends_polling() {
        let dir = tempdir().unwrap();
        let grid = Arc::new(FakeGrid::new());
        grid.script("a.spec.js", plan::batches(vec![
            vec![plan::progress("step 1")],
            vec![plan::progress("step 2"), plan::terminal(true)],
        ]));

        let reports = Arc::new(ReportStore::new(dir.path().join("reports")));
        let (poll_loop, collector) = poll_loop(grid.clone(), reports);

        let cleanup = poll_loop.run(request("a.spec.js")).await;
        cleanup.unwrap().await.unwrap();

        let outcome = collector.find("a.spec.js").unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.logs.len(), 2);
        assert_eq!(grid.deleted(), vec!["sess-1".to_string()]);
    }

    #[tokio::test]
    async fn test_terminal_entry_not_stored_as_log() {
        let dir = tempdir().unwrap();
        let grid = Arc::new(FakeGrid::new());
        grid.script("a.spec.js", plan::batches(vec![vec![
            plan::progress("entry1"),
            plan::terminal(true),
        ]]));

        let reports = Arc::new(ReportStore::new(dir.path().join("reports")));
        let (poll_loop, collector) = poll_loop(grid, reports);

        let cleanup = poll_loop.run(request("a.spec.js")).await;
        cleanup.unwrap().await.unwrap();

        let outcome = collector.find("a.spec.js").unwrap();
        assert!(outcome.passed());
        assert_eq!(outcome.logs.len(), 1);
        assert!(outcome.logs[0].success.is_none());
    }

    #[tokio::test]
    async fn test_create_failure_records_errored_outcome() {
        let dir = tempdir().unwrap();
        let grid = Arc::new(FakeGrid::new());
        grid.script("b.spec.js", plan::create_error());

        let reports = Arc::new(ReportStore::new(dir.path().join("reports")));
        let (poll_loop, collector) = poll_loop(grid.clone(), reports);

        let cleanup = poll_loop.run(request("b.spec.js")).await;
        assert!(cleanup.is_none());

        let outcome = collector.find("b.spec.js").unwrap();
        assert!(!outcome.passed());
        assert!(outcome.session_id.is_none());
        assert!(outcome.logs.is_empty());
        assert!(grid.deleted().is_empty());
        assert!(grid.reports_fetched().is_empty());
    }

    #[tokio::test]
    async fn test_poll_failure_is_terminal_without_retry() {
        let dir = tempdir().unwrap();
        let grid = Arc::new(FakeGrid::new());
        grid.script("c.spec.js", plan::poll_error());

        let reports = Arc::new(ReportStore::new(dir.path().join("reports")));
        let (poll_loop, collector) = poll_loop(grid.clone(), reports);

        let cleanup = poll_loop.run(request("c.spec.js")).await;
        assert!(cleanup.is_none());

        let outcome = collector.find("c.spec.js").unwrap();
        assert!(!outcome.passed());
        assert_eq!(outcome.session_id.as_deref(), Some("sess-1"));
        assert_eq!(grid.poll_calls(), 1);
        assert!(grid.deleted().is_empty());
    }

    #[tokio::test]
    async fn test_report_fetch_failure_keeps_outcome() {
        let dir = tempdir().unwrap();
        let grid = Arc::new(FakeGrid::new());
        grid.script("a.spec.js", plan::batches(vec![vec![plan::terminal(true)]]));
        grid.fail_reports();

        let reports = Arc::new(ReportStore::new(dir.path().join("reports")));
        let (poll_loop, collector) = poll_loop(grid.clone(), reports.clone());

        let cleanup = poll_loop.run(request("a.spec.js")).await;
        cleanup.unwrap().await.unwrap();

        let outcome = collector.find("a.spec.js").unwrap();
        assert!(outcome.passed());
        assert!(reports.list_raw().unwrap().is_empty());
        // The session is still deleted even when the report fetch fails
        assert_eq!(grid.deleted().len(), 1);
    }
}
