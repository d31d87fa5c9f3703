//! Bounded-concurrency dispatcher
//!
//! Runs one poll loop per spec file with at most a configured number
//! in flight, and completes exactly once after the last outcome has
//! been recorded.

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::info;

use crate::client::{SessionRequest, SessionService};
use crate::models::{RunSummary, SpecFile};
use crate::report::ReportStore;
use crate::utils::Timer;

use super::collector::ResultCollector;
use super::poll::{PollConfig, PollLoop};

/// Dispatcher settings
#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
    /// Maximum sessions in flight; 0 behaves as 1
    pub concurrency: usize,

    /// Poll loop timing
    pub poll: PollConfig,

    /// Render a progress bar while the run is in flight
    pub show_progress: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 1,
            poll: PollConfig::default(),
            show_progress: false,
        }
    }
}

/// Run-wide inputs shared by every session of a run
#[derive(Clone, Debug)]
pub struct RunRequest {
    /// Base execution URL returned by the suite upload
    pub suite_url: String,

    /// Organization id
    pub org: String,

    /// Extra npm dependencies installed in each session
    pub dependencies: Vec<String>,
}

/// Fans poll loops out over the spec set under a concurrency cap
pub struct Dispatcher {
    service: Arc<dyn SessionService>,
    collector: Arc<ResultCollector>,
    reports: Arc<ReportStore>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn SessionService>,
        collector: Arc<ResultCollector>,
        reports: Arc<ReportStore>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            service,
            collector,
            reports,
            config,
        }
    }

    /// Run every spec to a terminal outcome and build the summary.
    ///
    /// Blocks until all poll loops are done; the spec set is fixed at
    /// this point. The summary is built exactly once, after the last
    /// outcome has been recorded. Detached cleanup tasks are drained
    /// before returning so best-effort session deletes can land.
    pub async fn run(&self, specs: Vec<SpecFile>, run: &RunRequest) -> RunSummary {
        let limit = self.config.concurrency.max(1);

        info!(
            "Starting {} specs with {} parallel runners",
            specs.len(),
            limit
        );

        let timer = Timer::start("grid run");
        let semaphore = Arc::new(Semaphore::new(limit));
        let progress = self.progress_bar(specs.len());

        let mut handles = Vec::new();
        for spec in specs {
            let semaphore = semaphore.clone();
            let progress = progress.clone();
            let poll_loop = PollLoop::new(
                self.service.clone(),
                self.collector.clone(),
                self.reports.clone(),
                self.config.poll,
            );
            let request = SessionRequest {
                spec,
                suite_url: run.suite_url.clone(),
                org: run.org.clone(),
                dependencies: run.dependencies.clone(),
            };

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire().await.unwrap();

                let cleanup = poll_loop.run(request).await;
                if let Some(pb) = &progress {
                    pb.inc(1);
                }
                cleanup
            }));
        }

        let cleanups: Vec<JoinHandle<()>> = join_all(handles)
            .await
            .into_iter()
            .filter_map(|r| r.ok())
            .flatten()
            .collect();

        // Every outcome is recorded by now; this is the run's single
        // completion point.
        if let Some(pb) = &progress {
            pb.finish_and_clear();
        }
        let summary = RunSummary::new(self.collector.snapshot(), timer.elapsed_ms());

        info!(
            "Run completed in {}ms - Pass: {}/{} ({:.1}%)",
            summary.duration_ms,
            summary.passed,
            summary.total,
            summary.pass_rate()
        );

        join_all(cleanups).await;

        summary
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.config.show_progress {
            return None;
        }

        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} specs")
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    }
}
