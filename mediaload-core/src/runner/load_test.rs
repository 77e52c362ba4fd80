use std::sync::Arc;

use super::config::Params;
use super::error::Result;
use super::progress::ProgressFn;
use super::report::RunReport;
use super::run::{Orchestrator, RunStats};
use super::session::SessionFactory;
use super::suite::{SUITE_CASES, SuiteCase, SuiteReport, SuiteRow, run_suite};

/// A configured load test bound to a session backend.
pub struct LoadTest<F> {
    params: Params,
    orchestrator: Orchestrator<F>,
}

impl<F> LoadTest<F>
where
    F: SessionFactory,
{
    pub fn new(params: Params, factory: Arc<F>) -> Self {
        Self {
            params,
            orchestrator: Orchestrator::new(factory),
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.orchestrator = self.orchestrator.with_progress(progress);
        self
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// One run, returning the raw per-session stats.
    pub async fn run_stats(&self) -> Result<RunStats> {
        self.orchestrator.run(&self.params).await
    }

    /// One run, reduced to the subscriber report.
    pub async fn run(&self) -> Result<RunReport> {
        let stats = self.run_stats().await?;
        Ok(RunReport::from_run(&stats))
    }

    /// The fixed suite matrix.
    pub async fn run_suite(&self, on_row: impl FnMut(&SuiteRow)) -> SuiteReport {
        self.run_cases(&SUITE_CASES, on_row).await
    }

    pub async fn run_cases(
        &self,
        cases: &[SuiteCase],
        on_row: impl FnMut(&SuiteRow),
    ) -> SuiteReport {
        run_suite(&self.orchestrator, &self.params, cases, on_row).await
    }
}
