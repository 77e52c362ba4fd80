use mediaload_core::runner::{Params, ProgressFn, RunReport, SuiteReport, SuiteRow};

use crate::cli::OutputFormat;

mod human;
mod json;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Run,
    Suite,
}

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, params: &Params, mode: Mode);
    fn progress(&self) -> Option<ProgressFn>;
    fn print_report(&self, report: &RunReport) -> anyhow::Result<()>;
    fn print_suite_row(&self, row: &SuiteRow);
    fn print_suite_end(&self, report: &SuiteReport) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}

/// Suite row helper shared by both formats.
pub(crate) fn suite_loss(row: &SuiteRow) -> String {
    mediaload_stats::format_percentage(row.dropped, row.dropped.saturating_add(row.packets))
}
