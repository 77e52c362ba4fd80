use std::sync::Arc;

use mediaload_core::runner::{Params, ProgressFn, ProgressUpdate, RunReport, SuiteReport, SuiteRow};

mod format;
mod progress;
mod summary;

use format::{format_duration, format_rate};
use progress::{HumanProgress, Phase};

use super::{Mode, OutputFormatter};

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, params: &Params, mode: Mode) {
        if mode == Mode::Run {
            println!(
                "publishers: {} subscribers: {}",
                params.publishers, params.subscribers
            );
        }
        println!(
            "audio: {} video: {}{} rate cap: {}/s duration: {}",
            bitrate_or_off(params.audio_bitrate),
            bitrate_or_off(params.video_bitrate),
            if params.simulcast || mode == Mode::Suite {
                " (simulcast)"
            } else {
                ""
            },
            format_rate(params.num_per_second),
            params
                .duration
                .map_or_else(|| "until interrupted".to_string(), format_duration),
        );
        if let Some(ids) = &params.identities {
            println!("identities: {}", ids.join(", "));
        }
        println!();
        if mode == Mode::Suite {
            println!("{}", summary::suite_header());
        }
    }

    fn progress(&self) -> Option<ProgressFn> {
        let progress = self.progress.clone();

        Some(Arc::new(move |u: ProgressUpdate| match u {
            ProgressUpdate::Admitting {
                admitted,
                total,
                elapsed,
                rate,
            } => {
                progress.update(
                    Phase::Admitting,
                    admitted,
                    Some(total),
                    format!(
                        "sessions={admitted}/{total} rate={}/s elapsed={}",
                        format_rate(rate),
                        format_duration(elapsed)
                    ),
                );
                if admitted >= total {
                    progress.finish_phase(Phase::Admitting);
                }
            }
            ProgressUpdate::Running {
                elapsed,
                duration,
                sessions,
            } => {
                progress.finish_phase(Phase::Admitting);
                let message = format!("sessions={sessions} elapsed={}", format_duration(elapsed));
                match duration {
                    Some(d) => progress.update(
                        Phase::Running,
                        elapsed.as_millis() as u64,
                        Some(d.as_millis() as u64),
                        message,
                    ),
                    None => progress.update(Phase::Running, 0, None, message),
                }
            }
            ProgressUpdate::Stopping { sessions } => {
                progress.finish_phase(Phase::Admitting);
                progress.update(
                    Phase::Running,
                    0,
                    None,
                    format!("stopping {sessions} sessions"),
                );
            }
        }))
    }

    fn print_report(&self, report: &RunReport) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", summary::render(report));
        Ok(())
    }

    fn print_suite_row(&self, row: &SuiteRow) {
        self.progress.finish();
        self.progress.println(&summary::suite_row(row));
    }

    fn print_suite_end(&self, report: &SuiteReport) -> anyhow::Result<()> {
        self.progress.finish();
        print!("{}", summary::suite_footer(report));
        Ok(())
    }
}

fn bitrate_or_off(bps: u32) -> String {
    if bps == 0 {
        "off".to_string()
    } else {
        mediaload_stats::format_bps(f64::from(bps))
    }
}
