use std::time::Duration;

use super::config::Params;
use super::error::Error;
use super::run::{Orchestrator, RunStats};
use super::session::SessionFactory;

/// Duration used by suite cases when the base parameters leave it unbounded.
pub const DEFAULT_CASE_DURATION: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuiteCase {
    pub publishers: usize,
    pub subscribers: usize,
    pub video: bool,
}

const fn case(publishers: usize, subscribers: usize, video: bool) -> SuiteCase {
    SuiteCase {
        publishers,
        subscribers,
        video,
    }
}

pub const SUITE_CASES: [SuiteCase; 11] = [
    case(10, 10, false),
    case(10, 100, false),
    case(10, 500, false),
    case(10, 1000, false),
    case(50, 50, false),
    case(100, 50, false),
    case(10, 10, true),
    case(10, 100, true),
    case(10, 500, true),
    case(1, 100, true),
    case(1, 1000, true),
];

impl SuiteCase {
    /// Parameters for this case derived from the suite's base parameters.
    pub fn params(&self, base: &Params) -> Params {
        let mut p = base.clone();
        // An identity list pins the publisher count.
        if p.identities.is_none() {
            p.publishers = self.publishers;
        }
        p.subscribers = self.subscribers;
        p.simulcast = true;
        if p.duration.is_none() {
            p.duration = Some(DEFAULT_CASE_DURATION);
        }
        if !self.video {
            p.video_bitrate = 0;
        }
        p
    }
}

/// One finished case.
#[derive(Debug, Clone)]
pub struct SuiteRow {
    pub case: SuiteCase,
    pub audio: bool,
    pub video: bool,
    /// Tracks expected per subscriber for this case.
    pub expected_tracks: u64,
    /// Tracks observed across every session of the case.
    pub tracks: u64,
    pub packets: u64,
    pub dropped: u64,
}

impl SuiteRow {
    fn from_run(case: SuiteCase, params: &Params, run: &RunStats) -> Self {
        let mut row = Self {
            case,
            audio: params.audio_bitrate > 0,
            video: params.video_bitrate > 0,
            expected_tracks: params.expected_tracks(),
            tracks: 0,
            packets: 0,
            dropped: 0,
        };
        for tester in run.testers.values() {
            for track in tester.tracks() {
                row.tracks += 1;
                row.packets = row.packets.saturating_add(track.packets());
                row.dropped = row.dropped.saturating_add(track.dropped());
            }
        }
        row
    }

    /// `dropped / (dropped + packets) * 100`, `None` when nothing was counted.
    pub fn loss_pct(&self) -> Option<f64> {
        let total = self.dropped.saturating_add(self.packets);
        if total == 0 {
            return None;
        }
        Some(100.0 * self.dropped as f64 / total as f64)
    }
}

#[derive(Debug, Default)]
pub struct SuiteReport {
    pub rows: Vec<SuiteRow>,
    /// The run-scope token fired; remaining cases were skipped.
    pub cancelled: bool,
    /// A case failed; remaining cases were skipped.
    pub error: Option<Error>,
}

impl SuiteReport {
    pub fn is_complete(&self) -> bool {
        !self.cancelled && self.error.is_none()
    }
}

/// Runs `cases` one after another. Each finished case is handed to `on_row` as soon as it
/// completes; a failure or cancellation stops the suite but keeps the rows collected so far.
pub async fn run_suite<F>(
    orchestrator: &Orchestrator<F>,
    base: &Params,
    cases: &[SuiteCase],
    mut on_row: impl FnMut(&SuiteRow),
) -> SuiteReport
where
    F: SessionFactory,
{
    let mut report = SuiteReport::default();

    for case in cases {
        if base.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let params = case.params(base);
        tracing::info!(
            publishers = params.publishers,
            subscribers = params.subscribers,
            video = case.video,
            "running suite case"
        );

        let run = match orchestrator.run(&params).await {
            Ok(run) => run,
            Err(Error::Cancelled) => {
                report.cancelled = true;
                break;
            }
            Err(err) => {
                tracing::warn!(error = %err, "suite case failed");
                report.error = Some(err);
                break;
            }
        };

        // A case cut short by cancellation is not comparable with the others.
        if base.is_cancelled() {
            report.cancelled = true;
            break;
        }

        let row = SuiteRow::from_run(*case, &params, &run);
        on_row(&row);
        report.rows.push(row);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::config::LoadTestOptions;
    use tokio_util::sync::CancellationToken;

    fn base() -> Params {
        Params::from_options(
            LoadTestOptions {
                publishers: 1,
                subscribers: 1,
                audio_bitrate: 20_000,
                video_bitrate: 500_000,
                ..LoadTestOptions::default()
            },
            CancellationToken::new(),
        )
        .unwrap_or_else(|e| panic!("valid options: {e}"))
    }

    #[test]
    fn case_params_override_counts_and_force_simulcast() {
        let p = case(10, 100, true).params(&base());
        assert_eq!(p.publishers, 10);
        assert_eq!(p.subscribers, 100);
        assert!(p.simulcast);
        assert_eq!(p.duration, Some(DEFAULT_CASE_DURATION));
        assert_eq!(p.video_bitrate, 500_000);
        assert_eq!(p.expected_tracks(), 20);
    }

    #[test]
    fn audio_only_case_zeroes_video() {
        let p = case(10, 10, false).params(&base());
        assert_eq!(p.video_bitrate, 0);
        assert_eq!(p.audio_bitrate, 20_000);
        assert_eq!(p.expected_tracks(), 10);
    }

    #[test]
    fn explicit_duration_is_kept() {
        let mut b = base();
        b.duration = Some(Duration::from_secs(3));
        let p = case(1, 1, true).params(&b);
        assert_eq!(p.duration, Some(Duration::from_secs(3)));
    }

    #[test]
    fn loss_pct_guards_empty_rows() {
        let mut row = SuiteRow {
            case: case(1, 1, false),
            audio: true,
            video: false,
            expected_tracks: 1,
            tracks: 0,
            packets: 0,
            dropped: 0,
        };
        assert_eq!(row.loss_pct(), None);

        row.packets = 99;
        row.dropped = 1;
        assert_eq!(row.loss_pct(), Some(1.0));
    }

    #[test]
    fn matrix_is_fixed() {
        assert_eq!(SUITE_CASES.len(), 11);
        assert_eq!(SUITE_CASES[0], case(10, 10, false));
        assert_eq!(SUITE_CASES[10], case(1, 1000, true));
        assert_eq!(SUITE_CASES.iter().filter(|c| c.video).count(), 5);
    }
}
