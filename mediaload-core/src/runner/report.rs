use mediaload_stats::{MediaKind, Summary, TesterStats, TotalSummary, TrackId, TrackStats};

use super::run::RunStats;

#[derive(Debug, Clone)]
pub struct TrackRow {
    /// Display name assigned by the publisher (`"<seq>A"` / `"<seq>V"`), empty if unknown.
    pub name: String,
    pub track_id: TrackId,
    pub kind: MediaKind,
    /// Single-track rollup, measured from the stream start to the session stop.
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct TesterReport {
    pub name: String,
    pub tracks: Vec<TrackRow>,
    pub summary: Summary,
}

/// Computed values for the end-of-run report. Publisher sessions are left out: their
/// traffic shows up in the tracks the subscribers received.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub room: String,
    pub testers: Vec<TesterReport>,
    /// Grand total across `testers`; `None` when there were no subscribers.
    pub total: Option<TotalSummary>,
}

impl RunReport {
    pub fn from_run(run: &RunStats) -> Self {
        let testers: Vec<TesterReport> = run
            .subscribers()
            .map(|(name, stats)| tester_report(run, name, stats))
            .collect();

        let total = (!testers.is_empty()).then(|| {
            TotalSummary::from_testers(run.subscribers().map(|(_, s)| s), run.elapsed())
        });

        Self {
            room: run.room.clone(),
            testers,
            total,
        }
    }
}

fn tester_report(run: &RunStats, name: &str, stats: &TesterStats) -> TesterReport {
    let mut tracks: Vec<TrackRow> = stats
        .tracks()
        .map(|t| track_row(run, stats, t))
        .collect();
    tracks.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.track_id.cmp(&b.track_id))
    });

    TesterReport {
        name: name.to_string(),
        tracks,
        summary: stats.summary(),
    }
}

fn track_row(run: &RunStats, stats: &TesterStats, track: &TrackStats) -> TrackRow {
    let elapsed = stats
        .stopped_at()
        .saturating_duration_since(track.stream_started_at());
    TrackRow {
        name: run
            .track_names
            .get(track.track_id())
            .unwrap_or_default(),
        track_id: track.track_id().clone(),
        kind: track.kind(),
        summary: Summary::from_tracks([track], 1, elapsed),
    }
}
