use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::summary::Summary;
use crate::track::{TrackId, TrackStats};

/// Frozen per-session stats, produced once when the session stops.
#[derive(Debug, Clone)]
pub struct TesterStats {
    expected_tracks: u64,
    tracks: BTreeMap<TrackId, Arc<TrackStats>>,
    stopped_at: Instant,
}

impl TesterStats {
    pub fn new(
        expected_tracks: u64,
        tracks: BTreeMap<TrackId, Arc<TrackStats>>,
        stopped_at: Instant,
    ) -> Self {
        Self {
            expected_tracks,
            tracks,
            stopped_at,
        }
    }

    pub fn empty(expected_tracks: u64) -> Self {
        Self::new(expected_tracks, BTreeMap::new(), Instant::now())
    }

    pub fn expected_tracks(&self) -> u64 {
        self.expected_tracks
    }

    pub fn stopped_at(&self) -> Instant {
        self.stopped_at
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &TrackStats> {
        self.tracks.values().map(|t| t.as_ref())
    }

    pub fn first_started_at(&self) -> Option<Instant> {
        self.tracks().map(TrackStats::stream_started_at).min()
    }

    /// Rollup of this session's tracks, measured from its earliest stream start until it stopped.
    pub fn summary(&self) -> Summary {
        let elapsed = self
            .first_started_at()
            .map(|start| self.stopped_at.saturating_duration_since(start))
            .unwrap_or_default();
        Summary::from_tracks(self.tracks(), self.expected_tracks, elapsed)
    }
}
