use std::time::Duration;

use crate::tester::TesterStats;
use crate::track::{TrackCounters, TrackStats};

/// Rollup over a set of tracks. Always computed fresh from the underlying counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub tracks: u64,
    pub expected: u64,
    pub bytes: u64,
    pub packets: u64,
    pub latency_ns: u64,
    pub latency_count: u64,
    pub dropped: u64,
    pub elapsed: Duration,
}

impl Summary {
    pub fn from_tracks<'a>(
        tracks: impl IntoIterator<Item = &'a TrackStats>,
        expected: u64,
        elapsed: Duration,
    ) -> Self {
        Self::from_counters(tracks.into_iter().map(TrackStats::counters), expected, elapsed)
    }

    pub fn from_counters(
        counters: impl IntoIterator<Item = TrackCounters>,
        expected: u64,
        elapsed: Duration,
    ) -> Self {
        let mut s = Self {
            expected,
            elapsed,
            ..Self::default()
        };
        for c in counters {
            s.tracks += 1;
            s.add_counters(&c);
        }
        s
    }

    fn add_counters(&mut self, c: &TrackCounters) {
        self.packets = self.packets.saturating_add(c.packets);
        self.bytes = self.bytes.saturating_add(c.bytes);
        self.latency_ns = self.latency_ns.saturating_add(c.latency_ns);
        self.latency_count = self.latency_count.saturating_add(c.latency_count);
        self.dropped = self.dropped.saturating_add(c.dropped);
    }

    /// Mean latency, `None` when nothing was received or no latency was sampled.
    pub fn avg_latency(&self) -> Option<Duration> {
        if self.packets == 0 || self.latency_count == 0 {
            return None;
        }
        Some(Duration::from_nanos(self.latency_ns / self.latency_count))
    }

    /// Fraction of packets lost, `None` when nothing was received.
    pub fn drop_ratio(&self) -> Option<f64> {
        if self.packets == 0 {
            return None;
        }
        let total = self.dropped.saturating_add(self.packets);
        Some(self.dropped as f64 / total as f64)
    }

    pub fn bitrate_bps(&self) -> f64 {
        bits_per_second(self.bytes, self.elapsed)
    }
}

pub(crate) fn bits_per_second(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    (bytes as f64) * 8.0 / secs
}

/// Cross-session rollup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalSummary {
    pub summary: Summary,
    pub testers: u64,
}

impl TotalSummary {
    /// Union of every session's tracks. `elapsed` is the span of the whole run.
    pub fn from_testers<'a>(
        testers: impl IntoIterator<Item = &'a TesterStats>,
        elapsed: Duration,
    ) -> Self {
        let mut summary = Summary {
            elapsed,
            ..Summary::default()
        };
        let mut count = 0u64;
        for t in testers {
            count += 1;
            summary.expected = summary.expected.saturating_add(t.expected_tracks());
            for track in t.tracks() {
                summary.tracks += 1;
                summary.add_counters(&track.counters());
            }
        }
        Self {
            summary,
            testers: count,
        }
    }

    /// Bytes normalized by session count.
    pub fn avg_bytes_per_tester(&self) -> u64 {
        if self.testers == 0 {
            return 0;
        }
        self.summary.bytes / self.testers
    }

    pub fn avg_bitrate_bps(&self) -> f64 {
        bits_per_second(self.avg_bytes_per_tester(), self.summary.elapsed)
    }
}
