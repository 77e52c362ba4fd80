use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::tester::TesterStats;

pub type TrackId = Arc<str>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

/// Counters for one published or subscribed media track.
///
/// Written by the owning session while media flows; every counter only ever grows.
#[derive(Debug)]
pub struct TrackStats {
    track_id: TrackId,
    kind: MediaKind,
    started_at: Instant,
    packets: AtomicU64,
    bytes: AtomicU64,
    latency_ns: AtomicU64,
    latency_count: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of a [`TrackStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackCounters {
    pub packets: u64,
    pub bytes: u64,
    pub latency_ns: u64,
    pub latency_count: u64,
    pub dropped: u64,
}

impl TrackStats {
    pub fn new(track_id: impl Into<TrackId>, kind: MediaKind) -> Self {
        Self::started_at(track_id, kind, Instant::now())
    }

    pub fn started_at(track_id: impl Into<TrackId>, kind: MediaKind, started_at: Instant) -> Self {
        Self {
            track_id: track_id.into(),
            kind,
            started_at,
            packets: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            latency_ns: AtomicU64::new(0),
            latency_count: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn stream_started_at(&self) -> Instant {
        self.started_at
    }

    #[inline]
    pub fn record_packet(&self, bytes: u64, latency: Option<Duration>) {
        self.packets.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
        if let Some(latency) = latency {
            let ns = u64::try_from(latency.as_nanos()).unwrap_or(u64::MAX);
            self.latency_ns.fetch_add(ns, Ordering::Relaxed);
            self.latency_count.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn record_dropped(&self, packets: u64) {
        self.dropped.fetch_add(packets, Ordering::Relaxed);
    }

    pub fn packets(&self) -> u64 {
        self.packets.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn counters(&self) -> TrackCounters {
        TrackCounters {
            packets: self.packets.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            latency_ns: self.latency_ns.load(Ordering::Relaxed),
            latency_count: self.latency_count.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Live set of tracks owned by one session, keyed by track id.
#[derive(Debug, Default)]
pub struct TrackSet {
    tracks: Mutex<BTreeMap<TrackId, Arc<TrackStats>>>,
}

impl TrackSet {
    /// Returns the stats for `track_id`, creating them on first sight.
    pub fn get_or_insert(&self, track_id: &TrackId, kind: MediaKind) -> Arc<TrackStats> {
        let mut tracks = self.tracks.lock();
        tracks
            .entry(track_id.clone())
            .or_insert_with(|| Arc::new(TrackStats::new(track_id.clone(), kind)))
            .clone()
    }

    pub fn get(&self, track_id: &str) -> Option<Arc<TrackStats>> {
        self.tracks.lock().get(track_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tracks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.lock().is_empty()
    }

    pub fn live(&self) -> Vec<Arc<TrackStats>> {
        self.tracks.lock().values().cloned().collect()
    }

    /// Freezes the current membership into an immutable [`TesterStats`].
    pub fn snapshot(&self, expected_tracks: u64) -> TesterStats {
        let tracks = self.tracks.lock().clone();
        TesterStats::new(expected_tracks, tracks, Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_packet_accumulates_latency_only_when_sampled() {
        let t = TrackStats::new("TR_a", MediaKind::Audio);
        t.record_packet(100, Some(Duration::from_nanos(40)));
        t.record_packet(50, None);
        t.record_dropped(2);

        let c = t.counters();
        assert_eq!(c.packets, 2);
        assert_eq!(c.bytes, 150);
        assert_eq!(c.latency_ns, 40);
        assert_eq!(c.latency_count, 1);
        assert_eq!(c.dropped, 2);
    }

    #[test]
    fn track_set_keeps_one_entry_per_track_id() {
        let set = TrackSet::default();
        let id: TrackId = Arc::from("TR_v");
        let a = set.get_or_insert(&id, MediaKind::Video);
        let b = set.get_or_insert(&id, MediaKind::Audio);
        a.record_packet(10, None);

        assert_eq!(set.len(), 1);
        assert_eq!(b.kind(), MediaKind::Video);
        assert_eq!(b.packets(), 1);
    }

    #[test]
    fn media_kind_round_trips_through_strings() {
        assert_eq!(MediaKind::Audio.to_string(), "audio");
        assert_eq!("video".parse::<MediaKind>().ok(), Some(MediaKind::Video));
    }
}
