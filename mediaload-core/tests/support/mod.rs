#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use mediaload_core::runner::{
    LoadTestOptions, Params, Session, SessionFactory, SessionParams,
};
use mediaload_stats::{MediaKind, TesterStats, TrackId, TrackStats};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Packets every fake subscriber reports per expected track.
pub const PACKETS_PER_TRACK: u64 = 10;
pub const DROPPED_PER_TRACK: u64 = 1;

#[derive(Debug, thiserror::Error)]
#[error("fake session refused to {0}")]
pub struct FakeError(&'static str);

#[derive(Debug, Clone)]
pub struct Admission {
    pub params: SessionParams,
    pub at: tokio::time::Instant,
}

type CreateHook = Box<dyn Fn(&SessionParams) + Send + Sync>;

/// Records every session the orchestrator creates and lets tests inject failures.
#[derive(Default)]
pub struct FakeFactory {
    admissions: Mutex<Vec<Admission>>,
    sessions: Mutex<Vec<Arc<FakeState>>>,
    fail_start: HashSet<String>,
    fail_publish: HashSet<String>,
    on_create: Option<CreateHook>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_start(mut self, name: &str) -> Self {
        self.fail_start.insert(name.to_string());
        self
    }

    pub fn failing_publish(mut self, name: &str) -> Self {
        self.fail_publish.insert(name.to_string());
        self
    }

    pub fn on_create(mut self, hook: impl Fn(&SessionParams) + Send + Sync + 'static) -> Self {
        self.on_create = Some(Box::new(hook));
        self
    }

    pub fn admissions(&self) -> Vec<Admission> {
        self.admissions.lock().clone()
    }

    pub fn admitted(&self) -> usize {
        self.admissions.lock().len()
    }

    pub fn stopped(&self) -> usize {
        self.sessions
            .lock()
            .iter()
            .filter(|s| s.stopped.load(Ordering::Acquire))
            .count()
    }

    pub fn published(&self) -> Vec<(String, TrackId)> {
        self.sessions
            .lock()
            .iter()
            .flat_map(|s| {
                let name = s.params.name.clone();
                s.published
                    .lock()
                    .iter()
                    .map(move |(id, _, _)| (name.clone(), id.clone()))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Bitrate each track was published with.
    pub fn published_bitrates(&self) -> BTreeMap<TrackId, u32> {
        self.sessions
            .lock()
            .iter()
            .flat_map(|s| {
                s.published
                    .lock()
                    .iter()
                    .map(|(id, _, bitrate)| (id.clone(), *bitrate))
                    .collect::<Vec<_>>()
            })
            .collect()
    }
}

struct FakeState {
    params: SessionParams,
    fail_start: bool,
    fail_publish: bool,
    published: Mutex<Vec<(TrackId, MediaKind, u32)>>,
    stopped: AtomicBool,
    stats: OnceLock<TesterStats>,
}

pub struct FakeSession {
    state: Arc<FakeState>,
}

impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    fn create(&self, params: SessionParams) -> FakeSession {
        if let Some(hook) = &self.on_create {
            hook(&params);
        }
        self.admissions.lock().push(Admission {
            params: params.clone(),
            at: tokio::time::Instant::now(),
        });

        let state = Arc::new(FakeState {
            fail_start: self.fail_start.contains(&params.name),
            fail_publish: self.fail_publish.contains(&params.name),
            params,
            published: Mutex::new(Vec::new()),
            stopped: AtomicBool::new(false),
            stats: OnceLock::new(),
        });
        self.sessions.lock().push(state.clone());
        FakeSession { state }
    }
}

impl FakeSession {
    fn publish(&self, label: &str, kind: MediaKind, bitrate: u32) -> Result<TrackId, FakeError> {
        if self.state.fail_publish {
            return Err(FakeError("publish"));
        }
        let id: TrackId = Arc::from(format!(
            "TR_{}_{label}",
            self.state.params.sequence
        ));
        self.state.published.lock().push((id.clone(), kind, bitrate));
        Ok(id)
    }
}

impl Session for FakeSession {
    type Error = FakeError;

    async fn start(&self) -> Result<(), FakeError> {
        if self.state.fail_start {
            return Err(FakeError("start"));
        }
        Ok(())
    }

    async fn publish_track(
        &self,
        label: &str,
        kind: MediaKind,
        bitrate: u32,
    ) -> Result<TrackId, FakeError> {
        self.publish(label, kind, bitrate)
    }

    async fn publish_simulcast_track(
        &self,
        label: &str,
        bitrate: u32,
        _seed: u64,
    ) -> Result<TrackId, FakeError> {
        self.publish(label, MediaKind::Video, bitrate)
    }

    async fn stop(&self) {
        self.state.stopped.store(true, Ordering::Release);
        let _ = self.state.stats.get_or_init(|| {
            let now = std::time::Instant::now();
            let mut tracks = BTreeMap::new();
            if !self.state.params.is_publisher() {
                for i in 0..self.state.params.expected_tracks {
                    let id: TrackId = Arc::from(format!("TR_remote_{i}"));
                    let t = TrackStats::started_at(id.clone(), MediaKind::Audio, now);
                    for _ in 0..PACKETS_PER_TRACK {
                        t.record_packet(100, Some(Duration::from_millis(5)));
                    }
                    t.record_dropped(DROPPED_PER_TRACK);
                    tracks.insert(id, Arc::new(t));
                }
            }
            TesterStats::new(self.state.params.expected_tracks, tracks, now)
        });
    }

    fn stats(&self) -> Option<TesterStats> {
        self.state.stats.get().cloned()
    }
}

pub fn params(opts: LoadTestOptions, cancel: CancellationToken) -> Params {
    Params::from_options(opts, cancel).unwrap_or_else(|e| panic!("valid options: {e}"))
}
