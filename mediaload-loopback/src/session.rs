use std::sync::{Arc, OnceLock};

use mediaload_core::runner::{Session, SessionFactory, SessionParams};
use mediaload_stats::{MediaKind, TesterStats, TrackId, TrackSet};
use parking_lot::Mutex;
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::room::{LoopbackServer, MemberId, Packet, Room};

#[derive(Debug, Clone)]
pub struct LoopbackFactory {
    server: Arc<LoopbackServer>,
}

impl LoopbackFactory {
    pub fn new(server: Arc<LoopbackServer>) -> Self {
        Self { server }
    }
}

impl SessionFactory for LoopbackFactory {
    type Session = LoopbackSession;

    fn create(&self, params: SessionParams) -> LoopbackSession {
        LoopbackSession::new(self.server.clone(), params)
    }
}

pub struct LoopbackSession {
    server: Arc<LoopbackServer>,
    params: SessionParams,
    member: MemberId,
    tracks: Arc<TrackSet>,
    room: Mutex<Option<Arc<Room>>>,
    cancel: CancellationToken,
    pumps: Mutex<Vec<JoinHandle<()>>>,
    stats: OnceLock<TesterStats>,
}

impl LoopbackSession {
    pub fn new(server: Arc<LoopbackServer>, params: SessionParams) -> Self {
        let tracks = Arc::new(TrackSet::default());
        let member = server.register(&params.name, tracks.clone());
        Self {
            server,
            params,
            member,
            tracks,
            room: Mutex::new(None),
            cancel: CancellationToken::new(),
            pumps: Mutex::new(Vec::new()),
            stats: OnceLock::new(),
        }
    }

    fn publish(&self, label: &str, kind: MediaKind, bitrate: u32, seed: u64) -> Result<TrackId> {
        if self.cancel.is_cancelled() {
            return Err(Error::Stopped(self.params.name.clone()));
        }
        let room = self
            .room
            .lock()
            .clone()
            .ok_or_else(|| Error::NotJoined(self.params.name.clone()))?;

        let track_id = self.server.next_track_id();
        let config = self.server.config();
        let rng = StdRng::seed_from_u64(config.seed ^ seed.rotate_left(17) ^ self.member);

        tracing::debug!(
            session = %self.params.name,
            track = %track_id,
            label,
            %kind,
            bitrate,
            "publishing loopback track"
        );

        let handle = tokio::spawn(pump(
            self.server.clone(),
            room,
            self.member,
            track_id.clone(),
            kind,
            config.packet_bytes(bitrate),
            rng,
            self.cancel.clone(),
        ));
        self.pumps.lock().push(handle);
        Ok(track_id)
    }
}

#[allow(clippy::too_many_arguments)]
async fn pump(
    server: Arc<LoopbackServer>,
    room: Arc<Room>,
    from: MemberId,
    track_id: TrackId,
    kind: MediaKind,
    bytes: u64,
    mut rng: StdRng,
    cancel: CancellationToken,
) {
    let config = server.config();
    let mut ticker = tokio::time::interval(config.packet_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let packet = Packet {
        track_id: &track_id,
        kind,
        bytes,
    };
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => room.deliver(from, &packet, config, &mut rng),
        }
    }
}

impl Session for LoopbackSession {
    type Error = Error;

    async fn start(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Stopped(self.params.name.clone()));
        }
        let config = self.server.config();
        if config.should_fail(&self.params.name, &self.params.identity) {
            return Err(Error::Rejected {
                room: self.params.room.clone(),
                name: self.params.name.clone(),
            });
        }

        let room = self
            .server
            .join(&self.params.room, self.member, self.tracks.clone());
        tracing::debug!(
            session = %self.params.name,
            role = %self.params.role,
            room = %room.name(),
            "joined loopback room"
        );
        *self.room.lock() = Some(room);
        Ok(())
    }

    async fn publish_track(&self, label: &str, kind: MediaKind, bitrate: u32) -> Result<TrackId> {
        self.publish(label, kind, bitrate, self.params.sequence as u64)
    }

    /// Subscribers receive only the top layer, so this is published as a single
    /// video track with its own jitter/loss stream.
    async fn publish_simulcast_track(
        &self,
        label: &str,
        bitrate: u32,
        seed: u64,
    ) -> Result<TrackId> {
        self.publish(label, MediaKind::Video, bitrate, seed)
    }

    async fn stop(&self) {
        self.cancel.cancel();

        let pumps = std::mem::take(&mut *self.pumps.lock());
        for pump in pumps {
            if let Err(err) = pump.await {
                tracing::warn!(session = %self.params.name, error = %err, "track pump failed");
            }
        }

        let room = self.room.lock().take();
        if let Some(room) = room {
            self.server.leave(&room, self.member);
        }

        let _ = self
            .stats
            .get_or_init(|| self.tracks.snapshot(self.params.expected_tracks));
    }

    fn stats(&self) -> Option<TesterStats> {
        self.stats.get().cloned()
    }
}
