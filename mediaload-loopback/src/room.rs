use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use mediaload_stats::{MediaKind, TrackId, TrackSet, TrackStats};
use parking_lot::Mutex;
use rand::Rng as _;
use rand::rngs::StdRng;

use crate::config::LoopbackConfig;

pub(crate) type MemberId = u64;

/// One packet of a published track, fanned out to the rest of the room.
pub(crate) struct Packet<'a> {
    pub track_id: &'a TrackId,
    pub kind: MediaKind,
    pub bytes: u64,
}

#[derive(Debug)]
pub(crate) struct Room {
    name: String,
    members: Mutex<HashMap<MemberId, Arc<TrackSet>>>,
}

impl Room {
    fn new(name: String) -> Self {
        Self {
            name,
            members: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn len(&self) -> usize {
        self.members.lock().len()
    }

    /// Delivers `packet` to every member except `from`, applying the configured loss
    /// and latency independently per receiver.
    pub(crate) fn deliver(
        &self,
        from: MemberId,
        packet: &Packet<'_>,
        config: &LoopbackConfig,
        rng: &mut StdRng,
    ) {
        let receivers: Vec<Arc<TrackSet>> = self
            .members
            .lock()
            .iter()
            .filter(|(id, _)| **id != from)
            .map(|(_, tracks)| tracks.clone())
            .collect();

        let loss = config.loss_probability();
        for tracks in receivers {
            let stats = tracks.get_or_insert(packet.track_id, packet.kind);
            if loss > 0.0 && rng.random_bool(loss) {
                stats.record_dropped(1);
                continue;
            }
            stats.record_packet(packet.bytes, Some(latency(config, rng)));
        }
    }
}

fn latency(config: &LoopbackConfig, rng: &mut StdRng) -> Duration {
    let jitter = config.jitter.as_nanos() as u64;
    if jitter == 0 {
        return config.latency;
    }
    config.latency + Duration::from_nanos(rng.random_range(0..=jitter))
}

/// Rooms keyed by name, plus a directory of every session's live tracks.
#[derive(Debug, Default)]
pub struct LoopbackServer {
    config: LoopbackConfig,
    rooms: Mutex<HashMap<String, Arc<Room>>>,
    sessions: Mutex<HashMap<String, Arc<TrackSet>>>,
    next_member: AtomicU64,
    next_track: AtomicU64,
}

impl LoopbackServer {
    pub fn new(config: LoopbackConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &LoopbackConfig {
        &self.config
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().len()
    }

    /// Members currently joined to `room`.
    pub fn members(&self, room: &str) -> usize {
        self.rooms.lock().get(room).map_or(0, |r| r.len())
    }

    /// Live (still updating) tracks received by the session named `name`.
    pub fn live_tracks(&self, name: &str) -> Vec<Arc<TrackStats>> {
        self.sessions
            .lock()
            .get(name)
            .map(|t| t.live())
            .unwrap_or_default()
    }

    pub(crate) fn register(&self, name: &str, tracks: Arc<TrackSet>) -> MemberId {
        self.sessions.lock().insert(name.to_string(), tracks);
        self.next_member.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn next_track_id(&self) -> TrackId {
        let n = self.next_track.fetch_add(1, Ordering::Relaxed);
        Arc::from(format!("TR_{n:06}"))
    }

    pub(crate) fn join(&self, room: &str, member: MemberId, tracks: Arc<TrackSet>) -> Arc<Room> {
        let mut rooms = self.rooms.lock();
        let room = rooms
            .entry(room.to_string())
            .or_insert_with(|| Arc::new(Room::new(room.to_string())))
            .clone();
        room.members.lock().insert(member, tracks);
        room
    }

    /// Removes `member` from `room`; the room goes away with its last member.
    pub(crate) fn leave(&self, room: &Room, member: MemberId) {
        let mut rooms = self.rooms.lock();
        let empty = {
            let mut members = room.members.lock();
            members.remove(&member);
            members.is_empty()
        };
        if empty {
            rooms.remove(room.name());
        }
    }
}
