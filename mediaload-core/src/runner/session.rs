use std::future::Future;

use mediaload_stats::{MediaKind, TesterStats, TrackId};

use super::video::VideoSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionRole {
    Publisher,
    Subscriber,
}

/// Everything a session needs to join a room.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Admission order, starting at 0.
    pub sequence: usize,
    /// Display name (`Pub <n>`, `Sub <n>` or an explicit identity).
    pub name: String,
    /// Identity the session joins the room with.
    pub identity: String,
    pub role: SessionRole,
    pub room: String,
    /// Tracks this session should end up receiving.
    pub expected_tracks: u64,
    /// Video fixture assigned to this publisher, if a catalog was configured.
    pub video: Option<VideoSpec>,
}

impl SessionParams {
    pub fn is_publisher(&self) -> bool {
        self.role == SessionRole::Publisher
    }
}

/// One simulated participant against the target service.
///
/// The session owns its [`TrackStats`](mediaload_stats::TrackStats) counters; the runner only
/// reads them through [`Session::stats`] once [`Session::stop`] has returned.
pub trait Session: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    fn start(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    fn publish_track(
        &self,
        label: &str,
        kind: MediaKind,
        bitrate: u32,
    ) -> impl Future<Output = Result<TrackId, Self::Error>> + Send;

    fn publish_simulcast_track(
        &self,
        label: &str,
        bitrate: u32,
        seed: u64,
    ) -> impl Future<Output = Result<TrackId, Self::Error>> + Send;

    /// Leaves the room and freezes the session's stats.
    fn stop(&self) -> impl Future<Output = ()> + Send;

    /// Final stats; `None` until the session has been stopped.
    fn stats(&self) -> Option<TesterStats>;
}

pub trait SessionFactory: Send + Sync + 'static {
    type Session: Session;

    fn create(&self, params: SessionParams) -> Self::Session;
}
