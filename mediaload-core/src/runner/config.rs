use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::error::{Error, Result};
use super::identity::parse_identity_range;
use super::video::VideoSpec;

/// Sessions admitted per second when nothing is configured.
pub const DEFAULT_NUM_PER_SECOND: f64 = 5.0;

/// Hard ceiling for the admission rate.
pub const MAX_NUM_PER_SECOND: f64 = 10.0;

/// Raw load options, as collected from CLI flags or a config file.
#[derive(Debug, Clone, Default)]
pub struct LoadTestOptions {
    pub publishers: usize,
    pub subscribers: usize,

    /// Audio target bitrate in bps; `0` disables audio.
    pub audio_bitrate: u32,
    /// Video target bitrate in bps; `0` disables video.
    pub video_bitrate: u32,

    /// Run duration. `None` or zero runs until cancelled.
    pub duration: Option<Duration>,

    /// Admission cap in sessions per second.
    pub num_per_second: Option<f64>,

    pub simulcast: bool,

    pub identities: Vec<String>,
    /// `"<first>-<last>"`; overrides `identities` and `publishers`.
    pub identity_range: Option<String>,

    pub room: Option<String>,

    pub videos: Vec<VideoSpec>,
}

/// Resolved, immutable parameters for one run.
#[derive(Debug, Clone)]
pub struct Params {
    pub publishers: usize,
    pub subscribers: usize,
    pub audio_bitrate: u32,
    pub video_bitrate: u32,
    pub duration: Option<Duration>,
    pub num_per_second: f64,
    pub simulcast: bool,
    pub identities: Option<Arc<[String]>>,
    pub room: Option<String>,
    pub videos: Arc<[VideoSpec]>,
    pub cancel: CancellationToken,
}

impl Params {
    pub fn from_options(opts: LoadTestOptions, cancel: CancellationToken) -> Result<Self> {
        let num_per_second = match opts.num_per_second {
            None => DEFAULT_NUM_PER_SECOND,
            Some(v) if !v.is_finite() || v < 0.0 => return Err(Error::InvalidRate(v)),
            Some(v) if v == 0.0 => DEFAULT_NUM_PER_SECOND,
            Some(v) => v.min(MAX_NUM_PER_SECOND),
        };

        let identities = match &opts.identity_range {
            Some(range) if !range.is_empty() => {
                tracing::info!(range = %range, "using identity range");
                Some(parse_identity_range(range)?)
            }
            _ if !opts.identities.is_empty() => Some(opts.identities),
            _ => None,
        };
        if let Some(ids) = &identities {
            check_identities(ids)?;
        }

        let mut publishers = opts.publishers;
        let mut subscribers = opts.subscribers;
        if let Some(ids) = &identities {
            publishers = ids.len();
        }
        if publishers == 0 && subscribers == 0 {
            publishers = 1;
            subscribers = 1;
        }

        Ok(Self {
            publishers,
            subscribers,
            audio_bitrate: opts.audio_bitrate,
            video_bitrate: opts.video_bitrate,
            duration: opts.duration.filter(|d| !d.is_zero()),
            num_per_second,
            simulcast: opts.simulcast,
            identities: identities.map(Arc::from),
            room: opts.room.filter(|r| !r.is_empty()),
            videos: Arc::from(opts.videos),
            cancel,
        })
    }

    pub fn total_sessions(&self) -> usize {
        self.publishers.saturating_add(self.subscribers)
    }

    /// Tracks each publisher contributes.
    pub fn tracks_per_publisher(&self) -> u64 {
        u64::from(self.audio_bitrate > 0) + u64::from(self.video_bitrate > 0)
    }

    /// Tracks a subscriber should observe once every publisher is up.
    pub fn expected_tracks(&self) -> u64 {
        (self.publishers as u64).saturating_mul(self.tracks_per_publisher())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Session stats are keyed by display name, so explicit identities must be unique and
/// must not look like a generated `Sub <n>` name.
fn check_identities(ids: &[String]) -> Result<()> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if is_subscriber_name(id) {
            return Err(Error::ReservedIdentity(id.clone()));
        }
        if !seen.insert(id.as_str()) {
            return Err(Error::DuplicateIdentity(id.clone()));
        }
    }
    Ok(())
}

fn is_subscriber_name(id: &str) -> bool {
    id.strip_prefix("Sub ")
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}
