use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng as _, SeedableRng as _};

use super::error::{Error, Result};

const VIDEO_EXTENSION: &str = "h264";

/// Tallest fixture accepted (8K UHD).
const MAX_VIDEO_HEIGHT: u32 = 4320;

/// One pre-encoded video fixture, described by its file name
/// `<prefix>_<height>_<kbps>_<fps>.h264`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSpec {
    pub prefix: String,
    pub height: u32,
    pub kbps: u32,
    pub fps: u32,
}

impl VideoSpec {
    pub fn parse_file_name(name: &str) -> Result<Self> {
        let invalid = || Error::InvalidVideoSpec(name.to_string());

        let stem = name
            .strip_suffix(VIDEO_EXTENSION)
            .and_then(|s| s.strip_suffix('.'))
            .ok_or_else(invalid)?;

        let parts: Vec<&str> = stem.split('_').collect();
        let [prefix, height, kbps, fps] = parts.as_slice() else {
            return Err(invalid());
        };
        if prefix.is_empty() {
            return Err(invalid());
        }

        let positive = |v: &str| match v.parse::<u32>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(invalid()),
        };
        let height = positive(*height)?;
        if height > MAX_VIDEO_HEIGHT {
            return Err(invalid());
        }

        Ok(Self {
            prefix: (*prefix).to_string(),
            height,
            kbps: positive(*kbps)?,
            fps: positive(*fps)?,
        })
    }

    pub fn file_name(&self) -> String {
        format!(
            "{}_{}_{}_{}.{VIDEO_EXTENSION}",
            self.prefix, self.height, self.kbps, self.fps
        )
    }

    /// 16:9 width for this fixture's height.
    pub fn width(&self) -> u32 {
        u32::try_from(u64::from(self.height) * 16 / 9).unwrap_or(u32::MAX)
    }

    pub fn bitrate_bps(&self) -> u32 {
        self.kbps.saturating_mul(1000)
    }
}

/// Loads every video spec in `dir`, sorted by file name. `.gitkeep` is ignored.
pub fn load_video_dir(dir: &Path) -> Result<Vec<VideoSpec>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == ".gitkeep" {
            continue;
        }
        names.push(name);
    }
    names.sort();

    let specs = names
        .iter()
        .map(|n| VideoSpec::parse_file_name(n))
        .collect::<Result<Vec<_>>>()?;
    tracing::debug!(dir = %dir.display(), videos = specs.len(), "loaded video catalog");
    Ok(specs)
}

/// Hands out video specs to publishers within one run: each unused spec once, in order,
/// then random already-used specs.
#[derive(Debug)]
pub struct VideoCursor {
    specs: Arc<[VideoSpec]>,
    next: usize,
    rng: StdRng,
}

impl VideoCursor {
    pub fn new(specs: Arc<[VideoSpec]>) -> Self {
        Self {
            specs,
            next: 0,
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn with_seed(specs: Arc<[VideoSpec]>, seed: u64) -> Self {
        Self {
            specs,
            next: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn next_spec(&mut self) -> Option<VideoSpec> {
        if self.specs.is_empty() {
            return None;
        }
        if let Some(spec) = self.specs.get(self.next) {
            self.next += 1;
            return Some(spec.clone());
        }

        tracing::debug!(
            total = self.specs.len(),
            "video catalog exhausted, reusing a random video"
        );
        let idx = self.rng.random_range(0..self.specs.len());
        self.specs.get(idx).cloned()
    }
}
