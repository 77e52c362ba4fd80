use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;

use crate::cli::{LoadArgs, parse_bitrate, parse_duration};

/// Optional YAML defaults; every key mirrors a `LoadArgs` flag.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "snake_case")]
pub(crate) struct FileConfig {
    pub publishers: Option<usize>,
    pub subscribers: Option<usize>,
    pub audio_bitrate: Option<Bitrate>,
    pub video_bitrate: Option<Bitrate>,
    pub duration: Option<String>,
    pub num_per_second: Option<f64>,
    pub simulcast: Option<bool>,
    #[serde(default)]
    pub identities: Vec<String>,
    pub identity_range: Option<String>,
    pub room: Option<String>,
    pub video_dir: Option<PathBuf>,
    pub loss: Option<f64>,
    pub latency: Option<String>,
}

/// `20000` or `"500k"`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Bitrate {
    Bps(u32),
    Text(String),
}

impl Bitrate {
    fn resolve(&self) -> anyhow::Result<u32> {
        match self {
            Self::Bps(v) => Ok(*v),
            Self::Text(s) => parse_bitrate(s).map_err(anyhow::Error::msg),
        }
    }
}

impl FileConfig {
    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file: {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Fills every option the command line left unset. CLI flags always win.
    pub(crate) fn apply(self, args: &mut LoadArgs) -> anyhow::Result<()> {
        args.publishers = args.publishers.or(self.publishers);
        args.subscribers = args.subscribers.or(self.subscribers);

        if args.audio_bitrate.is_none() {
            args.audio_bitrate = self
                .audio_bitrate
                .as_ref()
                .map(Bitrate::resolve)
                .transpose()
                .context("audio_bitrate")?;
        }
        if args.video_bitrate.is_none() {
            args.video_bitrate = self
                .video_bitrate
                .as_ref()
                .map(Bitrate::resolve)
                .transpose()
                .context("video_bitrate")?;
        }
        if args.duration.is_none() {
            args.duration = parse_opt_duration(self.duration.as_deref()).context("duration")?;
        }
        if args.latency.is_none() {
            args.latency = parse_opt_duration(self.latency.as_deref()).context("latency")?;
        }

        args.num_per_second = args.num_per_second.or(self.num_per_second);
        args.simulcast = args.simulcast || self.simulcast.unwrap_or(false);
        if args.identities.is_empty() {
            args.identities = self.identities;
        }
        args.identity_range = args.identity_range.take().or(self.identity_range);
        args.room = args.room.take().or(self.room);
        args.video_dir = args.video_dir.take().or(self.video_dir);

        if args.loss.is_none() {
            if let Some(loss) = self.loss
                && !(0.0..=1.0).contains(&loss)
            {
                anyhow::bail!("loss must be within 0..=1 (got {loss})");
            }
            args.loss = self.loss;
        }

        Ok(())
    }
}

fn parse_opt_duration(s: Option<&str>) -> anyhow::Result<Option<Duration>> {
    s.map(parse_duration)
        .transpose()
        .map_err(anyhow::Error::msg)
}
