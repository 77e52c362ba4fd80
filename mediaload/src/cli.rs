use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub(crate) fn parse_duration(input: &str) -> Result<Duration, String> {
    let s = input.trim();
    if s.is_empty() {
        return Err("duration cannot be empty (expected e.g. 10s, 250ms, 1m)".to_string());
    }

    let number_end = s
        .char_indices()
        .find(|(_, ch)| !ch.is_ascii_digit())
        .map_or(s.len(), |(idx, _)| idx);

    if number_end == 0 {
        return Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        ));
    }

    let (number_str, unit_str) = s.split_at(number_end);
    let value: u64 = number_str
        .parse()
        .map_err(|_| format!("invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"))?;

    match unit_str.trim() {
        "" | "s" | "sec" | "secs" | "second" | "seconds" => Ok(Duration::from_secs(value)),
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => {
            Ok(Duration::from_millis(value))
        }
        "m" | "min" | "mins" | "minute" | "minutes" => {
            let secs = value
                .checked_mul(60)
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        "h" | "hr" | "hrs" | "hour" | "hours" => {
            let secs = value
                .checked_mul(60)
                .and_then(|v| v.checked_mul(60))
                .ok_or_else(|| format!("duration '{s}' is too large"))?;
            Ok(Duration::from_secs(secs))
        }
        _ => Err(format!(
            "invalid duration '{s}' (expected e.g. 10s, 250ms, 1m)"
        )),
    }
}

/// Bits per second, with optional `k` / `m` suffix (`500k`, `1.5m`, `20000`).
pub(crate) fn parse_bitrate(input: &str) -> Result<u32, String> {
    let s = input.trim().to_ascii_lowercase();
    let invalid = || format!("invalid bitrate '{input}' (expected e.g. 20000, 500k, 1.5m)");

    let s = s.strip_suffix("bps").unwrap_or(&s);
    let (number, scale) = match s.chars().last() {
        Some('k') => (&s[..s.len() - 1], 1_000.0),
        Some('m') => (&s[..s.len() - 1], 1_000_000.0),
        _ => (s, 1.0),
    };

    let value: f64 = number.trim().parse().map_err(|_| invalid())?;
    let bps = value * scale;
    if !bps.is_finite() || bps < 0.0 || bps > f64::from(u32::MAX) {
        return Err(invalid());
    }
    Ok(bps.round() as u32)
}

fn parse_loss(input: &str) -> Result<f64, String> {
    let v: f64 = input
        .trim()
        .parse()
        .map_err(|_| format!("invalid loss '{input}' (expected a number in 0..=1)"))?;
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("loss must be within 0..=1 (got {v})"));
    }
    Ok(v)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable progress and report.
    #[default]
    HumanReadable,
    /// Emit JSON progress and result lines (NDJSON) to stdout.
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "mediaload",
    author,
    version,
    about = "Load generator for real-time media rooms",
    long_about = "mediaload admits simulated publishers and subscribers into a media room under a rate cap, keeps them connected for a fixed duration and reports what every subscriber received.\n\nSessions run against an in-process loopback room, so runs are reproducible without an external service.",
    after_help = "Examples:\n  mediaload run --publishers 2 --subscribers 10 --audio-bitrate 20k --video-bitrate 500k --duration 30s\n  mediaload run --identity-range 100-109 --subscribers 50 --output json\n  mediaload suite --duration 10s --video-bitrate 1m"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one load test and print the per-subscriber report
    Run(LoadArgs),

    /// Run the fixed matrix of publisher/subscriber/video cases
    #[command(
        long_about = "Run the built-in case matrix one case after another.\n\nEach case forces simulcast on, overrides the publisher and subscriber counts and holds for --duration (15s when unset)."
    )]
    Suite(LoadArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct LoadArgs {
    /// Number of publishing sessions
    #[arg(long, env = "MEDIALOAD_PUBLISHERS")]
    pub publishers: Option<usize>,

    /// Number of subscribing sessions
    #[arg(long, env = "MEDIALOAD_SUBSCRIBERS")]
    pub subscribers: Option<usize>,

    /// Audio bitrate per publisher (0 disables audio)
    #[arg(long, value_parser = parse_bitrate)]
    pub audio_bitrate: Option<u32>,

    /// Video bitrate per publisher (0 disables video)
    #[arg(long, value_parser = parse_bitrate)]
    pub video_bitrate: Option<u32>,

    /// How long to hold sessions open (e.g. 10s, 1m; 0 runs until interrupted)
    #[arg(long, value_parser = parse_duration)]
    pub duration: Option<Duration>,

    /// Admission cap in sessions per second (default 5, at most 10)
    #[arg(long)]
    pub num_per_second: Option<f64>,

    /// Publish video as simulcast
    #[arg(long)]
    pub simulcast: bool,

    /// Publisher identity (repeatable); sets the publisher count
    #[arg(long = "identity", value_name = "IDENTITY")]
    pub identities: Vec<String>,

    /// Inclusive publisher identity range, e.g. 100-109
    #[arg(long, value_name = "FIRST-LAST")]
    pub identity_range: Option<String>,

    /// Room to join (random 5-letter name when unset)
    #[arg(long, env = "MEDIALOAD_ROOM")]
    pub room: Option<String>,

    /// Directory of `<prefix>_<height>_<kbps>_<fps>.h264` fixtures handed out to publishers
    #[arg(long)]
    pub video_dir: Option<PathBuf>,

    /// YAML file with defaults for any of the options above
    #[arg(long, value_name = "FILE", env = "MEDIALOAD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Loopback packet loss probability (0..=1)
    #[arg(long, value_parser = parse_loss)]
    pub loss: Option<f64>,

    /// Loopback base one-way latency (e.g. 30ms)
    #[arg(long, value_parser = parse_duration)]
    pub latency: Option<Duration>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::HumanReadable)]
    pub output: OutputFormat,

    /// Log run progress at info level (overridden by RUST_LOG)
    #[arg(long, short)]
    pub verbose: bool,
}
