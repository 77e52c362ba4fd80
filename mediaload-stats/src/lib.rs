pub mod format;
pub mod summary;
pub mod tester;
pub mod track;

pub use format::{
    UNAVAILABLE, format_bitrate, format_bps, format_latency, format_latency_and_dropped,
    format_percentage,
};
pub use summary::{Summary, TotalSummary};
pub use tester::TesterStats;
pub use track::{MediaKind, TrackCounters, TrackId, TrackSet, TrackStats};
