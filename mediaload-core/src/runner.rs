mod admission;
mod config;
mod error;
mod identity;
mod load_test;
mod progress;
mod report;
mod run;
mod session;
mod suite;
mod track_names;
mod video;

pub use admission::AdmissionScheduler;
pub use config::{DEFAULT_NUM_PER_SECOND, LoadTestOptions, MAX_NUM_PER_SECOND, Params};
pub use error::{BoxError, Error, Result};
pub use identity::{parse_identity_range, random_token};
pub use load_test::LoadTest;
pub use progress::{ProgressFn, ProgressUpdate};
pub use report::{RunReport, TesterReport, TrackRow};
pub use run::{Orchestrator, RunStats};
pub use session::{Session, SessionFactory, SessionParams, SessionRole};
pub use suite::{
    DEFAULT_CASE_DURATION, SUITE_CASES, SuiteCase, SuiteReport, SuiteRow, run_suite,
};
pub use track_names::TrackNames;
pub use video::{VideoCursor, VideoSpec, load_video_dir};
