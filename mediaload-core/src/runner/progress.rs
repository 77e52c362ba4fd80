use std::sync::Arc;
use std::time::Duration;

pub type ProgressFn = Arc<dyn Fn(ProgressUpdate) + Send + Sync + 'static>;

#[derive(Debug, Clone)]
pub enum ProgressUpdate {
    /// Emitted after each session is dispatched.
    Admitting {
        admitted: u64,
        total: u64,
        elapsed: Duration,
        rate: f64,
    },
    /// Emitted about once per second while the run holds its sessions open.
    Running {
        elapsed: Duration,
        duration: Option<Duration>,
        sessions: u64,
    },
    Stopping {
        sessions: u64,
    },
}
