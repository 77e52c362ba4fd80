use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{Error, Result};

const BACKOFF: Duration = Duration::from_secs(1);

/// Gates how fast sessions are admitted into a run.
///
/// After every admission the realized rate (`admitted / elapsed`) is compared with the cap;
/// while it is above the cap the caller backs off for one second and re-evaluates. Right
/// after the first admission the elapsed time is ~0, so the realized rate is unbounded and
/// the second admission always waits about a second. The resulting shape is a burst of one
/// followed by roughly `cap` sessions per second.
#[derive(Debug)]
pub struct AdmissionScheduler {
    cap_per_sec: f64,
    started_at: Instant,
    admitted: u64,
}

impl AdmissionScheduler {
    pub fn new(cap_per_sec: f64) -> Self {
        Self::starting_at(cap_per_sec, Instant::now())
    }

    pub fn starting_at(cap_per_sec: f64, started_at: Instant) -> Self {
        Self {
            cap_per_sec,
            started_at,
            admitted: 0,
        }
    }

    /// Counts one dispatched session. Returns the new admitted count.
    pub fn record_admission(&mut self) -> u64 {
        self.admitted = self.admitted.saturating_add(1);
        self.admitted
    }

    pub fn realized_rate(&self, now: Instant) -> f64 {
        let elapsed = now.saturating_duration_since(self.started_at).as_secs_f64();
        if elapsed <= 0.0 {
            return f64::INFINITY;
        }
        (self.admitted as f64) / elapsed
    }

    /// Waits until the realized rate is at or below the cap.
    ///
    /// Fails with [`Error::Cancelled`] as soon as `cancel` is observed.
    pub async fn pace(&self, cancel: &CancellationToken) -> Result<()> {
        loop {
            let rate = self.realized_rate(Instant::now());
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            if rate <= self.cap_per_sec {
                return Ok(());
            }

            tracing::trace!(
                admitted = self.admitted,
                rate,
                cap = self.cap_per_sec,
                "admission rate above cap, backing off"
            );
            tokio::select! {
                () = tokio::time::sleep(BACKOFF) => {}
                () = cancel.cancelled() => {}
            }
        }
    }
}
