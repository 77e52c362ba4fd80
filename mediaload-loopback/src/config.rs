use std::collections::HashSet;
use std::time::Duration;

pub const DEFAULT_PACKET_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug, Clone)]
pub struct LoopbackConfig {
    /// Spacing between packets of one track.
    pub packet_interval: Duration,
    /// Base one-way latency recorded for every delivered packet.
    pub latency: Duration,
    /// Upper bound of the random extra latency added per packet.
    pub jitter: Duration,
    /// Probability in `0.0..=1.0` that a packet is dropped on its way to one subscriber.
    pub loss: f64,
    /// Seed for the per-track loss/jitter generators.
    pub seed: u64,
    /// Session names (or identities) whose `start()` fails.
    pub fail_start: HashSet<String>,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            packet_interval: DEFAULT_PACKET_INTERVAL,
            latency: Duration::from_millis(30),
            jitter: Duration::from_millis(10),
            loss: 0.0,
            seed: 0,
            fail_start: HashSet::new(),
        }
    }
}

impl LoopbackConfig {
    /// Payload size of one packet for a track published at `bitrate` bps.
    pub fn packet_bytes(&self, bitrate: u32) -> u64 {
        let micros = self.packet_interval.as_micros() as u64;
        (u64::from(bitrate).saturating_mul(micros) / 8_000_000).max(1)
    }

    pub(crate) fn loss_probability(&self) -> f64 {
        if self.loss.is_finite() {
            self.loss.clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub(crate) fn should_fail(&self, name: &str, identity: &str) -> bool {
        self.fail_start.contains(name) || self.fail_start.contains(identity)
    }
}
