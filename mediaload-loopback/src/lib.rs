//! In-process loopback room implementing the session contract.
//!
//! Every published track is pumped by a task that emits one packet per
//! [`LoopbackConfig::packet_interval`] to every other member of the room. Subscribers
//! account for those packets in their own [`TrackSet`](mediaload_stats::TrackSet), so
//! the whole harness can run without a real media service.

mod config;
mod error;
mod room;
mod session;

pub use config::{DEFAULT_PACKET_INTERVAL, LoopbackConfig};
pub use error::{Error, Result};
pub use room::LoopbackServer;
pub use session::{LoopbackFactory, LoopbackSession};
