#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mediaload_core::runner::{LoadTestOptions, Params};
use mediaload_loopback::{LoopbackConfig, LoopbackFactory, LoopbackServer};
use tokio_util::sync::CancellationToken;

pub fn loopback(config: LoopbackConfig) -> (Arc<LoopbackServer>, Arc<LoopbackFactory>) {
    let server = Arc::new(LoopbackServer::new(config));
    let factory = Arc::new(LoopbackFactory::new(server.clone()));
    (server, factory)
}

pub fn one_to_one(room: &str, duration: Duration) -> LoadTestOptions {
    LoadTestOptions {
        publishers: 1,
        subscribers: 1,
        audio_bitrate: 20_000,
        video_bitrate: 500_000,
        duration: Some(duration),
        room: Some(room.to_string()),
        ..LoadTestOptions::default()
    }
}

pub fn params(opts: LoadTestOptions) -> Params {
    Params::from_options(opts, CancellationToken::new())
        .unwrap_or_else(|e| panic!("valid options: {e}"))
}
