use std::sync::Arc;

use anyhow::Context as _;
use mediaload_core::runner::{LoadTest, LoadTestOptions, Params, load_video_dir};
use mediaload_loopback::{LoopbackConfig, LoopbackFactory, LoopbackServer};
use tokio_util::sync::CancellationToken;

use crate::cli::LoadArgs;
use crate::config_file::FileConfig;
use crate::exit_codes::ExitCode;
use crate::output::{self, Mode};
use crate::run_error::RunError;

pub async fn run(args: LoadArgs, mode: Mode) -> Result<ExitCode, RunError> {
    let args = resolve_args(args).map_err(RunError::InvalidInput)?;
    let out = output::formatter(args.output);

    let cancel = CancellationToken::new();
    let params = Params::from_options(load_options(&args)?, cancel.clone())?;
    let interrupt = spawn_interrupt_watcher(cancel.clone());

    let server = Arc::new(LoopbackServer::new(loopback_config(&args)));
    let test = LoadTest::new(params, Arc::new(LoopbackFactory::new(server)))
        .with_progress(out.progress());

    out.print_header(test.params(), mode);

    let result = match mode {
        Mode::Run => run_once(&test, out.as_ref()).await,
        Mode::Suite => run_suite(&test, out.as_ref()).await,
    };

    interrupt.abort();
    result
}

async fn run_once(
    test: &LoadTest<LoopbackFactory>,
    out: &dyn output::OutputFormatter,
) -> Result<ExitCode, RunError> {
    let report = test.run().await?;
    out.print_report(&report).map_err(RunError::RuntimeError)?;
    Ok(ExitCode::Success)
}

async fn run_suite(
    test: &LoadTest<LoopbackFactory>,
    out: &dyn output::OutputFormatter,
) -> Result<ExitCode, RunError> {
    let mut report = test.run_suite(|row| out.print_suite_row(row)).await;
    out.print_suite_end(&report)
        .map_err(RunError::RuntimeError)?;

    if let Some(err) = report.error.take() {
        return Err(err.into());
    }
    if report.cancelled {
        return Ok(ExitCode::Interrupted);
    }
    Ok(ExitCode::Success)
}

/// CLI flags merged over the optional config file.
fn resolve_args(mut args: LoadArgs) -> anyhow::Result<LoadArgs> {
    if let Some(path) = args.config.clone() {
        FileConfig::load(&path)?.apply(&mut args)?;
    }
    Ok(args)
}

fn load_options(args: &LoadArgs) -> Result<LoadTestOptions, RunError> {
    let videos = match &args.video_dir {
        Some(dir) => load_video_dir(dir)
            .with_context(|| format!("failed to load videos from {}", dir.display()))
            .map_err(RunError::InvalidInput)?,
        None => Vec::new(),
    };

    Ok(LoadTestOptions {
        publishers: args.publishers.unwrap_or(0),
        subscribers: args.subscribers.unwrap_or(0),
        audio_bitrate: args.audio_bitrate.unwrap_or(0),
        video_bitrate: args.video_bitrate.unwrap_or(0),
        duration: args.duration,
        num_per_second: args.num_per_second,
        simulcast: args.simulcast,
        identities: args.identities.clone(),
        identity_range: args.identity_range.clone(),
        room: args.room.clone(),
        videos,
    })
}

fn loopback_config(args: &LoadArgs) -> LoopbackConfig {
    let mut cfg = LoopbackConfig::default();
    if let Some(loss) = args.loss {
        cfg.loss = loss;
    }
    if let Some(latency) = args.latency {
        cfg.latency = latency;
    }
    cfg
}

/// Cancels the run on Ctrl-C.
fn spawn_interrupt_watcher(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, stopping sessions");
            cancel.cancel();
        }
    })
}
