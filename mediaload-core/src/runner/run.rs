use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use mediaload_stats::{MediaKind, TesterStats};
use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::admission::AdmissionScheduler;
use super::config::Params;
use super::error::{Error, Result};
use super::identity::random_token;
use super::progress::{ProgressFn, ProgressUpdate};
use super::session::{Session, SessionFactory, SessionParams, SessionRole};
use super::track_names::TrackNames;
use super::video::{VideoCursor, VideoSpec};

/// Everything collected from one completed run.
#[derive(Debug)]
pub struct RunStats {
    pub room: String,
    pub started_at: Instant,
    pub finished_at: Instant,
    /// Final stats keyed by session display name.
    pub testers: BTreeMap<String, TesterStats>,
    /// Display names of the publisher sessions in `testers`.
    pub publishers: BTreeSet<String>,
    pub track_names: Arc<TrackNames>,
}

impl RunStats {
    pub fn elapsed(&self) -> Duration {
        self.finished_at.saturating_duration_since(self.started_at)
    }

    pub fn is_publisher(&self, name: &str) -> bool {
        self.publishers.contains(name)
    }

    /// Subscriber sessions, in name order.
    pub fn subscribers(&self) -> impl Iterator<Item = (&String, &TesterStats)> {
        self.testers
            .iter()
            .filter(|(name, _)| !self.is_publisher(name))
    }
}

/// What a publisher puts into the room once its session is up.
#[derive(Debug, Clone)]
struct PublishPlan {
    sequence: usize,
    audio_bitrate: u32,
    video_bitrate: u32,
    simulcast: bool,
    /// Assigned fixture; its encoded bitrate replaces `video_bitrate`.
    video: Option<VideoSpec>,
}

/// Drives one pass: admit every session under the rate cap, hold them open for the
/// configured duration, then stop them and collect their stats.
pub struct Orchestrator<F> {
    factory: Arc<F>,
    progress: Option<ProgressFn>,
}

impl<F> Orchestrator<F>
where
    F: SessionFactory,
{
    pub fn new(factory: Arc<F>) -> Self {
        Self {
            factory,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    fn emit(&self, update: ProgressUpdate) {
        if let Some(progress) = &self.progress {
            (progress)(update);
        }
    }

    pub async fn run(&self, params: &Params) -> Result<RunStats> {
        let room = params.room.clone().unwrap_or_else(|| random_token(5));
        let identity_prefix = random_token(5);
        let expected_tracks = params.expected_tracks();
        let total = params.total_sessions();

        tracing::info!(
            publishers = params.publishers,
            subscribers = params.subscribers,
            room = %room,
            expected_tracks,
            "starting load test"
        );

        let track_names = Arc::new(TrackNames::default());
        let mut videos = VideoCursor::new(params.videos.clone());
        let failed = CancellationToken::new();
        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        let mut sessions: Vec<(String, Arc<F::Session>)> = Vec::with_capacity(total);
        let mut publishers = BTreeSet::new();

        let mut scheduler = AdmissionScheduler::new(params.num_per_second);
        let started_at = Instant::now();

        for sequence in 0..total {
            if failed.is_cancelled() {
                break;
            }

            let session_params = self.session_params(
                params,
                sequence,
                &room,
                &identity_prefix,
                expected_tracks,
                &mut videos,
            );
            let name = session_params.name.clone();
            let plan = session_params.is_publisher().then_some(PublishPlan {
                sequence,
                audio_bitrate: params.audio_bitrate,
                video_bitrate: params.video_bitrate,
                simulcast: params.simulcast,
                video: session_params.video.clone(),
            });
            if plan.is_some() {
                publishers.insert(name.clone());
            }

            tracing::debug!(sequence, name = %name, "admitting session");
            let session = Arc::new(self.factory.create(session_params));
            sessions.push((name.clone(), session.clone()));

            let names = track_names.clone();
            let failed_task = failed.clone();
            tasks.spawn(async move {
                let res = admit_session(session.as_ref(), &name, plan, &names).await;
                if let Err(err) = &res {
                    tracing::warn!(session = %name, error = %err, "session failed");
                    failed_task.cancel();
                }
                res
            });

            let admitted = scheduler.record_admission();
            self.emit(ProgressUpdate::Admitting {
                admitted,
                total: total as u64,
                elapsed: started_at.elapsed(),
                rate: scheduler.realized_rate(Instant::now()),
            });

            let paced = tokio::select! {
                res = scheduler.pace(&params.cancel) => res,
                () = failed.cancelled() => Ok(()),
            };
            if let Err(err) = paced {
                tracing::info!(admitted, "load test cancelled during admission");
                abort_tasks(&mut tasks).await;
                stop_sessions(&sessions).await;
                return Err(err);
            }
        }

        if let Err(err) = self.join_tasks(&mut tasks, &params.cancel).await {
            abort_tasks(&mut tasks).await;
            stop_sessions(&sessions).await;
            return Err(err);
        }

        self.hold(params, started_at, sessions.len() as u64).await;

        self.emit(ProgressUpdate::Stopping {
            sessions: sessions.len() as u64,
        });

        let mut testers = BTreeMap::new();
        for (name, session) in &sessions {
            session.stop().await;
            match session.stats() {
                Some(stats) => {
                    testers.insert(name.clone(), stats);
                }
                None => tracing::warn!(session = %name, "session returned no stats after stop"),
            }
        }

        let finished_at = Instant::now();
        tracing::info!(
            sessions = testers.len(),
            elapsed_ms = finished_at.duration_since(started_at).as_millis() as u64,
            "load test finished"
        );

        Ok(RunStats {
            room,
            started_at,
            finished_at,
            testers,
            publishers,
            track_names,
        })
    }

    fn session_params(
        &self,
        params: &Params,
        sequence: usize,
        room: &str,
        identity_prefix: &str,
        expected_tracks: u64,
        videos: &mut VideoCursor,
    ) -> SessionParams {
        let is_publisher = sequence < params.publishers;
        let role = if is_publisher {
            SessionRole::Publisher
        } else {
            SessionRole::Subscriber
        };

        let explicit = params
            .identities
            .as_ref()
            .filter(|_| is_publisher)
            .and_then(|ids| ids.get(sequence))
            .cloned();

        let name = match (&explicit, role) {
            (Some(id), _) => id.clone(),
            (None, SessionRole::Publisher) => format!("Pub {sequence}"),
            (None, SessionRole::Subscriber) => {
                format!("Sub {}", sequence - params.publishers)
            }
        };

        let (expected_tracks, video) = if is_publisher {
            let video = (params.video_bitrate > 0)
                .then(|| videos.next_spec())
                .flatten();
            (
                expected_tracks.saturating_sub(params.tracks_per_publisher()),
                video,
            )
        } else {
            (expected_tracks, None)
        };

        SessionParams {
            sequence,
            name,
            identity: explicit.unwrap_or_else(|| format!("{identity_prefix}_{sequence}")),
            role,
            room: room.to_string(),
            expected_tracks,
            video,
        }
    }

    /// Waits for every admission task. The first failure wins; cancellation of the run
    /// while waiting is reported as [`Error::Cancelled`].
    async fn join_tasks(
        &self,
        tasks: &mut JoinSet<Result<()>>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        loop {
            let next = tokio::select! {
                next = tasks.join_next() => next,
                () = cancel.cancelled() => return Err(Error::Cancelled),
            };

            match next {
                None => return Ok(()),
                Some(Ok(Ok(()))) => {}
                Some(Ok(Err(err))) => return Err(err),
                Some(Err(join)) if join.is_cancelled() => {}
                Some(Err(join)) => return Err(Error::Join(join)),
            }
        }
    }

    /// Holds the admitted sessions open until the duration elapses or the run is cancelled.
    async fn hold(&self, params: &Params, started_at: Instant, sessions: u64) {
        let deadline = params
            .duration
            .map(|d| Instant::now() + d);

        let expired = async {
            match deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                () = &mut expired => break,
                () = params.cancel.cancelled() => {
                    tracing::info!("load test cancelled, collecting stats");
                    break;
                }
                _ = ticker.tick() => self.emit(ProgressUpdate::Running {
                    elapsed: started_at.elapsed(),
                    duration: params.duration,
                    sessions,
                }),
            }
        }
    }
}

async fn admit_session<S: Session>(
    session: &S,
    name: &str,
    plan: Option<PublishPlan>,
    names: &TrackNames,
) -> Result<()> {
    session.start().await.map_err(|err| Error::Session {
        name: name.to_string(),
        source: Box::new(err),
    })?;

    let Some(plan) = plan else {
        return Ok(());
    };

    if plan.audio_bitrate > 0 {
        let track = session
            .publish_track("audio", MediaKind::Audio, plan.audio_bitrate)
            .await
            .map_err(|err| Error::Publish {
                name: name.to_string(),
                track: "audio",
                source: Box::new(err),
            })?;
        names.register(track, format!("{}A", plan.sequence));
    }

    if plan.video_bitrate > 0 {
        let (label, bitrate) = match &plan.video {
            Some(video) => {
                tracing::debug!(
                    session = %name,
                    video = %video.file_name(),
                    width = video.width(),
                    height = video.height,
                    fps = video.fps,
                    "publishing video fixture"
                );
                (video.file_name(), video.bitrate_bps())
            }
            None if plan.simulcast => ("video-simulcast".to_string(), plan.video_bitrate),
            None => ("video".to_string(), plan.video_bitrate),
        };

        let published = if plan.simulcast {
            session
                .publish_simulcast_track(&label, bitrate, plan.sequence as u64)
                .await
        } else {
            session
                .publish_track(&label, MediaKind::Video, bitrate)
                .await
        };
        let track = published.map_err(|err| Error::Publish {
            name: name.to_string(),
            track: "video",
            source: Box::new(err),
        })?;
        names.register(track, format!("{}V", plan.sequence));
    }

    Ok(())
}

async fn abort_tasks(tasks: &mut JoinSet<Result<()>>) {
    tasks.abort_all();
    while tasks.join_next().await.is_some() {}
}

async fn stop_sessions<S: Session>(sessions: &[(String, Arc<S>)]) {
    for (_, session) in sessions {
        session.stop().await;
    }
}
