mod support;

use std::sync::Arc;
use std::time::Duration;

use mediaload_core::runner::{Error, LoadTestOptions, Orchestrator, SessionRole, VideoSpec};
use support::FakeFactory;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn names_roles_and_expected_tracks() {
    let factory = Arc::new(FakeFactory::new());
    let params = support::params(
        LoadTestOptions {
            publishers: 2,
            subscribers: 3,
            audio_bitrate: 20_000,
            video_bitrate: 500_000,
            duration: Some(Duration::from_secs(2)),
            room: Some("stage".to_string()),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let run = Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    assert_eq!(run.room, "stage");
    let names: Vec<&str> = run.testers.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["Pub 0", "Pub 1", "Sub 0", "Sub 1", "Sub 2"]);
    assert!(run.is_publisher("Pub 1"));
    assert!(!run.is_publisher("Sub 0"));

    let admissions = factory.admissions();
    for a in &admissions {
        assert_eq!(a.params.room, "stage");
        match a.params.role {
            SessionRole::Publisher => assert_eq!(a.params.expected_tracks, 2),
            SessionRole::Subscriber => assert_eq!(a.params.expected_tracks, 4),
        }
    }

    // Anonymous identities share one per-run prefix.
    let prefix = admissions[0]
        .params
        .identity
        .split('_')
        .next()
        .unwrap_or_default()
        .to_string();
    assert_eq!(prefix.len(), 5);
    assert_eq!(admissions[4].params.identity, format!("{prefix}_4"));

    assert_eq!(factory.published().len(), 4);
    assert_eq!(run.track_names.len(), 4);
    assert_eq!(run.track_names.get("TR_0_audio").as_deref(), Some("0A"));
    assert_eq!(run.track_names.get("TR_1_video").as_deref(), Some("1V"));
    assert_eq!(factory.stopped(), 5);
    assert!(run.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn simulcast_and_explicit_identities() {
    let factory = Arc::new(FakeFactory::new());
    let params = support::params(
        LoadTestOptions {
            publishers: 7,
            subscribers: 1,
            video_bitrate: 500_000,
            simulcast: true,
            identity_range: Some("41-42".to_string()),
            duration: Some(Duration::from_secs(1)),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let run = Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let names: Vec<&str> = run.testers.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["41", "42", "Sub 0"]);
    assert_eq!(run.track_names.get("TR_0_video-simulcast").as_deref(), Some("0V"));
    assert_eq!(run.track_names.get("TR_1_video-simulcast").as_deref(), Some("1V"));
    assert_eq!(run.testers["Sub 0"].expected_tracks(), 2);
}

#[tokio::test(start_paused = true)]
async fn cancel_during_hold_returns_stats() {
    let factory = Arc::new(FakeFactory::new());
    let cancel = CancellationToken::new();
    let params = support::params(
        LoadTestOptions {
            publishers: 1,
            subscribers: 2,
            audio_bitrate: 20_000,
            ..LoadTestOptions::default()
        },
        cancel.clone(),
    );

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(30)).await;
        trigger.cancel();
    });

    let run = Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("cancel during hold must not fail: {e}"));

    assert_eq!(run.testers.len(), 3);
    assert_eq!(factory.stopped(), 3);
    assert_eq!(run.testers["Sub 1"].len(), 1);
    assert!(run.elapsed() >= Duration::from_secs(30), "elapsed {:?}", run.elapsed());
}

#[tokio::test(start_paused = true)]
async fn video_fixtures_set_published_bitrate() {
    let fixture = |prefix: &str, height: u32, kbps: u32| VideoSpec {
        prefix: prefix.to_string(),
        height,
        kbps,
        fps: 30,
    };
    let factory = Arc::new(FakeFactory::new());
    let params = support::params(
        LoadTestOptions {
            publishers: 3,
            subscribers: 1,
            video_bitrate: 500_000,
            videos: vec![fixture("low", 360, 800), fixture("high", 720, 2000)],
            duration: Some(Duration::from_secs(1)),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let run = Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let bitrates = factory.published_bitrates();
    assert_eq!(bitrates.len(), 3);
    assert_eq!(bitrates.get("TR_0_low_360_800_30.h264"), Some(&800_000));
    assert_eq!(bitrates.get("TR_1_high_720_2000_30.h264"), Some(&2_000_000));
    // Once the catalog is used up, fixtures are reused.
    let reused: Vec<u32> = bitrates
        .iter()
        .filter(|(id, _)| id.starts_with("TR_2_"))
        .map(|(_, b)| *b)
        .collect();
    assert!(matches!(reused.as_slice(), [800_000] | [2_000_000]), "got {reused:?}");

    assert_eq!(
        run.track_names.get("TR_1_high_720_2000_30.h264").as_deref(),
        Some("1V")
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_during_admission_stops_admitting() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let factory = Arc::new(FakeFactory::new().on_create(move |p| {
        if p.sequence == 3 {
            trigger.cancel();
        }
    }));
    let params = support::params(
        LoadTestOptions {
            publishers: 2,
            subscribers: 8,
            duration: Some(Duration::from_secs(5)),
            ..LoadTestOptions::default()
        },
        cancel,
    );

    let res = Orchestrator::new(factory.clone()).run(&params).await;
    assert!(matches!(res, Err(Error::Cancelled)), "got {res:?}");
    assert_eq!(factory.admitted(), 4);
    assert_eq!(factory.stopped(), 4);
}

#[tokio::test(start_paused = true)]
async fn start_failure_names_the_session() {
    let factory = Arc::new(FakeFactory::new().failing_start("Sub 1"));
    let params = support::params(
        LoadTestOptions {
            publishers: 1,
            subscribers: 20,
            duration: Some(Duration::from_secs(5)),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let res = Orchestrator::new(factory.clone()).run(&params).await;
    let err = match res {
        Err(err) => err,
        Ok(_) => panic!("expected failure"),
    };
    assert_eq!(err.session_name(), Some("Sub 1"));
    assert!(err.to_string().starts_with("could not connect Sub 1"));

    // Admission stops at the next back-off, once the failing task has run.
    assert_eq!(factory.admitted(), 6);
    assert_eq!(factory.stopped(), 6);
}

#[tokio::test(start_paused = true)]
async fn publish_failure_fails_the_run() {
    let factory = Arc::new(FakeFactory::new().failing_publish("Pub 0"));
    let params = support::params(
        LoadTestOptions {
            publishers: 1,
            subscribers: 1,
            audio_bitrate: 20_000,
            duration: Some(Duration::from_secs(1)),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let res = Orchestrator::new(factory).run(&params).await;
    assert!(
        matches!(&res, Err(Error::Publish { name, track: "audio", .. }) if name == "Pub 0"),
        "got {res:?}"
    );
}
