mod support;

use std::sync::Arc;
use std::time::Duration;

use mediaload_core::runner::{LoadTestOptions, Orchestrator};
use support::FakeFactory;
use tokio_util::sync::CancellationToken;

#[tokio::test(start_paused = true)]
async fn first_session_is_immediate_then_about_cap_per_second() {
    let factory = Arc::new(FakeFactory::new());
    let params = support::params(
        LoadTestOptions {
            publishers: 2,
            subscribers: 10,
            audio_bitrate: 20_000,
            duration: Some(Duration::from_millis(1)),
            num_per_second: Some(5.0),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let started = tokio::time::Instant::now();
    let run = Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));
    assert_eq!(run.testers.len(), 12);

    let admissions = factory.admissions();
    assert_eq!(admissions.len(), 12);

    let sequences: Vec<usize> = admissions.iter().map(|a| a.params.sequence).collect();
    assert_eq!(sequences, (0..12).collect::<Vec<_>>());

    let mut windows = [0usize; 4];
    for a in &admissions {
        let second = a.at.duration_since(started).as_secs() as usize;
        assert!(second < windows.len(), "admission at second {second}");
        windows[second] += 1;
    }
    assert_eq!(windows, [1, 5, 5, 1]);
}

#[tokio::test(start_paused = true)]
async fn higher_cap_admits_faster() {
    let factory = Arc::new(FakeFactory::new());
    let params = support::params(
        LoadTestOptions {
            publishers: 1,
            subscribers: 20,
            duration: Some(Duration::from_millis(1)),
            num_per_second: Some(10.0),
            ..LoadTestOptions::default()
        },
        CancellationToken::new(),
    );

    let started = tokio::time::Instant::now();
    Orchestrator::new(factory.clone())
        .run(&params)
        .await
        .unwrap_or_else(|e| panic!("run failed: {e}"));

    let admissions = factory.admissions();
    let in_second_one = admissions
        .iter()
        .filter(|a| a.at.duration_since(started).as_secs() == 1)
        .count();
    assert_eq!(admissions[0].at, started);
    assert_eq!(in_second_one, 10);
}
