//! Frame loop integration tests
//!
//! Runs the narration loop over fake videos with a paused clock; time only
//! moves through frame decode intervals and post-speech pauses.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use beacon_sight::narration::TranslationTable;
use beacon_sight::vision::TracingDisplay;
use beacon_sight::voice::SpeechOutputRouter;
use beacon_sight::{
    Collaborators, FrameProcessingLoop, Language, NarrationSettings, RunSummary, Session,
};

mod common;

use common::{
    FakeCommentary, FakeDetector, FakeSource, RecordingSynth, ahead, left, recording_router, right,
};

const PAUSE: Duration = Duration::from_millis(1500);

fn settings(object_cooldown: Duration, commentary_cooldown: Duration) -> NarrationSettings {
    NarrationSettings {
        detection_stride: 5,
        fallback_fps: 30.0,
        object_cooldown,
        commentary_cooldown,
        post_speech_pause: PAUSE,
    }
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

async fn run_loop(
    source: &Arc<FakeSource>,
    detector: &Arc<FakeDetector>,
    commentary: &Arc<FakeCommentary>,
    router: &Arc<SpeechOutputRouter>,
    settings: NarrationSettings,
    videos: &[PathBuf],
) -> RunSummary {
    let (_quit_tx, quit_rx) = watch::channel(false);
    run_loop_until(source, detector, commentary, router, settings, videos, &quit_rx).await
}

async fn run_loop_until(
    source: &Arc<FakeSource>,
    detector: &Arc<FakeDetector>,
    commentary: &Arc<FakeCommentary>,
    router: &Arc<SpeechOutputRouter>,
    settings: NarrationSettings,
    videos: &[PathBuf],
    quit: &watch::Receiver<bool>,
) -> RunSummary {
    let frame_loop = FrameProcessingLoop::new(
        Collaborators {
            source: source.clone(),
            detector: detector.clone(),
            commentary: commentary.clone(),
            speech: router.clone(),
            display: Box::new(TracingDisplay),
        },
        TranslationTable::builtin(),
        settings,
    );
    frame_loop.run(videos, quit).await
}

#[tokio::test(start_paused = true)]
async fn test_object_announced_once_per_video() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(
        FakeSource::default()
            .with_video("a.mp4", 10)
            .with_video("b.mp4", 10),
    );
    let detector = Arc::new(
        FakeDetector::default()
            .on_frame(5, vec![ahead("person")])
            .on_frame(10, vec![ahead("person")]),
    );
    let commentary = Arc::new(FakeCommentary::replying("A calm street."));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        settings(Duration::ZERO, Duration::from_secs(1000)),
        &paths(&["a.mp4", "b.mp4"]),
    )
    .await;

    // Seen again within a video: silent. Next video: novel again.
    assert_eq!(
        english.spoken(),
        vec!["I see A person ahead.", "A calm street.", "I see A person ahead."]
    );
    assert_eq!(summary.videos_completed, 2);
    assert_eq!(summary.frames_read, 20);
    assert_eq!(summary.frames_detected, 4);
    assert_eq!(summary.object_announcements, 2);
    assert_eq!(summary.commentaries, 1);
    assert!(!summary.quit);
}

#[tokio::test(start_paused = true)]
async fn test_same_label_in_two_zones_is_two_objects() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 5));
    let detector = Arc::new(FakeDetector::default().on_frame(5, vec![left("car"), right("car")]));
    let commentary = Arc::new(FakeCommentary::replying("Two cars pass by."));

    run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(
        english.spoken(),
        vec![
            "I see A car to your left, A car to your right.",
            "Two cars pass by."
        ]
    );
    assert_eq!(
        commentary.prompts(),
        vec![
            "A person is walking and sees: A car to your left, A car to your right. \
             Describe the scene for a visually impaired person."
        ]
    );
    assert_eq!(
        session.last_object_announcement().as_deref(),
        Some("I see A car to your left, A car to your right.")
    );
    assert_eq!(session.last_commentary().as_deref(), Some("Two cars pass by."));
}

#[tokio::test(start_paused = true)]
async fn test_object_announcements_respect_cooldown() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let recorded = times.clone();
    let english = Arc::new(RecordingSynth::default().on_speak(move |text| {
        if text.starts_with("I see") {
            recorded.lock().unwrap().push(Instant::now());
        }
    }));
    let session = Session::new(Language::English);
    let router =
        Arc::new(SpeechOutputRouter::new(session.clone()).with_engine(Language::English, english));

    // One decoded frame per second, a new object on every frame
    let mut detector = FakeDetector::default();
    for index in 1..=30 {
        detector = detector.on_frame(index, vec![ahead(&format!("thing{index}"))]);
    }
    let detector = Arc::new(detector);
    let source = Arc::new(
        FakeSource::default()
            .with_video("a.mp4", 30)
            .with_frame_interval(Duration::from_secs(1)),
    );
    let commentary = Arc::new(FakeCommentary::replying("Busy."));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings {
            detection_stride: 1,
            ..settings(Duration::from_secs(8), Duration::from_secs(1000))
        },
        &paths(&["a.mp4"]),
    )
    .await;

    let times = times.lock().unwrap().clone();
    assert!(times.len() >= 3, "expected several announcements, got {}", times.len());
    assert!(times.len() < 30);
    for pair in times.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_secs(8));
    }
    assert_eq!(summary.object_announcements, times.len() as u64);
    assert_eq!(commentary.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_commentary_consumes_window() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 10));
    let detector = Arc::new(
        FakeDetector::default()
            .on_frame(5, vec![ahead("person")])
            .on_frame(10, vec![left("dog")]),
    );
    let commentary = Arc::new(FakeCommentary::failing());

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        settings(Duration::ZERO, Duration::from_secs(10)),
        &paths(&["a.mp4"]),
    )
    .await;

    // Frame 10 comes 3s later: still inside the 10s commentary window
    assert_eq!(commentary.calls(), 1);
    assert_eq!(
        english.spoken(),
        vec!["I see A person ahead.", "I see A dog to your left."]
    );
    assert_eq!(summary.commentaries, 0);
    assert_eq!(session.last_commentary(), None);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_commentary_failures_do_not_stop_the_loop() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 12));
    let detector = Arc::new(
        FakeDetector::default()
            .on_frame(5, vec![ahead("person")])
            .on_frame(10, vec![left("dog")]),
    );
    let commentary = Arc::new(FakeCommentary::failing());

    let start = Instant::now();
    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        settings(Duration::ZERO, Duration::ZERO),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(commentary.calls(), 2);
    assert_eq!(english.spoken().len(), 2);
    assert_eq!(summary.videos_completed, 1);
    assert_eq!(summary.frames_read, 12);

    // Each failed request still pauses like a spoken one
    let elapsed = start.elapsed();
    assert!(elapsed >= PAUSE * 4, "elapsed {elapsed:?}");
    assert!(elapsed < PAUSE * 5, "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_language_switch_applies_to_next_output() {
    let session = Session::new(Language::English);
    let switcher = session.clone();
    let english = Arc::new(RecordingSynth::default().on_speak(move |text| {
        if text == "I see A person ahead." {
            switcher.set_language(Language::Tamil);
        }
    }));
    let tamil = Arc::new(RecordingSynth::default());
    let router = Arc::new(
        SpeechOutputRouter::new(session.clone())
            .with_engine(Language::English, english.clone())
            .with_engine(Language::Tamil, tamil.clone()),
    );
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 10));
    let detector = Arc::new(
        FakeDetector::default()
            .on_frame(5, vec![ahead("person")])
            .on_frame(10, vec![left("dog")]),
    );
    let commentary = Arc::new(FakeCommentary::replying("ஒரு அமைதியான தெரு."));

    run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        settings(Duration::ZERO, Duration::from_secs(1000)),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(english.spoken(), vec!["I see A person ahead."]);

    // Commentary of the same frame already uses Tamil
    assert_eq!(
        commentary.prompts(),
        vec![
            "A person is walking and sees: எனக்கு முன் ஒரு நபர். \
             Describe the scene for a visually impaired person."
        ]
    );
    assert_eq!(
        tamil.spoken(),
        vec!["ஒரு அமைதியான தெரு.", "எனது இடப்புறம் ஒரு நாய் இருக்கிறது."]
    );
}

#[tokio::test(start_paused = true)]
async fn test_unopenable_video_is_skipped() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("b.mp4", 5));
    let detector = Arc::new(FakeDetector::default().on_frame(5, vec![right("bus")]));
    let commentary = Arc::new(FakeCommentary::replying("A bus."));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["missing.mp4", "b.mp4"]),
    )
    .await;

    assert_eq!(summary.videos_skipped, 1);
    assert_eq!(summary.videos_completed, 1);
    assert_eq!(english.spoken()[0], "I see A bus to your right.");

    // Relative path is retried once as absolute before skipping
    let opened = source.opened();
    assert_eq!(opened.len(), 3);
    assert_eq!(opened[0], PathBuf::from("missing.mp4"));
    assert!(opened[1].is_absolute());
    assert!(opened[1].ends_with("missing.mp4"));
    assert_eq!(opened[2], PathBuf::from("b.mp4"));
}

#[tokio::test(start_paused = true)]
async fn test_only_every_nth_frame_is_detected() {
    let session = Session::new(Language::English);
    let (router, _, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video_fps("a.mp4", 17, None));
    let detector = Arc::new(FakeDetector::default());
    let commentary = Arc::new(FakeCommentary::replying("unused"));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(detector.seen(), vec![5, 10, 15]);
    assert_eq!(summary.frames_read, 17);
    assert_eq!(summary.frames_detected, 3);
    assert_eq!(commentary.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_detector_failure_skips_only_that_frame() {
    let session = Session::new(Language::English);
    let (router, english, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 10));
    let detector = Arc::new(
        FakeDetector::default()
            .failing_on(5)
            .on_frame(10, vec![ahead("cat")]),
    );
    let commentary = Arc::new(FakeCommentary::replying("A cat."));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(summary.frames_detected, 1);
    assert_eq!(english.spoken(), vec!["I see A cat ahead.", "A cat."]);
}

#[tokio::test(start_paused = true)]
async fn test_speech_failure_does_not_stop_the_loop() {
    let session = Session::new(Language::English);
    let english = Arc::new(RecordingSynth::failing());
    let router = Arc::new(
        SpeechOutputRouter::new(session.clone()).with_engine(Language::English, english.clone()),
    );
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 10));
    let detector = Arc::new(
        FakeDetector::default()
            .on_frame(5, vec![ahead("person")])
            .on_frame(10, vec![left("dog")]),
    );
    let commentary = Arc::new(FakeCommentary::replying("Street."));

    let summary = run_loop(
        &source,
        &detector,
        &commentary,
        &router,
        settings(Duration::ZERO, Duration::from_secs(1000)),
        &paths(&["a.mp4"]),
    )
    .await;

    assert_eq!(summary.videos_completed, 1);
    assert_eq!(english.spoken().len(), 3);
    // Cached even though playback failed, so it can be repeated
    assert_eq!(
        session.last_object_announcement().as_deref(),
        Some("I see A dog to your left.")
    );
}

#[tokio::test(start_paused = true)]
async fn test_quit_stops_before_next_frame() {
    let (quit_tx, quit_rx) = watch::channel(false);
    let quit_tx = Arc::new(quit_tx);
    let signal = quit_tx.clone();
    let english = Arc::new(RecordingSynth::default().on_speak(move |_| {
        let _ = signal.send(true);
    }));
    let session = Session::new(Language::English);
    let router =
        Arc::new(SpeechOutputRouter::new(session).with_engine(Language::English, english.clone()));
    let source = Arc::new(
        FakeSource::default()
            .with_video("a.mp4", 10)
            .with_video("b.mp4", 10),
    );
    let detector = Arc::new(FakeDetector::default().on_frame(5, vec![ahead("person")]));
    let commentary = Arc::new(FakeCommentary::replying("Street."));

    let summary = run_loop_until(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["a.mp4", "b.mp4"]),
        &quit_rx,
    )
    .await;

    assert!(summary.quit);
    assert_eq!(summary.frames_read, 5);
    assert_eq!(summary.videos_completed, 0);
    assert_eq!(source.opened(), vec![PathBuf::from("a.mp4")]);
    // The frame in progress still finishes its outputs
    assert_eq!(english.spoken(), vec!["I see A person ahead.", "Street."]);
}

#[tokio::test]
async fn test_quit_before_start_reads_no_frames() {
    let session = Session::new(Language::English);
    let (router, _, _) = recording_router(&session);
    let source = Arc::new(FakeSource::default().with_video("a.mp4", 10));
    let detector = Arc::new(FakeDetector::default());
    let commentary = Arc::new(FakeCommentary::replying("unused"));
    let (_quit_tx, quit_rx) = watch::channel(true);

    let summary = run_loop_until(
        &source,
        &detector,
        &commentary,
        &router,
        NarrationSettings::default(),
        &paths(&["a.mp4"]),
        &quit_rx,
    )
    .await;

    assert!(summary.quit);
    assert_eq!(summary.frames_read, 0);
    assert!(detector.seen().is_empty());
}
