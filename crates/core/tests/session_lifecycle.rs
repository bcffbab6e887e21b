//! Session lifecycle integration tests.
//!
//! These tests run sessions end to end over mock stages with real worker
//! threads:
//! - Successful completion and progress forwarding
//! - Writer start gating on track formats
//! - Runtime failures and teardown
//! - Exactly one final callback per session

mod common;

use std::time::Duration;

use common::{wait_until, TestHarness};
use transcoder_core::{
    testing::{fixtures, SessionEvent, TranscoderBehavior, WriterBehavior},
    ErrorKind, SessionConfig, SessionState, TranscodeError,
};

fn audio_and_video() -> Vec<transcoder_core::MediaFormat> {
    vec![fixtures::aac_audio_format(), fixtures::avc_video_format()]
}

// =============================================================================
// Successful sessions
// =============================================================================

#[tokio::test]
async fn test_audio_passthrough_and_video_transcode_finish() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.configure(&[(0, None), (1, Some(fixtures::hevc_request(4_000_000)))]);

    harness.session.start().unwrap();
    assert_eq!(harness.session.state(), SessionState::Running);

    let event = harness.next_final_event().await;
    assert_eq!(event, SessionEvent::Finished(harness.session.id()));
    harness.wait_for_teardown().await;

    let writer = harness.writer();
    assert_eq!(writer.start_count(), 1);
    let mimes: Vec<_> = writer
        .track_formats()
        .iter()
        .map(|f| f.mime().unwrap_or_default().to_string())
        .collect();
    assert_eq!(mimes.len(), 2);
    assert!(mimes.contains(&"audio/mp4a-latm".to_string()));
    assert!(mimes.contains(&"video/hevc".to_string()));

    // 3 samples plus end-of-stream per track
    let samples = writer.samples();
    assert_eq!(samples.len(), 8);
    assert_eq!(samples.iter().filter(|s| s.sample.is_end_of_stream()).count(), 2);

    assert_eq!(harness.callback.finished_count(), 1);
    assert_eq!(harness.callback.error_count(), 0);
    assert_eq!(harness.session.state(), SessionState::Finished);
}

#[tokio::test]
async fn test_progress_is_forwarded() {
    let mut harness = TestHarness::new(vec![fixtures::avc_video_format()]);
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();
    harness.next_final_event().await;

    let id = harness.session.id();
    let events = harness.callback.events();
    assert!(events.contains(&SessionEvent::Progress(id, 100)));
    let progress_at = events
        .iter()
        .position(|e| *e == SessionEvent::Progress(id, 100));
    let finished_at = events.iter().position(|e| *e == SessionEvent::Finished(id));
    assert!(progress_at < finished_at);
}

#[tokio::test]
async fn test_sequential_access_enabled_before_writer_start() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.configure(&[(0, None), (1, None)]);

    harness.session.start().unwrap();
    harness.next_final_event().await;
    harness.wait_for_teardown().await;

    // Enabled when every track is registered, released again by the teardown
    assert_eq!(harness.reader().sequential_access_changes(), vec![true, false]);
}

#[tokio::test]
async fn test_sequential_access_can_be_disabled() {
    let mut harness = TestHarness::with_config(
        audio_and_video(),
        SessionConfig::default().with_sequential_access(false),
    );
    harness.configure(&[(0, None), (1, None)]);

    harness.session.start().unwrap();
    harness.next_final_event().await;
    harness.wait_for_teardown().await;

    assert_eq!(harness.reader().sequential_access_changes(), vec![false]);
}

#[tokio::test]
async fn test_teardown_runs_on_named_thread() {
    let mut harness = TestHarness::with_config(
        vec![fixtures::avc_video_format()],
        SessionConfig::default().with_teardown_thread_name("session-cleanup"),
    );
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();
    harness.next_final_event().await;
    harness.wait_for_teardown().await;

    let writer = harness.writer();
    assert_eq!(
        writer.stop_thread_names(),
        vec![Some("session-cleanup".to_string())]
    );
    let transcoders = harness.factory.transcoders();
    wait_until(|| transcoders[0].stop_count() == 1).await;
    assert_eq!(harness.session.state(), SessionState::Finished);
}

#[tokio::test]
async fn test_invalid_teardown_thread_name_falls_back_to_default() {
    let mut harness = TestHarness::with_config(
        vec![fixtures::avc_video_format()],
        SessionConfig::default().with_teardown_thread_name("tear\0down"),
    );
    assert_eq!(
        harness.session.config().teardown_thread_name,
        "transcoder-teardown"
    );
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();
    let event = harness.next_final_event().await;
    assert!(matches!(event, SessionEvent::Finished(_)));
    harness.wait_for_teardown().await;

    assert_eq!(
        harness.writer().stop_thread_names(),
        vec![Some("transcoder-teardown".to_string())]
    );
}

#[tokio::test]
async fn test_duplicate_format_report_is_ignored() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.factory.push_transcoder_behavior(TranscoderBehavior {
        duplicate_format: true,
        ..TranscoderBehavior::default()
    });
    harness.configure(&[(0, None), (1, None)]);

    harness.session.start().unwrap();
    let event = harness.next_final_event().await;

    assert!(matches!(event, SessionEvent::Finished(_)));
    let writer = harness.writer();
    assert_eq!(writer.track_formats().len(), 2);
    assert_eq!(writer.start_count(), 1);
}

// =============================================================================
// Writer start gating
// =============================================================================

#[tokio::test]
async fn test_writer_waits_for_every_track_format() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.factory.push_transcoder_behavior(TranscoderBehavior::default());
    harness.factory.push_transcoder_behavior(TranscoderBehavior::stalled());
    harness.configure(&[(0, None), (1, None)]);

    harness.session.start().unwrap();

    let writer = harness.writer();
    let transcoders = harness.factory.transcoders();
    wait_until(|| transcoders[0].has_consumer()).await;

    assert_eq!(writer.track_formats().len(), 1);
    assert_eq!(writer.start_count(), 0);
    assert!(harness.reader().sequential_access_changes().is_empty());

    harness.session.cancel().unwrap();
    assert_eq!(writer.start_count(), 0);
    harness.assert_no_event(Duration::from_millis(100)).await;
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_track_error_reports_once_and_tears_down() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.factory.push_transcoder_behavior(TranscoderBehavior::stalled());
    harness
        .factory
        .push_transcoder_behavior(TranscoderBehavior::failing_at_runtime(
            TranscodeError::malformed("corrupt frame"),
        ));
    harness.configure(&[(0, None), (1, Some(fixtures::hevc_request(4_000_000)))]);

    harness.session.start().unwrap();

    let event = harness.next_final_event().await;
    assert_eq!(
        event,
        SessionEvent::Error(harness.session.id(), TranscodeError::malformed("corrupt frame"))
    );

    harness.wait_for_teardown().await;
    let transcoders = harness.factory.transcoders();
    wait_until(|| transcoders.iter().all(|t| t.stop_count() == 1)).await;

    harness.assert_no_event(Duration::from_millis(100)).await;
    assert_eq!(harness.callback.final_count(), 1);
    assert_eq!(harness.session.state(), SessionState::Errored);
}

#[tokio::test]
async fn test_transcoder_start_failure_cancels_session() {
    let mut harness = TestHarness::new(audio_and_video());
    harness.factory.push_transcoder_behavior(TranscoderBehavior::stalled());
    harness
        .factory
        .push_transcoder_behavior(TranscoderBehavior::failing_start(TranscodeError::unknown(
            "codec busy",
        )));
    harness.configure(&[(0, None), (1, None)]);

    let err = harness.session.start().unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Unknown);
    assert_eq!(harness.session.state(), SessionState::Cancelled);
    let transcoders = harness.factory.transcoders();
    assert_eq!(transcoders[0].start_count(), 1);
    assert_eq!(transcoders[0].stop_count(), 1);
    assert_eq!(harness.writer().stop_count(), 1);
    harness.assert_no_event(Duration::from_millis(100)).await;
}

#[tokio::test]
async fn test_writer_start_failure_reports_error() {
    let mut harness = TestHarness::new(vec![fixtures::avc_video_format()]);
    harness.factory.set_writer_behavior(WriterBehavior {
        start_error: Some(TranscodeError::unknown("muxer refused")),
        ..Default::default()
    });
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();

    let event = harness.next_final_event().await;
    match event {
        SessionEvent::Error(_, err) => assert_eq!(err.kind(), ErrorKind::Unknown),
        other => panic!("expected error, got {:?}", other),
    }
    harness.wait_for_teardown().await;
    assert_eq!(harness.callback.final_count(), 1);
}

#[tokio::test]
async fn test_add_track_failure_reports_error() {
    let mut harness = TestHarness::new(vec![fixtures::avc_video_format()]);
    harness.factory.set_writer_behavior(WriterBehavior {
        add_track_error: Some(TranscodeError::unsupported("codec not muxable")),
        ..Default::default()
    });
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();

    let event = harness.next_final_event().await;
    match event {
        SessionEvent::Error(_, err) => assert_eq!(err.kind(), ErrorKind::Unknown),
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(harness.writer().start_count(), 0);
}

#[tokio::test]
async fn test_missing_output_format_reports_error() {
    let mut harness = TestHarness::new(vec![fixtures::avc_video_format()]);
    harness.factory.push_transcoder_behavior(TranscoderBehavior {
        omit_output_format: true,
        ..TranscoderBehavior::default()
    });
    harness.configure(&[(0, None)]);

    harness.session.start().unwrap();

    let event = harness.next_final_event().await;
    assert!(matches!(event, SessionEvent::Error(..)));
    harness.wait_for_teardown().await;
    assert!(harness.writer().track_formats().is_empty());
}

// =============================================================================
// Exactly one final callback
// =============================================================================

#[tokio::test]
async fn test_every_session_gets_exactly_one_final_callback() {
    for round in 0..12 {
        let mut harness = TestHarness::new(audio_and_video());
        match round % 4 {
            0 => {}
            1 => harness
                .factory
                .push_transcoder_behavior(TranscoderBehavior::failing_at_runtime(
                    TranscodeError::unknown("decoder died"),
                )),
            2 => {
                harness.factory.push_transcoder_behavior(TranscoderBehavior::default());
                harness
                    .factory
                    .push_transcoder_behavior(TranscoderBehavior::failing_at_runtime(
                        TranscodeError::malformed("bad frame"),
                    ));
            }
            _ => harness.factory.set_default_transcoder_behavior(TranscoderBehavior {
                sample_count: 10,
                sample_interval: Some(Duration::from_millis(1)),
                ..TranscoderBehavior::default()
            }),
        }
        harness.configure(&[(0, None), (1, None)]);

        harness.session.start().unwrap();
        harness.next_final_event().await;
        harness.wait_for_teardown().await;
        harness.assert_no_event(Duration::from_millis(50)).await;

        assert_eq!(harness.callback.final_count(), 1, "round {}", round);
        assert!(harness.session.state().is_terminal());
    }
}
