//! Shared harness for session integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transcoder_core::{
    testing::{
        MockPipelineFactory, MockSampleReader, MockSampleWriter, RecordingCallback, SessionEvent,
    },
    MediaFormat, MediaHandle, MediaTranscoder, PipelineFactory, Requester, SessionConfig,
    TranscoderCallback,
};

pub const SOURCE: MediaHandle = MediaHandle::new(3);
pub const DESTINATION: MediaHandle = MediaHandle::new(4);
pub const REQUESTER: Requester = Requester::new(1234, 10_001);

/// How long to wait for an asynchronous event before failing.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Install a subscriber that honours `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "transcoder_core=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

/// A session wired to mock pipeline stages.
pub struct TestHarness {
    pub session: Arc<MediaTranscoder>,
    pub factory: Arc<MockPipelineFactory>,
    pub callback: Arc<RecordingCallback>,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
}

impl TestHarness {
    pub fn new(formats: Vec<MediaFormat>) -> Self {
        Self::with_factory(MockPipelineFactory::with_formats(formats))
    }

    pub fn with_factory(factory: MockPipelineFactory) -> Self {
        Self::build(factory, SessionConfig::default(), RecordingCallback::new())
    }

    pub fn with_config(formats: Vec<MediaFormat>, config: SessionConfig) -> Self {
        Self::build(
            MockPipelineFactory::with_formats(formats),
            config,
            RecordingCallback::new(),
        )
    }

    /// Harness whose callback cancels the session from inside the final callback.
    pub fn cancelling(formats: Vec<MediaFormat>) -> Self {
        Self::build(
            MockPipelineFactory::with_formats(formats),
            SessionConfig::default(),
            RecordingCallback::cancelling(),
        )
    }

    fn build(
        factory: MockPipelineFactory,
        config: SessionConfig,
        (callback, events): (RecordingCallback, mpsc::UnboundedReceiver<SessionEvent>),
    ) -> Self {
        init_tracing();

        let factory = Arc::new(factory);
        let callback = Arc::new(callback);
        let session = MediaTranscoder::create_with_config(
            config,
            Arc::clone(&callback) as Arc<dyn TranscoderCallback>,
            Arc::clone(&factory) as Arc<dyn PipelineFactory>,
            REQUESTER,
            None,
        );

        Self {
            session,
            factory,
            callback,
            events,
        }
    }

    pub fn reader(&self) -> Arc<MockSampleReader> {
        self.factory.reader().expect("factory has a reader")
    }

    pub fn writer(&self) -> Arc<MockSampleWriter> {
        self.factory.writer().expect("destination configured")
    }

    /// Configure source, the given tracks and the destination.
    pub fn configure(&self, tracks: &[(usize, Option<MediaFormat>)]) {
        self.session.configure_source(SOURCE).expect("configure source");
        for (track_index, format) in tracks {
            self.session
                .configure_track_format(*track_index, format.as_ref())
                .expect("configure track");
        }
        self.session
            .configure_destination(DESTINATION)
            .expect("configure destination");
    }

    /// Wait for the next finished or error event, skipping progress.
    pub async fn next_final_event(&mut self) -> SessionEvent {
        loop {
            let event = tokio::time::timeout(EVENT_TIMEOUT, self.events.recv())
                .await
                .expect("timed out waiting for a final callback")
                .expect("callback channel closed");
            if event.is_final() {
                return event;
            }
        }
    }

    /// Assert that no further event arrives within `window`.
    pub async fn assert_no_event(&mut self, window: Duration) {
        if let Ok(event) = tokio::time::timeout(window, self.events.recv()).await {
            panic!("unexpected event: {:?}", event);
        }
    }

    /// Wait until the teardown after the final callback has stopped the writer.
    pub async fn wait_for_teardown(&self) {
        let writer = self.writer();
        wait_until(|| writer.stop_count() > 0).await;
    }
}

/// Poll `condition` until it holds or [`EVENT_TIMEOUT`] elapses.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not met in time");
}
