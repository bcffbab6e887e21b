//! Mock pipeline factory for testing.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::pipeline::{
    MediaHandle, PipelineFactory, Requester, SampleReader, SampleWriter, TrackKind,
    TrackTranscoder, TrackTranscoderCallback,
};

use super::mock_reader::MockSampleReader;
use super::mock_transcoder::{MockTrackTranscoder, TranscoderBehavior};
use super::mock_writer::{MockSampleWriter, WriterBehavior};

/// Arguments of an `open_reader` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderRequest {
    pub source: MediaHandle,
    pub offset: u64,
    pub length: Option<u64>,
}

/// Mock implementation of the PipelineFactory trait.
///
/// Hands out mock stages and keeps every one it created so tests can inspect
/// them afterwards:
/// - `open_reader` returns the configured reader, or `None` if there is none
/// - Writers are created with the configured [`WriterBehavior`]
/// - Transcoders take their [`TranscoderBehavior`] from a queue, falling back
///   to the default behavior once the queue is empty
///
/// # Example
///
/// ```rust,ignore
/// use transcoder_core::testing::{fixtures, MockPipelineFactory, TranscoderBehavior};
///
/// let factory = MockPipelineFactory::with_formats(vec![fixtures::avc_video_format()]);
/// factory.push_transcoder_behavior(TranscoderBehavior::stalled());
///
/// // ...create and run a session...
///
/// let transcoders = factory.transcoders();
/// assert_eq!(transcoders[0].stop_count(), 1);
/// ```
#[derive(Default)]
pub struct MockPipelineFactory {
    reader: Mutex<Option<Arc<MockSampleReader>>>,
    reader_requests: Mutex<Vec<ReaderRequest>>,
    writer_behavior: Mutex<WriterBehavior>,
    writers: Mutex<Vec<Arc<MockSampleWriter>>>,
    transcoder_behaviors: Mutex<VecDeque<TranscoderBehavior>>,
    default_transcoder_behavior: Mutex<TranscoderBehavior>,
    transcoders: Mutex<Vec<Arc<MockTrackTranscoder>>>,
}

impl MockPipelineFactory {
    /// Create a factory that opens the given reader.
    pub fn new(reader: Arc<MockSampleReader>) -> Self {
        Self {
            reader: Mutex::new(Some(reader)),
            ..Self::default()
        }
    }

    /// Create a factory over a reader with the given track formats.
    pub fn with_formats(formats: Vec<crate::format::MediaFormat>) -> Self {
        Self::new(Arc::new(MockSampleReader::new(formats)))
    }

    /// Create a factory whose sources can never be parsed.
    pub fn unparseable() -> Self {
        Self::default()
    }

    /// The reader handed out by `open_reader`.
    pub fn reader(&self) -> Option<Arc<MockSampleReader>> {
        self.reader.lock().clone()
    }

    /// Replace the reader handed out by future `open_reader` calls.
    pub fn set_reader(&self, reader: Option<Arc<MockSampleReader>>) {
        *self.reader.lock() = reader;
    }

    pub fn reader_requests(&self) -> Vec<ReaderRequest> {
        self.reader_requests.lock().clone()
    }

    /// Set the behavior of writers created from now on.
    pub fn set_writer_behavior(&self, behavior: WriterBehavior) {
        *self.writer_behavior.lock() = behavior;
    }

    /// All writers created, in order.
    pub fn writers(&self) -> Vec<Arc<MockSampleWriter>> {
        self.writers.lock().clone()
    }

    /// The most recently created writer.
    pub fn writer(&self) -> Option<Arc<MockSampleWriter>> {
        self.writers.lock().last().cloned()
    }

    /// Queue the behavior of the next transcoder created.
    pub fn push_transcoder_behavior(&self, behavior: TranscoderBehavior) {
        self.transcoder_behaviors.lock().push_back(behavior);
    }

    /// Set the behavior used once the queue is empty.
    pub fn set_default_transcoder_behavior(&self, behavior: TranscoderBehavior) {
        *self.default_transcoder_behavior.lock() = behavior;
    }

    /// All transcoders created, in order.
    pub fn transcoders(&self) -> Vec<Arc<MockTrackTranscoder>> {
        self.transcoders.lock().clone()
    }

    /// Kinds of the transcoders created, in order.
    pub fn created_kinds(&self) -> Vec<TrackKind> {
        self.transcoders.lock().iter().map(|t| t.kind()).collect()
    }
}

impl PipelineFactory for MockPipelineFactory {
    fn open_reader(
        &self,
        source: MediaHandle,
        offset: u64,
        length: Option<u64>,
    ) -> Option<Arc<dyn SampleReader>> {
        self.reader_requests.lock().push(ReaderRequest {
            source,
            offset,
            length,
        });
        let reader = self.reader.lock().clone()?;
        Some(reader as Arc<dyn SampleReader>)
    }

    fn create_writer(&self) -> Arc<dyn SampleWriter> {
        let writer = MockSampleWriter::with_behavior(self.writer_behavior.lock().clone());
        self.writers.lock().push(Arc::clone(&writer));
        writer
    }

    fn create_track_transcoder(
        &self,
        kind: TrackKind,
        callback: Weak<dyn TrackTranscoderCallback>,
        requester: Requester,
    ) -> Arc<dyn TrackTranscoder> {
        let behavior = self
            .transcoder_behaviors
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_transcoder_behavior.lock().clone());
        let transcoder = MockTrackTranscoder::new(kind, callback, requester, behavior);
        self.transcoders.lock().push(Arc::clone(&transcoder));
        transcoder
    }
}
