//! Trait definitions for the pipeline stages driven by a session.
//!
//! Stages run on their own threads and report back through the callback
//! traits. They hold the session only through a [`Weak`] reference, so a
//! session is never kept alive by the stages it owns.

use std::sync::{Arc, Weak};

use crate::error::{TranscodeError, TranscodeResult};
use crate::format::MediaFormat;

use super::types::{MediaHandle, MediaSample, Requester, TrackKind};

/// Demuxer over the source container.
pub trait SampleReader: Send + Sync {
    /// Number of tracks in the source.
    fn track_count(&self) -> usize;

    /// Format of the given track, if the container describes one.
    fn track_format(&self, track_index: usize) -> Option<MediaFormat>;

    /// Marks a track as one whose samples will be read.
    fn select_track(&self, track_index: usize) -> TranscodeResult<()>;

    /// Forces samples to be handed out in container order across all selected
    /// tracks.
    fn set_enforce_sequential_access(&self, enforce: bool);
}

/// Receives the output samples of one track.
pub trait SampleConsumer: Send + Sync {
    fn on_sample(&self, sample: MediaSample);
}

/// Events reported by a [`SampleWriter`].
pub trait SampleWriterCallback: Send + Sync {
    /// The writer has stopped, successfully or not.
    fn on_writer_finished(&self, result: TranscodeResult<()>);

    /// Overall progress in percent (0..=100).
    fn on_writer_progress(&self, progress: u8);
}

/// Muxer over the destination container.
pub trait SampleWriter: Send + Sync {
    /// Prepares the destination and registers the event sink.
    fn init(
        &self,
        destination: MediaHandle,
        callback: Weak<dyn SampleWriterCallback>,
    ) -> TranscodeResult<()>;

    /// Adds an output track and returns the consumer its samples go to.
    fn add_track(&self, format: &MediaFormat) -> TranscodeResult<Arc<dyn SampleConsumer>>;

    /// Starts writing. Must only be called once every track was added.
    fn start(&self) -> TranscodeResult<()>;

    /// Stops writing immediately.
    fn stop(&self);
}

/// Events reported by a [`TrackTranscoder`].
///
/// The transcoder passes itself so the receiver can tell tracks apart.
pub trait TrackTranscoderCallback: Send + Sync {
    /// The transcoder's output format is now known.
    fn on_track_format_available(&self, transcoder: &dyn TrackTranscoder);

    /// The transcoder has produced its last sample.
    fn on_track_finished(&self, transcoder: &dyn TrackTranscoder);

    /// The transcoder failed and will produce no more samples.
    fn on_track_error(&self, transcoder: &dyn TrackTranscoder, error: TranscodeError);
}

/// Worker that moves one source track to the writer.
pub trait TrackTranscoder: Send + Sync {
    /// Binds the transcoder to a source track. `format` is the requested
    /// output format, absent for passthrough tracks.
    fn configure(
        &self,
        reader: Arc<dyn SampleReader>,
        track_index: usize,
        format: Option<MediaFormat>,
    ) -> TranscodeResult<()>;

    /// Sets where output samples are delivered.
    fn set_sample_consumer(&self, consumer: Arc<dyn SampleConsumer>);

    /// Launches the worker. Returns without waiting for any transcoding work.
    fn start(&self) -> TranscodeResult<()>;

    /// Stops the worker and waits for it to exit.
    fn stop(&self);

    /// Output format, once the worker has determined it.
    fn output_format(&self) -> Option<MediaFormat>;
}

/// Creates the pipeline stages for a session.
pub trait PipelineFactory: Send + Sync {
    /// Opens a reader over `length` bytes of the source starting at `offset`
    /// (`None` reads to the end). Returns `None` if the container cannot be
    /// parsed.
    fn open_reader(
        &self,
        source: MediaHandle,
        offset: u64,
        length: Option<u64>,
    ) -> Option<Arc<dyn SampleReader>>;

    /// Creates an uninitialized writer.
    fn create_writer(&self) -> Arc<dyn SampleWriter>;

    /// Creates a transcoder of the given kind reporting to `callback`.
    fn create_track_transcoder(
        &self,
        kind: TrackKind,
        callback: Weak<dyn TrackTranscoderCallback>,
        requester: Requester,
    ) -> Arc<dyn TrackTranscoder>;
}
