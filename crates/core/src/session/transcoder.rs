//! Transcoding session implementation.
//!
//! A [`MediaTranscoder`] wires a [`SampleReader`], one [`TrackTranscoder`] per
//! configured track and a [`SampleWriter`] together:
//! - Configuration calls run on the client's thread and fail synchronously.
//! - Once started, every stage reports back on its own thread through the
//!   callback traits, in any order and possibly concurrently.
//! - The writer is started when the last track has reported its output format.
//! - Exactly one final callback reaches the client, after which the pipeline
//!   is torn down on a detached thread.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::thread;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::error::{TranscodeError, TranscodeResult};
use crate::format::{is_video_mime, merge_formats, MediaFormat};
use crate::metrics;
use crate::pipeline::{
    MediaHandle, PipelineFactory, Requester, SampleReader, SampleWriter, SampleWriterCallback,
    TrackKind, TrackTranscoder, TrackTranscoderCallback,
};

use super::config::SessionConfig;
use super::traits::TranscoderCallback;
use super::types::{PausedState, SessionId, SessionState, TrackInfo};

/// Reader and the track formats captured when the source was configured.
struct SourceState {
    reader: Arc<dyn SampleReader>,
    track_formats: Vec<MediaFormat>,
}

/// A track transcoder bound to a source track.
#[derive(Clone)]
struct ConfiguredTrack {
    track_index: usize,
    kind: TrackKind,
    transcoder: Arc<dyn TrackTranscoder>,
}

/// Tracks that have reported their output format.
#[derive(Default)]
struct FormatQuorum {
    /// Transcoders that reported, whether or not registration finished.
    reported: HashSet<usize>,
    /// Transcoders whose output track was added to the writer.
    registered: usize,
}

/// Identity of a transcoder, stable for as long as it is alive.
fn transcoder_key(transcoder: &dyn TrackTranscoder) -> usize {
    (transcoder as *const dyn TrackTranscoder).cast::<()>() as usize
}

/// Coordinates one source-to-destination transcoding session.
///
/// Created through [`MediaTranscoder::create`], which returns the session
/// behind an [`Arc`]. Pipeline stages only hold weak references to it.
pub struct MediaTranscoder {
    id: SessionId,
    config: SessionConfig,
    requester: Requester,
    callbacks: Arc<dyn TranscoderCallback>,
    factory: Arc<dyn PipelineFactory>,
    weak_self: Weak<MediaTranscoder>,

    source: RwLock<Option<SourceState>>,
    writer: RwLock<Option<Arc<dyn SampleWriter>>>,
    tracks: RwLock<Vec<ConfiguredTrack>>,
    quorum: Mutex<FormatQuorum>,

    started_at: Mutex<Option<Instant>>,
    started: AtomicBool,
    cancelled: AtomicBool,
    callback_sent: AtomicBool,
    outcome: OnceLock<SessionState>,
}

impl MediaTranscoder {
    /// Creates a session with the default configuration.
    ///
    /// A `paused_state` from an earlier [`pause`](Self::pause) is accepted but
    /// carries nothing to restore.
    pub fn create(
        callbacks: Arc<dyn TranscoderCallback>,
        factory: Arc<dyn PipelineFactory>,
        requester: Requester,
        paused_state: Option<PausedState>,
    ) -> Arc<Self> {
        Self::create_with_config(
            SessionConfig::default(),
            callbacks,
            factory,
            requester,
            paused_state,
        )
    }

    /// Creates a session with an explicit configuration.
    pub fn create_with_config(
        mut config: SessionConfig,
        callbacks: Arc<dyn TranscoderCallback>,
        factory: Arc<dyn PipelineFactory>,
        requester: Requester,
        paused_state: Option<PausedState>,
    ) -> Arc<Self> {
        let id = SessionId::new();
        if !config.has_valid_thread_name() {
            warn!(
                "Session {}: invalid teardown thread name {:?}, using default",
                id, config.teardown_thread_name
            );
            config.teardown_thread_name = SessionConfig::default().teardown_thread_name;
        }
        if paused_state.is_some() {
            info!("Session {} initializing from paused state", id);
        }
        metrics::SESSIONS_CREATED.inc();

        Arc::new_cyclic(|weak_self| Self {
            id,
            config,
            requester,
            callbacks,
            factory,
            weak_self: weak_self.clone(),
            source: RwLock::new(None),
            writer: RwLock::new(None),
            tracks: RwLock::new(Vec::new()),
            quorum: Mutex::new(FormatQuorum::default()),
            started_at: Mutex::new(None),
            started: AtomicBool::new(false),
            cancelled: AtomicBool::new(false),
            callback_sent: AtomicBool::new(false),
            outcome: OnceLock::new(),
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn requester(&self) -> Requester {
        self.requester
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        if let Some(outcome) = self.outcome.get() {
            return *outcome;
        }
        if self.cancelled.load(Ordering::Acquire) {
            return SessionState::Cancelled;
        }
        if self.started.load(Ordering::Acquire) {
            return SessionState::Running;
        }
        if self.writer.read().is_some() && !self.tracks.read().is_empty() {
            return SessionState::Configured;
        }
        SessionState::Unconfigured
    }

    /// Configured tracks in configuration order.
    pub fn configured_tracks(&self) -> Vec<TrackInfo> {
        self.tracks
            .read()
            .iter()
            .map(|t| TrackInfo {
                track_index: t.track_index,
                kind: t.kind,
            })
            .collect()
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Opens the source and captures the format of every track.
    ///
    /// Calling this again replaces the reader and the captured formats. A
    /// failed call leaves the previous source in place.
    pub fn configure_source(&self, source: MediaHandle) -> TranscodeResult<()> {
        if !source.is_valid() {
            error!("Session {}: invalid source {}", self.id, source);
            return Err(TranscodeError::invalid_parameter(format!(
                "invalid source {}",
                source
            )));
        }

        let reader = self
            .factory
            .open_reader(source, self.config.source_offset, self.config.source_length)
            .ok_or_else(|| {
                error!("Session {}: unable to parse source {}", self.id, source);
                TranscodeError::unsupported(format!("unable to parse source {}", source))
            })?;

        let track_count = reader.track_count();
        let mut track_formats = Vec::with_capacity(track_count);
        for track_index in 0..track_count {
            let format = reader.track_format(track_index).ok_or_else(|| {
                error!("Session {}: track #{} has no format", self.id, track_index);
                TranscodeError::malformed(format!("track #{} has no format", track_index))
            })?;
            track_formats.push(format);
        }

        *self.source.write() = Some(SourceState {
            reader,
            track_formats,
        });

        info!(
            "Session {}: configured source {} with {} tracks",
            self.id, source, track_count
        );
        Ok(())
    }

    /// Returns copies of the source track formats.
    pub fn get_track_formats(&self) -> Vec<MediaFormat> {
        self.source
            .read()
            .as_ref()
            .map(|s| s.track_formats.clone())
            .unwrap_or_default()
    }

    /// Adds a source track to the destination.
    ///
    /// Without `format` the track is copied unchanged. With `format` the track
    /// is re-encoded into the source format overridden by the allow-listed
    /// keys of `format`. Only video tracks can be re-encoded, and only into
    /// another video format.
    pub fn configure_track_format(
        &self,
        track_index: usize,
        format: Option<&MediaFormat>,
    ) -> TranscodeResult<()> {
        let (reader, source_format) = {
            let source = self.source.read();
            let Some(source) = source.as_ref() else {
                error!("Session {}: source must be configured before tracks", self.id);
                return Err(TranscodeError::invalid_operation(
                    "source must be configured before tracks",
                ));
            };
            let Some(source_format) = source.track_formats.get(track_index) else {
                error!(
                    "Session {}: track index {} is out of bounds, track count: {}",
                    self.id,
                    track_index,
                    source.track_formats.len()
                );
                return Err(TranscodeError::invalid_parameter(format!(
                    "track index {} is out of bounds, track count: {}",
                    track_index,
                    source.track_formats.len()
                )));
            };
            (Arc::clone(&source.reader), source_format.clone())
        };

        reader.select_track(track_index).inspect_err(|e| {
            error!(
                "Session {}: unable to select track #{}: {}",
                self.id, track_index, e
            );
        })?;

        let (kind, output_format) = match format {
            None => (TrackKind::Passthrough, None),
            Some(requested) => {
                let merged = self.resolve_output_format(track_index, &source_format, requested)?;
                (TrackKind::Transcode, Some(merged))
            }
        };

        let callback: Weak<dyn TrackTranscoderCallback> = self.weak_self.clone();
        let transcoder = self
            .factory
            .create_track_transcoder(kind, callback, self.requester);

        transcoder
            .configure(reader, track_index, output_format)
            .inspect_err(|e| {
                error!(
                    "Session {}: configuring {} transcoder for track #{} failed: {}",
                    self.id, kind, track_index, e
                );
            })?;

        self.tracks.write().push(ConfiguredTrack {
            track_index,
            kind,
            transcoder,
        });
        metrics::TRACKS_CONFIGURED
            .with_label_values(&[kind.as_str()])
            .inc();

        info!(
            "Session {}: configured track #{} as {}",
            self.id, track_index, kind
        );
        Ok(())
    }

    /// Validates a re-encode request and merges it with the source format.
    fn resolve_output_format(
        &self,
        track_index: usize,
        source_format: &MediaFormat,
        requested: &MediaFormat,
    ) -> TranscodeResult<MediaFormat> {
        let source_mime = source_format.mime().ok_or_else(|| {
            error!(
                "Session {}: source track #{} has no mime type",
                self.id, track_index
            );
            TranscodeError::malformed(format!("source track #{} has no mime type", track_index))
        })?;

        if !is_video_mime(source_mime) {
            error!(
                "Session {}: only video tracks can be transcoded, track #{} has mime {}",
                self.id, track_index, source_mime
            );
            return Err(TranscodeError::unsupported(format!(
                "only video tracks can be transcoded, track #{} has mime {}",
                track_index, source_mime
            )));
        }

        if let Some(destination_mime) = requested.mime() {
            if !is_video_mime(destination_mime) {
                error!(
                    "Session {}: unable to convert track #{} from {} to {}",
                    self.id, track_index, source_mime, destination_mime
                );
                return Err(TranscodeError::unsupported(format!(
                    "unable to convert track #{} from {} to {}",
                    track_index, source_mime, destination_mime
                )));
            }
        }

        merge_formats(Some(source_format), Some(requested)).map_err(|e| {
            error!(
                "Session {}: unable to merge formats for track #{}: {}",
                self.id, track_index, e
            );
            TranscodeError::unknown(e.to_string())
        })
    }

    /// Prepares the writer for the destination. Can only be done once.
    pub fn configure_destination(&self, destination: MediaHandle) -> TranscodeResult<()> {
        if !destination.is_valid() {
            error!("Session {}: invalid destination {}", self.id, destination);
            return Err(TranscodeError::invalid_parameter(format!(
                "invalid destination {}",
                destination
            )));
        }

        let mut slot = self.writer.write();
        if slot.is_some() {
            error!("Session {}: destination is already configured", self.id);
            return Err(TranscodeError::invalid_operation(
                "destination is already configured",
            ));
        }

        let writer = self.factory.create_writer();
        let callback: Weak<dyn SampleWriterCallback> = self.weak_self.clone();
        if let Err(e) = writer.init(destination, callback) {
            error!(
                "Session {}: unable to initialize writer for {}: {}",
                self.id, destination, e
            );
            return Err(TranscodeError::unknown(format!(
                "unable to initialize writer for {}",
                destination
            )));
        }

        *slot = Some(writer);
        info!("Session {}: configured destination {}", self.id, destination);
        Ok(())
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Starts every configured track transcoder.
    ///
    /// Returns once the workers are launched. The outcome is reported through
    /// the [`TranscoderCallback`].
    pub fn start(&self) -> TranscodeResult<()> {
        let tracks = self.track_snapshot();
        if tracks.is_empty() {
            error!("Session {}: unable to start, no tracks are configured", self.id);
            return Err(TranscodeError::invalid_operation(
                "no tracks are configured",
            ));
        }
        if self.writer.read().is_none() {
            error!(
                "Session {}: unable to start, destination is not configured",
                self.id
            );
            return Err(TranscodeError::invalid_operation(
                "destination is not configured",
            ));
        }

        *self.started_at.lock() = Some(Instant::now());
        self.started.store(true, Ordering::Release);

        for track in &tracks {
            if let Err(e) = track.transcoder.start() {
                error!(
                    "Session {}: unable to start transcoder for track #{}: {}",
                    self.id, track.track_index, e
                );
                let _ = self.cancel();
                return Err(TranscodeError::unknown(format!(
                    "unable to start transcoder for track #{}",
                    track.track_index
                )));
            }
        }

        metrics::SESSIONS_STARTED.inc();
        info!("Session {}: started {} tracks", self.id, tracks.len());
        Ok(())
    }

    /// Stops the session and returns a token for [`resume`](Self::resume).
    pub fn pause(&self) -> TranscodeResult<PausedState> {
        // TODO: capture stream position and codec state once transcoders can
        // report them; until then resuming starts over.
        let paused_state = PausedState::default();
        self.cancel()?;
        Ok(paused_state)
    }

    /// Starts the configured tracks again after a [`pause`](Self::pause).
    pub fn resume(&self) -> TranscodeResult<()> {
        self.start()
    }

    /// Stops the writer and every track transcoder.
    ///
    /// Only the first call has any effect; every call succeeds. Safe to call
    /// from any thread, including from inside a [`TranscoderCallback`].
    pub fn cancel(&self) -> TranscodeResult<()> {
        if self
            .cancelled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Session {}: already cancelled", self.id);
            return Ok(());
        }

        info!("Session {}: cancelling", self.id);
        metrics::CANCELLATIONS.inc();

        let writer = self.writer.read().clone();
        if let Some(writer) = writer {
            writer.stop();
        }

        let reader = self.source.read().as_ref().map(|s| Arc::clone(&s.reader));
        if let Some(reader) = reader {
            reader.set_enforce_sequential_access(false);
        }

        for track in self.track_snapshot() {
            track.transcoder.stop();
        }

        info!("Session {}: pipeline stopped", self.id);
        Ok(())
    }

    // =========================================================================
    // Event dispatch
    // =========================================================================

    fn track_snapshot(&self) -> Vec<ConfiguredTrack> {
        self.tracks.read().clone()
    }

    /// Source track index of a transcoder, for logging.
    fn track_label(&self, transcoder: &dyn TrackTranscoder) -> String {
        let key = transcoder_key(transcoder);
        self.tracks
            .read()
            .iter()
            .find(|t| transcoder_key(t.transcoder.as_ref()) == key)
            .map(|t| format!("#{}", t.track_index))
            .unwrap_or_else(|| "#?".to_string())
    }

    /// Delivers the final callback if none was delivered yet.
    ///
    /// Errors arriving after an explicit cancel are dropped: stopping the
    /// pipeline makes the stages report errors of their own. A success that
    /// races with a cancel is still reported.
    fn send_callback(&self, result: TranscodeResult<()>) {
        if self.cancelled.load(Ordering::Acquire) {
            if let Err(e) = &result {
                warn!(
                    "Session {}: suppressing error after cancel: {}",
                    self.id, e
                );
                metrics::ERRORS_SUPPRESSED.inc();
                return;
            }
        }

        if self
            .callback_sent
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(
                "Session {}: final callback already sent, dropping {:?}",
                self.id, result
            );
            return;
        }

        let (state, label) = match &result {
            Ok(()) => (SessionState::Finished, "finished"),
            Err(_) => (SessionState::Errored, "error"),
        };
        let _ = self.outcome.set(state);
        metrics::SESSION_OUTCOMES.with_label_values(&[label]).inc();
        if let Some(started_at) = *self.started_at.lock() {
            metrics::SESSION_DURATION
                .with_label_values(&[label])
                .observe(started_at.elapsed().as_secs_f64());
        }

        match result {
            Ok(()) => {
                info!("Session {}: finished", self.id);
                self.callbacks.on_finished(self);
            }
            Err(e) => {
                warn!("Session {}: failed: {}", self.id, e);
                self.callbacks.on_error(self, e);
            }
        }

        self.spawn_teardown();
    }

    /// Runs [`cancel`](Self::cancel) on a detached thread.
    ///
    /// The caller may be a stage thread that `cancel` has to join, or a client
    /// callback that already holds locks of its own.
    fn spawn_teardown(&self) {
        let Some(session) = self.weak_self.upgrade() else {
            warn!("Session {}: dropped before teardown", self.id);
            return;
        };

        let spawned = thread::Builder::new()
            .name(self.config.teardown_thread_name.clone())
            .spawn(move || {
                let _ = session.cancel();
            });

        if let Err(e) = spawned {
            error!("Session {}: failed to spawn teardown thread: {}", self.id, e);
        }
    }

    /// Registers a transcoder's output track with the writer and starts the
    /// writer once every track is registered.
    fn register_output_track(&self, transcoder: &dyn TrackTranscoder) {
        let key = transcoder_key(transcoder);
        let track = self.track_label(transcoder);
        let track_count = self.tracks.read().len();

        if !self.quorum.lock().reported.insert(key) {
            debug!(
                "Session {}: ignoring duplicate format from track {}",
                self.id, track
            );
            return;
        }

        let writer = self.writer.read().clone();
        let Some(writer) = writer else {
            error!("Session {}: no writer for track {}", self.id, track);
            self.send_callback(Err(TranscodeError::unknown("destination is not configured")));
            return;
        };

        let Some(output_format) = transcoder.output_format() else {
            error!(
                "Session {}: track {} reported a format but has none",
                self.id, track
            );
            self.send_callback(Err(TranscodeError::unknown(format!(
                "track {} has no output format",
                track
            ))));
            return;
        };

        let consumer = match writer.add_track(&output_format) {
            Ok(consumer) => consumer,
            Err(e) => {
                error!(
                    "Session {}: unable to add track {} to writer: {}",
                    self.id, track, e
                );
                self.send_callback(Err(TranscodeError::unknown(format!(
                    "unable to add track {} to writer",
                    track
                ))));
                return;
            }
        };
        transcoder.set_sample_consumer(consumer);

        let all_registered = {
            let mut quorum = self.quorum.lock();
            quorum.registered += 1;
            quorum.registered == track_count
        };
        debug!(
            "Session {}: track {} added to writer with format [{}]",
            self.id, track, output_format
        );
        if !all_registered {
            return;
        }

        if self.cancelled.load(Ordering::Acquire) {
            info!("Session {}: cancelled, not starting writer", self.id);
            return;
        }

        // Sequential reads are only safe once every track has an output queue
        // that the writer drains. Before that a track blocked on a full output
        // queue would keep the others from reading the samples they need to
        // produce their formats.
        if self.config.enforce_sequential_access {
            let reader = self.source.read().as_ref().map(|s| Arc::clone(&s.reader));
            if let Some(reader) = reader {
                reader.set_enforce_sequential_access(true);
            }
        }

        info!("Session {}: starting writer", self.id);
        if let Err(e) = writer.start() {
            error!("Session {}: unable to start writer: {}", self.id, e);
            self.send_callback(Err(TranscodeError::unknown("unable to start writer")));
            return;
        }

        // A cancel that ran after the check above stopped the writer before it
        // was started.
        if self.cancelled.load(Ordering::Acquire) {
            info!("Session {}: cancelled while starting writer, stopping it", self.id);
            writer.stop();
        }
    }
}

impl TrackTranscoderCallback for MediaTranscoder {
    fn on_track_format_available(&self, transcoder: &dyn TrackTranscoder) {
        debug!(
            "Session {}: track {} format available",
            self.id,
            self.track_label(transcoder)
        );
        self.register_output_track(transcoder);
    }

    fn on_track_finished(&self, transcoder: &dyn TrackTranscoder) {
        debug!(
            "Session {}: track {} finished",
            self.id,
            self.track_label(transcoder)
        );
    }

    fn on_track_error(&self, transcoder: &dyn TrackTranscoder, error: TranscodeError) {
        error!(
            "Session {}: track {} returned error: {}",
            self.id,
            self.track_label(transcoder),
            error
        );
        self.send_callback(Err(error));
    }
}

impl SampleWriterCallback for MediaTranscoder {
    fn on_writer_finished(&self, result: TranscodeResult<()>) {
        match &result {
            Ok(()) => debug!("Session {}: writer finished", self.id),
            Err(e) => error!("Session {}: writer finished with error: {}", self.id, e),
        }
        self.send_callback(result);
    }

    fn on_writer_progress(&self, progress: u8) {
        self.callbacks.on_progress_update(self, progress);
    }
}

impl fmt::Debug for MediaTranscoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTranscoder")
            .field("id", &self.id)
            .field("requester", &self.requester)
            .field("state", &self.state())
            .field("tracks", &self.configured_tracks())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{MediaSample, SampleConsumer};
    use crate::testing::{fixtures, MockSampleReader, MockTrackTranscoder, TranscoderBehavior};
    use std::time::Duration;

    struct NullCallback;

    impl TranscoderCallback for NullCallback {
        fn on_finished(&self, _session: &MediaTranscoder) {}
        fn on_error(&self, _session: &MediaTranscoder, _error: TranscodeError) {}
        fn on_progress_update(&self, _session: &MediaTranscoder, _progress: u8) {}
    }

    struct NullConsumer;

    impl SampleConsumer for NullConsumer {
        fn on_sample(&self, _sample: MediaSample) {}
    }

    /// Writer that cancels its session from inside `start`.
    #[derive(Default)]
    struct CancellingWriter {
        session: Mutex<Weak<MediaTranscoder>>,
        calls: Mutex<Vec<&'static str>>,
    }

    impl SampleWriter for CancellingWriter {
        fn init(
            &self,
            _destination: MediaHandle,
            _callback: Weak<dyn SampleWriterCallback>,
        ) -> TranscodeResult<()> {
            Ok(())
        }

        fn add_track(&self, _format: &MediaFormat) -> TranscodeResult<Arc<dyn SampleConsumer>> {
            Ok(Arc::new(NullConsumer))
        }

        fn start(&self) -> TranscodeResult<()> {
            let session = self.session.lock().upgrade();
            if let Some(session) = session {
                let _ = session.cancel();
            }
            self.calls.lock().push("start");
            Ok(())
        }

        fn stop(&self) {
            self.calls.lock().push("stop");
        }
    }

    struct CancellingFactory {
        reader: Arc<MockSampleReader>,
        writer: Arc<CancellingWriter>,
    }

    impl PipelineFactory for CancellingFactory {
        fn open_reader(
            &self,
            _source: MediaHandle,
            _offset: u64,
            _length: Option<u64>,
        ) -> Option<Arc<dyn SampleReader>> {
            Some(Arc::clone(&self.reader) as Arc<dyn SampleReader>)
        }

        fn create_writer(&self) -> Arc<dyn SampleWriter> {
            Arc::clone(&self.writer) as Arc<dyn SampleWriter>
        }

        fn create_track_transcoder(
            &self,
            kind: TrackKind,
            callback: Weak<dyn TrackTranscoderCallback>,
            requester: Requester,
        ) -> Arc<dyn TrackTranscoder> {
            MockTrackTranscoder::new(kind, callback, requester, TranscoderBehavior::default())
        }
    }

    #[test]
    fn test_writer_stopped_when_cancel_races_start() {
        let writer = Arc::new(CancellingWriter::default());
        let factory = Arc::new(CancellingFactory {
            reader: Arc::new(MockSampleReader::new(vec![fixtures::avc_video_format()])),
            writer: Arc::clone(&writer),
        });
        let session = MediaTranscoder::create(
            Arc::new(NullCallback),
            factory,
            Requester::new(1, 2),
            None,
        );
        *writer.session.lock() = Arc::downgrade(&session);

        session.configure_source(MediaHandle::new(3)).unwrap();
        session.configure_track_format(0, None).unwrap();
        session.configure_destination(MediaHandle::new(4)).unwrap();
        session.start().unwrap();

        for _ in 0..500 {
            if writer.calls.lock().len() >= 3 {
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(*writer.calls.lock(), vec!["stop", "start", "stop"]);
        assert_eq!(session.state(), SessionState::Cancelled);
    }
}
