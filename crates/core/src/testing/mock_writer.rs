//! Mock sample writer for testing.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};

use crate::error::{TranscodeError, TranscodeResult};
use crate::format::MediaFormat;
use crate::pipeline::{MediaHandle, MediaSample, SampleConsumer, SampleWriter, SampleWriterCallback};

/// Failures a [`MockSampleWriter`] should simulate.
#[derive(Debug, Clone, Default)]
pub struct WriterBehavior {
    pub init_error: Option<TranscodeError>,
    pub add_track_error: Option<TranscodeError>,
    pub start_error: Option<TranscodeError>,
}

/// A sample received by the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSample {
    /// Writer track the sample was delivered to.
    pub track: usize,
    pub sample: MediaSample,
}

#[derive(Default)]
struct WriterState {
    callback: Option<Weak<dyn SampleWriterCallback>>,
    destination: Option<MediaHandle>,
    tracks: Vec<MediaFormat>,
    samples: Vec<RecordedSample>,
    finished_tracks: usize,
    start_calls: usize,
    stopped: bool,
    stop_threads: Vec<Option<String>>,
}

/// Mock implementation of the SampleWriter trait.
///
/// `start` launches a worker thread that waits until every added track has
/// delivered its end-of-stream sample, then reports 100% progress and a
/// successful finish. `stop` makes the worker report a failure instead, the
/// way a real muxer reports an interrupted file.
pub struct MockSampleWriter {
    behavior: WriterBehavior,
    state: Mutex<WriterState>,
    wake: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
    weak_self: Weak<MockSampleWriter>,
}

impl MockSampleWriter {
    /// Create a writer that succeeds at everything.
    pub fn new() -> Arc<Self> {
        Self::with_behavior(WriterBehavior::default())
    }

    /// Create a writer that simulates the given failures.
    pub fn with_behavior(behavior: WriterBehavior) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            behavior,
            state: Mutex::new(WriterState::default()),
            wake: Condvar::new(),
            worker: Mutex::new(None),
            weak_self: weak_self.clone(),
        })
    }

    /// Destination passed to `init`.
    pub fn destination(&self) -> Option<MediaHandle> {
        self.state.lock().destination
    }

    /// Formats of the added tracks, in order.
    pub fn track_formats(&self) -> Vec<MediaFormat> {
        self.state.lock().tracks.clone()
    }

    /// All samples received so far.
    pub fn samples(&self) -> Vec<RecordedSample> {
        self.state.lock().samples.clone()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().start_calls
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_threads.len()
    }

    /// Names of the threads `stop` was called from.
    pub fn stop_thread_names(&self) -> Vec<Option<String>> {
        self.state.lock().stop_threads.clone()
    }

    fn on_sample(&self, track: usize, sample: MediaSample) {
        let mut state = self.state.lock();
        if sample.is_end_of_stream() {
            state.finished_tracks += 1;
        }
        state.samples.push(RecordedSample { track, sample });
        self.wake.notify_all();
    }

    /// Worker body: waits for every track to finish or for `stop`.
    fn run(&self) {
        let (stopped, callback) = {
            let mut state = self.state.lock();
            while !state.stopped && state.finished_tracks < state.tracks.len() {
                self.wake.wait(&mut state);
            }
            (state.stopped, state.callback.clone())
        };

        let Some(callback) = callback.and_then(|c| c.upgrade()) else {
            return;
        };
        if stopped {
            callback.on_writer_finished(Err(TranscodeError::unknown("writer stopped")));
        } else {
            callback.on_writer_progress(100);
            callback.on_writer_finished(Ok(()));
        }
    }
}

impl SampleWriter for MockSampleWriter {
    fn init(
        &self,
        destination: MediaHandle,
        callback: Weak<dyn SampleWriterCallback>,
    ) -> TranscodeResult<()> {
        if let Some(err) = self.behavior.init_error.clone() {
            return Err(err);
        }
        let mut state = self.state.lock();
        state.destination = Some(destination);
        state.callback = Some(callback);
        Ok(())
    }

    fn add_track(&self, format: &MediaFormat) -> TranscodeResult<Arc<dyn SampleConsumer>> {
        if let Some(err) = self.behavior.add_track_error.clone() {
            return Err(err);
        }
        let mut state = self.state.lock();
        state.tracks.push(format.clone());
        Ok(Arc::new(WriterTrack {
            writer: self.weak_self.clone(),
            track: state.tracks.len() - 1,
        }))
    }

    fn start(&self) -> TranscodeResult<()> {
        if let Some(err) = self.behavior.start_error.clone() {
            return Err(err);
        }
        let Some(writer) = self.weak_self.upgrade() else {
            return Err(TranscodeError::unknown("writer dropped"));
        };
        self.state.lock().start_calls += 1;

        let handle = thread::Builder::new()
            .name("mock-writer".to_string())
            .spawn(move || writer.run())
            .map_err(|e| TranscodeError::unknown(e.to_string()))?;
        *self.worker.lock() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        {
            let mut state = self.state.lock();
            state.stopped = true;
            state
                .stop_threads
                .push(thread::current().name().map(str::to_string));
            self.wake.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }
}

/// Consumer for one writer track.
struct WriterTrack {
    writer: Weak<MockSampleWriter>,
    track: usize,
}

impl SampleConsumer for WriterTrack {
    fn on_sample(&self, sample: MediaSample) {
        if let Some(writer) = self.writer.upgrade() {
            writer.on_sample(self.track, sample);
        }
    }
}
