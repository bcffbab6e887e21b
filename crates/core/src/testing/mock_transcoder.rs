//! Mock track transcoder for testing.

use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{TranscodeError, TranscodeResult};
use crate::format::MediaFormat;
use crate::pipeline::{
    MediaSample, Requester, SampleConsumer, SampleReader, TrackKind, TrackTranscoder,
    TrackTranscoderCallback,
};

/// How a [`MockTrackTranscoder`] behaves once created.
#[derive(Debug, Clone)]
pub struct TranscoderBehavior {
    /// Samples delivered before the end-of-stream sample.
    pub sample_count: usize,
    /// Pause between samples.
    pub sample_interval: Option<Duration>,
    /// Returned from `configure`.
    pub configure_error: Option<TranscodeError>,
    /// Returned from `start`.
    pub start_error: Option<TranscodeError>,
    /// Reported through `on_track_error` right after the format.
    pub runtime_error: Option<TranscodeError>,
    /// Never report a format; the worker idles until stopped.
    pub withhold_format: bool,
    /// Report the format twice.
    pub duplicate_format: bool,
    /// `output_format` returns `None` even after the format was reported.
    pub omit_output_format: bool,
}

impl Default for TranscoderBehavior {
    fn default() -> Self {
        Self {
            sample_count: 3,
            sample_interval: None,
            configure_error: None,
            start_error: None,
            runtime_error: None,
            withhold_format: false,
            duplicate_format: false,
            omit_output_format: false,
        }
    }
}

impl TranscoderBehavior {
    pub fn failing_configure(error: TranscodeError) -> Self {
        Self {
            configure_error: Some(error),
            ..Self::default()
        }
    }

    pub fn failing_start(error: TranscodeError) -> Self {
        Self {
            start_error: Some(error),
            ..Self::default()
        }
    }

    pub fn failing_at_runtime(error: TranscodeError) -> Self {
        Self {
            runtime_error: Some(error),
            ..Self::default()
        }
    }

    /// A transcoder that stays busy until stopped.
    pub fn stalled() -> Self {
        Self {
            withhold_format: true,
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct TranscoderState {
    track_index: Option<usize>,
    requested_format: Option<MediaFormat>,
    output_format: Option<MediaFormat>,
    consumer: Option<Arc<dyn SampleConsumer>>,
    start_calls: usize,
    stop_calls: usize,
    stopped: bool,
}

/// Mock implementation of the TrackTranscoder trait.
///
/// `start` launches a worker thread that reports the output format, waits for
/// a sample consumer, delivers `sample_count` samples plus end-of-stream and
/// reports the track finished. The output format is the requested format for
/// transcode tracks and the source track format for passthrough tracks.
pub struct MockTrackTranscoder {
    kind: TrackKind,
    requester: Requester,
    callback: Weak<dyn TrackTranscoderCallback>,
    behavior: TranscoderBehavior,
    state: Mutex<TranscoderState>,
    wake: Condvar,
    worker: Mutex<Option<JoinHandle<()>>>,
    weak_self: Weak<MockTrackTranscoder>,
}

impl MockTrackTranscoder {
    pub fn new(
        kind: TrackKind,
        callback: Weak<dyn TrackTranscoderCallback>,
        requester: Requester,
        behavior: TranscoderBehavior,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            kind,
            requester,
            callback,
            behavior,
            state: Mutex::new(TranscoderState::default()),
            wake: Condvar::new(),
            worker: Mutex::new(None),
            weak_self: weak_self.clone(),
        })
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn requester(&self) -> Requester {
        self.requester
    }

    /// Source track index passed to `configure`.
    pub fn track_index(&self) -> Option<usize> {
        self.state.lock().track_index
    }

    /// Output format passed to `configure`.
    pub fn requested_format(&self) -> Option<MediaFormat> {
        self.state.lock().requested_format.clone()
    }

    pub fn has_consumer(&self) -> bool {
        self.state.lock().consumer.is_some()
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().start_calls
    }

    pub fn stop_count(&self) -> usize {
        self.state.lock().stop_calls
    }

    fn is_stopped(&self) -> bool {
        self.state.lock().stopped
    }

    /// Blocks until `stop` is called.
    fn idle_until_stopped(&self) {
        let mut state = self.state.lock();
        while !state.stopped {
            self.wake.wait(&mut state);
        }
    }

    /// Blocks until a consumer is set. Returns `None` if stopped first.
    fn wait_for_consumer(&self) -> Option<Arc<dyn SampleConsumer>> {
        let mut state = self.state.lock();
        loop {
            if state.stopped {
                return None;
            }
            if let Some(consumer) = &state.consumer {
                return Some(Arc::clone(consumer));
            }
            self.wake.wait(&mut state);
        }
    }

    /// Worker body.
    fn run(&self) {
        if self.is_stopped() {
            return;
        }
        if self.behavior.withhold_format {
            self.idle_until_stopped();
            return;
        }
        let Some(callback) = self.callback.upgrade() else {
            return;
        };

        callback.on_track_format_available(self);
        if self.behavior.duplicate_format {
            callback.on_track_format_available(self);
        }

        if let Some(err) = self.behavior.runtime_error.clone() {
            callback.on_track_error(self, err);
            return;
        }

        let Some(consumer) = self.wait_for_consumer() else {
            return;
        };
        let mut presentation_time_us = 0;
        for i in 0..self.behavior.sample_count {
            if self.is_stopped() {
                return;
            }
            if let Some(interval) = self.behavior.sample_interval {
                thread::sleep(interval);
            }
            let mut sample = MediaSample::new(vec![i as u8; 16], presentation_time_us);
            sample.flags.key_frame = i == 0;
            consumer.on_sample(sample);
            presentation_time_us += 33_333;
        }
        consumer.on_sample(MediaSample::end_of_stream(presentation_time_us));
        callback.on_track_finished(self);
    }
}

impl TrackTranscoder for MockTrackTranscoder {
    fn configure(
        &self,
        reader: Arc<dyn SampleReader>,
        track_index: usize,
        format: Option<MediaFormat>,
    ) -> TranscodeResult<()> {
        if let Some(err) = self.behavior.configure_error.clone() {
            return Err(err);
        }
        let output_format = match &format {
            Some(format) => Some(format.clone()),
            None => reader.track_format(track_index),
        };

        let mut state = self.state.lock();
        state.track_index = Some(track_index);
        state.requested_format = format;
        state.output_format = output_format;
        Ok(())
    }

    fn set_sample_consumer(&self, consumer: Arc<dyn SampleConsumer>) {
        self.state.lock().consumer = Some(consumer);
        self.wake.notify_all();
    }

    fn start(&self) -> TranscodeResult<()> {
        if let Some(err) = self.behavior.start_error.clone() {
            return Err(err);
        }
        let Some(transcoder) = self.weak_self.upgrade() else {
            return Err(TranscodeError::unknown("transcoder dropped"));
        };
        self.state.lock().start_calls += 1;

        let handle = thread::Builder::new()
            .name(format!("mock-{}", self.kind))
            .spawn(move || transcoder.run())
            .map_err(|e| TranscodeError::unknown(e.to_string()))?;

        *self.worker.lock() = Some(handle);
        Ok(())
    }

    fn stop(&self) {
        {
            let mut state = self.state.lock();
            state.stopped = true;
            state.stop_calls += 1;
            self.wake.notify_all();
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
    }

    fn output_format(&self) -> Option<MediaFormat> {
        if self.behavior.omit_output_format {
            return None;
        }
        self.state.lock().output_format.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixtures, MockSampleReader};
    use std::sync::mpsc;

    #[derive(Debug, PartialEq)]
    enum Event {
        Format,
        Finished,
        Error,
    }

    struct ChannelCallback(Mutex<mpsc::Sender<Event>>);

    impl TrackTranscoderCallback for ChannelCallback {
        fn on_track_format_available(&self, _transcoder: &dyn TrackTranscoder) {
            let _ = self.0.lock().send(Event::Format);
        }

        fn on_track_finished(&self, _transcoder: &dyn TrackTranscoder) {
            let _ = self.0.lock().send(Event::Finished);
        }

        fn on_track_error(&self, _transcoder: &dyn TrackTranscoder, _error: TranscodeError) {
            let _ = self.0.lock().send(Event::Error);
        }
    }

    struct NullConsumer;

    impl SampleConsumer for NullConsumer {
        fn on_sample(&self, _sample: MediaSample) {}
    }

    fn transcoder(
        behavior: TranscoderBehavior,
    ) -> (Arc<MockTrackTranscoder>, Arc<ChannelCallback>, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel();
        let callback = Arc::new(ChannelCallback(Mutex::new(tx)));
        let weak: Weak<dyn TrackTranscoderCallback> = Arc::<ChannelCallback>::downgrade(&callback);
        let transcoder =
            MockTrackTranscoder::new(TrackKind::Passthrough, weak, Requester::new(1, 2), behavior);
        (transcoder, callback, rx)
    }

    fn recv(rx: &mpsc::Receiver<Event>) -> Event {
        rx.recv_timeout(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_passthrough_uses_source_format() {
        let reader = Arc::new(MockSampleReader::new(vec![fixtures::aac_audio_format()]));
        let (transcoder, _callback, _rx) = transcoder(TranscoderBehavior::default());

        transcoder.configure(reader, 0, None).unwrap();
        assert_eq!(transcoder.output_format(), Some(fixtures::aac_audio_format()));
        assert_eq!(transcoder.requested_format(), None);
    }

    #[test]
    fn test_runs_to_completion() {
        let reader = Arc::new(MockSampleReader::new(vec![fixtures::avc_video_format()]));
        let (transcoder, _callback, rx) = transcoder(TranscoderBehavior::default());
        transcoder.configure(reader, 0, None).unwrap();
        transcoder.start().unwrap();

        assert_eq!(recv(&rx), Event::Format);
        transcoder.set_sample_consumer(Arc::new(NullConsumer));
        assert_eq!(recv(&rx), Event::Finished);
        transcoder.stop();
        assert_eq!(transcoder.stop_count(), 1);
    }

    #[test]
    fn test_runtime_error() {
        let reader = Arc::new(MockSampleReader::new(vec![fixtures::avc_video_format()]));
        let (transcoder, _callback, rx) =
            transcoder(TranscoderBehavior::failing_at_runtime(TranscodeError::unknown("codec")));
        transcoder.configure(reader, 0, None).unwrap();
        transcoder.start().unwrap();

        assert_eq!(recv(&rx), Event::Format);
        assert_eq!(recv(&rx), Event::Error);
        transcoder.stop();
    }

    #[test]
    fn test_stalled_until_stopped() {
        let (transcoder, _callback, rx) = transcoder(TranscoderBehavior::stalled());
        transcoder.start().unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

        transcoder.stop();
        assert!(rx.try_recv().is_err());
    }
}
