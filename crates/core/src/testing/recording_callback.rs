//! Recording session callback for testing.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::TranscodeError;
use crate::session::{MediaTranscoder, SessionId, TranscoderCallback};

/// An event delivered to a [`RecordingCallback`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Finished(SessionId),
    Error(SessionId, TranscodeError),
    Progress(SessionId, u8),
}

impl SessionEvent {
    /// Whether this is a final callback.
    pub fn is_final(&self) -> bool {
        !matches!(self, SessionEvent::Progress(..))
    }
}

/// Records every callback and forwards it to a channel.
///
/// Optionally cancels the session from inside the final callback, the way a
/// client cleaning up on completion would.
pub struct RecordingCallback {
    events: Mutex<Vec<SessionEvent>>,
    sender: mpsc::UnboundedSender<SessionEvent>,
    finished: AtomicUsize,
    errors: AtomicUsize,
    cancel_on_final: bool,
}

impl RecordingCallback {
    /// Create a callback and the receiver its events are forwarded to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        Self::build(false)
    }

    /// Like [`new`](Self::new), but calls `cancel` on the session from inside
    /// `on_finished` and `on_error`.
    pub fn cancelling() -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        Self::build(true)
    }

    fn build(cancel_on_final: bool) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let callback = Self {
            events: Mutex::new(Vec::new()),
            sender,
            finished: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            cancel_on_final,
        };
        (callback, receiver)
    }

    /// All events recorded so far.
    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn error_count(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    /// Number of final callbacks received.
    pub fn final_count(&self) -> usize {
        self.finished_count() + self.error_count()
    }

    fn record(&self, event: SessionEvent) {
        self.events.lock().push(event.clone());
        let _ = self.sender.send(event);
    }

    fn cancel_if_requested(&self, session: &MediaTranscoder) {
        if self.cancel_on_final {
            let _ = session.cancel();
        }
    }
}

impl TranscoderCallback for RecordingCallback {
    fn on_finished(&self, session: &MediaTranscoder) {
        self.finished.fetch_add(1, Ordering::SeqCst);
        self.cancel_if_requested(session);
        self.record(SessionEvent::Finished(session.id()));
    }

    fn on_error(&self, session: &MediaTranscoder, error: TranscodeError) {
        self.errors.fetch_add(1, Ordering::SeqCst);
        self.cancel_if_requested(session);
        self.record(SessionEvent::Error(session.id(), error));
    }

    fn on_progress_update(&self, session: &MediaTranscoder, progress: u8) {
        self.record(SessionEvent::Progress(session.id(), progress));
    }
}
