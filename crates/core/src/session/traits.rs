//! Client-facing callback trait.

use crate::error::TranscodeError;

use super::transcoder::MediaTranscoder;

/// Receives the outcome of a session.
///
/// Exactly one of [`on_finished`](Self::on_finished) and
/// [`on_error`](Self::on_error) is called per started session, at most once.
/// Callbacks run on pipeline worker threads. Calling
/// [`MediaTranscoder::cancel`] from inside a callback is allowed.
pub trait TranscoderCallback: Send + Sync {
    /// The destination was written completely.
    fn on_finished(&self, session: &MediaTranscoder);

    /// The session failed. The destination is incomplete and should be
    /// discarded by the client.
    fn on_error(&self, session: &MediaTranscoder, error: TranscodeError);

    /// Progress in percent (0..=100). May be called many times.
    fn on_progress_update(&self, session: &MediaTranscoder, progress: u8);
}
