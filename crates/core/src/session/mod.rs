//! Transcoding sessions.
//!
//! A session is configured in three steps and then started:
//!
//! 1. [`MediaTranscoder::configure_source`] opens the source and captures its
//!    track formats.
//! 2. [`MediaTranscoder::configure_track_format`] adds each track to keep,
//!    either copied unchanged or re-encoded.
//! 3. [`MediaTranscoder::configure_destination`] prepares the writer.
//!
//! After [`MediaTranscoder::start`] the outcome arrives through the
//! [`TranscoderCallback`] passed at creation.

mod config;
mod traits;
mod transcoder;
mod types;

pub use config::SessionConfig;
pub use traits::TranscoderCallback;
pub use transcoder::MediaTranscoder;
pub use types::{PausedState, SessionId, SessionState, TrackInfo};
