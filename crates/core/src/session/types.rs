//! Types for the session module.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::pipeline::TrackKind;

/// Unique identifier of a session, used to correlate logs and callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Destination or tracks still missing.
    Unconfigured,
    /// Ready to start.
    Configured,
    /// Track transcoders have been started.
    Running,
    /// The finished callback was delivered.
    Finished,
    /// The error callback was delivered.
    Errored,
    /// Cancelled before any final callback was delivered.
    Cancelled,
}

impl SessionState {
    /// Whether no further pipeline activity will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Finished | SessionState::Errored | SessionState::Cancelled
        )
    }
}

/// Token returned by `pause()`.
///
/// Carries no stream position or codec state: resuming restarts the
/// configured tracks from the beginning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PausedState {
    _private: (),
}

/// Summary of one configured track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Index of the source track.
    pub track_index: usize,
    pub kind: TrackKind,
}
