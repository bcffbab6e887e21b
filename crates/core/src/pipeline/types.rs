//! Types for the pipeline module.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a host-owned source or destination.
///
/// The host decides what the raw value means (typically a file descriptor).
/// Negative values are never valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaHandle(i32);

impl MediaHandle {
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i32 {
        self.0
    }

    pub fn is_valid(&self) -> bool {
        self.0 >= 0
    }
}

impl fmt::Display for MediaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handle#{}", self.0)
    }
}

/// Identity of the client that requested a session.
///
/// Passed through to transcoders that allocate codec resources on the
/// requester's behalf. Opaque to the session itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Requester {
    pub process_id: i32,
    pub user_id: u32,
}

impl Requester {
    pub const fn new(process_id: i32, user_id: u32) -> Self {
        Self {
            process_id,
            user_id,
        }
    }
}

/// How a configured track is carried into the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    /// Encoded samples are copied unchanged.
    Passthrough,
    /// Samples are decoded and re-encoded with a merged output format.
    Transcode,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Passthrough => "passthrough",
            TrackKind::Transcode => "transcode",
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-sample flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleFlags {
    pub key_frame: bool,
    pub end_of_stream: bool,
}

/// One encoded sample travelling from a track transcoder to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaSample {
    pub data: Vec<u8>,
    pub presentation_time_us: i64,
    pub flags: SampleFlags,
}

impl MediaSample {
    pub fn new(data: Vec<u8>, presentation_time_us: i64) -> Self {
        Self {
            data,
            presentation_time_us,
            flags: SampleFlags::default(),
        }
    }

    /// Creates the empty sample that terminates a track.
    pub fn end_of_stream(presentation_time_us: i64) -> Self {
        Self {
            data: Vec::new(),
            presentation_time_us,
            flags: SampleFlags {
                key_frame: false,
                end_of_stream: true,
            },
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.flags.end_of_stream
    }
}
