//! Status taxonomy shared by the session and its collaborators.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a transcoding session or one of its pipeline stages.
///
/// The set of variants is closed. Collaborators report their own failures
/// with these variants so the session can forward them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscodeError {
    /// Malformed or absent caller input (bad handle, out-of-range index).
    #[error("invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    /// Call made out of the required order.
    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },

    /// Unparsable container or a conversion this pipeline cannot perform.
    #[error("unsupported: {reason}")]
    Unsupported { reason: String },

    /// Expected metadata is missing.
    #[error("malformed: {reason}")]
    Malformed { reason: String },

    /// Failure inside a collaborator.
    #[error("unknown error: {reason}")]
    Unknown { reason: String },
}

/// Discriminant of a [`TranscodeError`], without the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidParameter,
    InvalidOperation,
    Unsupported,
    Malformed,
    Unknown,
}

impl ErrorKind {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidParameter => "invalid_parameter",
            ErrorKind::InvalidOperation => "invalid_operation",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TranscodeError {
    /// Creates a new invalid parameter error.
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Creates a new invalid operation error.
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidOperation {
            reason: reason.into(),
        }
    }

    /// Creates a new unsupported error.
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::Unsupported {
            reason: reason.into(),
        }
    }

    /// Creates a new malformed error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    /// Creates a new unknown error.
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self::Unknown {
            reason: reason.into(),
        }
    }

    /// Returns the status code of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::InvalidOperation { .. } => ErrorKind::InvalidOperation,
            Self::Unsupported { .. } => ErrorKind::Unsupported,
            Self::Malformed { .. } => ErrorKind::Malformed,
            Self::Unknown { .. } => ErrorKind::Unknown,
        }
    }

    /// Returns the human-readable reason.
    pub fn reason(&self) -> &str {
        match self {
            Self::InvalidParameter { reason }
            | Self::InvalidOperation { reason }
            | Self::Unsupported { reason }
            | Self::Malformed { reason }
            | Self::Unknown { reason } => reason,
        }
    }
}

/// Result alias used across the crate.
pub type TranscodeResult<T> = Result<T, TranscodeError>;
