//! Error types for the format module.

use thiserror::Error;

/// Errors that can occur while combining formats.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The base format was not supplied.
    #[error("cannot merge formats: base format is missing")]
    MissingBase,

    /// The overlay format was not supplied.
    #[error("cannot merge formats: overlay format is missing")]
    MissingOverlay,
}
