//! Track format descriptors.
//!
//! A [`MediaFormat`] is a typed key/value record describing the codec
//! parameters of one track. [`merge_formats`] combines a source track's format
//! with a client-requested override using a fixed allow-list of keys.
//!
//! # Example
//!
//! ```
//! use transcoder_core::format::{merge_formats, FormatKey, MediaFormat};
//!
//! let source = MediaFormat::new()
//!     .with_string(FormatKey::Mime, "video/avc")
//!     .with_i32(FormatKey::BitRate, 20_000_000);
//! let request = MediaFormat::new().with_i32(FormatKey::BitRate, 4_000_000);
//!
//! let merged = merge_formats(Some(&source), Some(&request)).unwrap();
//! assert_eq!(merged.get_i32(FormatKey::BitRate), Some(4_000_000));
//! assert_eq!(merged.mime(), Some("video/avc"));
//! ```

mod error;
mod merge;
mod types;

pub use error::FormatError;
pub use merge::{is_mergeable_key, merge_formats};
pub use types::{
    is_audio_mime, is_video_mime, FormatKey, FormatValue, MediaFormat, ValueType,
    AUDIO_MIME_PREFIX, VIDEO_MIME_PREFIX,
};
