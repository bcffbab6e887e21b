//! Types for the format module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix shared by every video mime type.
pub const VIDEO_MIME_PREFIX: &str = "video/";

/// Prefix shared by every audio mime type.
pub const AUDIO_MIME_PREFIX: &str = "audio/";

/// Returns true if the mime type names a video codec.
pub fn is_video_mime(mime: &str) -> bool {
    mime.starts_with(VIDEO_MIME_PREFIX)
}

/// Returns true if the mime type names an audio codec.
pub fn is_audio_mime(mime: &str) -> bool {
    mime.starts_with(AUDIO_MIME_PREFIX)
}

/// Codec parameter keys understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormatKey {
    #[serde(rename = "mime")]
    Mime,
    #[serde(rename = "durationUs")]
    Duration,
    #[serde(rename = "width")]
    Width,
    #[serde(rename = "height")]
    Height,
    #[serde(rename = "bitrate")]
    BitRate,
    #[serde(rename = "profile")]
    Profile,
    #[serde(rename = "level")]
    Level,
    #[serde(rename = "color-format")]
    ColorFormat,
    #[serde(rename = "color-range")]
    ColorRange,
    #[serde(rename = "color-standard")]
    ColorStandard,
    #[serde(rename = "color-transfer")]
    ColorTransfer,
    #[serde(rename = "frame-rate")]
    FrameRate,
    #[serde(rename = "i-frame-interval")]
    IFrameInterval,
    #[serde(rename = "priority")]
    Priority,
    #[serde(rename = "operating-rate")]
    OperatingRate,
    #[serde(rename = "sample-rate")]
    SampleRate,
    #[serde(rename = "channel-count")]
    ChannelCount,
    #[serde(rename = "language")]
    Language,
    #[serde(rename = "max-input-size")]
    MaxInputSize,
    #[serde(rename = "rotation-degrees")]
    RotationDegrees,
    #[serde(rename = "track-id")]
    TrackId,
}

impl FormatKey {
    /// Returns the wire name of the key.
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatKey::Mime => "mime",
            FormatKey::Duration => "durationUs",
            FormatKey::Width => "width",
            FormatKey::Height => "height",
            FormatKey::BitRate => "bitrate",
            FormatKey::Profile => "profile",
            FormatKey::Level => "level",
            FormatKey::ColorFormat => "color-format",
            FormatKey::ColorRange => "color-range",
            FormatKey::ColorStandard => "color-standard",
            FormatKey::ColorTransfer => "color-transfer",
            FormatKey::FrameRate => "frame-rate",
            FormatKey::IFrameInterval => "i-frame-interval",
            FormatKey::Priority => "priority",
            FormatKey::OperatingRate => "operating-rate",
            FormatKey::SampleRate => "sample-rate",
            FormatKey::ChannelCount => "channel-count",
            FormatKey::Language => "language",
            FormatKey::MaxInputSize => "max-input-size",
            FormatKey::RotationDegrees => "rotation-degrees",
            FormatKey::TrackId => "track-id",
        }
    }
}

impl fmt::Display for FormatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage type of a format value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Int32,
    Int64,
    Float,
}

/// A single typed value in a [`MediaFormat`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum FormatValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Float(f32),
}

impl FormatValue {
    /// Returns the storage type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            FormatValue::String(_) => ValueType::String,
            FormatValue::Int32(_) => ValueType::Int32,
            FormatValue::Int64(_) => ValueType::Int64,
            FormatValue::Float(_) => ValueType::Float,
        }
    }
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatValue::String(v) => write!(f, "string({})", v),
            FormatValue::Int32(v) => write!(f, "int32({})", v),
            FormatValue::Int64(v) => write!(f, "int64({})", v),
            FormatValue::Float(v) => write!(f, "float({})", v),
        }
    }
}

/// Typed key/value record describing one track's codec parameters.
///
/// Cloning produces an independent deep copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaFormat {
    entries: BTreeMap<FormatKey, FormatValue>,
}

impl MediaFormat {
    /// Creates an empty format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a string value.
    pub fn with_string(mut self, key: FormatKey, value: impl Into<String>) -> Self {
        self.set_string(key, value);
        self
    }

    /// Sets a 32-bit integer value.
    pub fn with_i32(mut self, key: FormatKey, value: i32) -> Self {
        self.set_i32(key, value);
        self
    }

    /// Sets a 64-bit integer value.
    pub fn with_i64(mut self, key: FormatKey, value: i64) -> Self {
        self.set_i64(key, value);
        self
    }

    /// Sets a float value.
    pub fn with_f32(mut self, key: FormatKey, value: f32) -> Self {
        self.set_f32(key, value);
        self
    }

    pub fn set(&mut self, key: FormatKey, value: FormatValue) {
        self.entries.insert(key, value);
    }

    pub fn set_string(&mut self, key: FormatKey, value: impl Into<String>) {
        self.set(key, FormatValue::String(value.into()));
    }

    pub fn set_i32(&mut self, key: FormatKey, value: i32) {
        self.set(key, FormatValue::Int32(value));
    }

    pub fn set_i64(&mut self, key: FormatKey, value: i64) {
        self.set(key, FormatValue::Int64(value));
    }

    pub fn set_f32(&mut self, key: FormatKey, value: f32) {
        self.set(key, FormatValue::Float(value));
    }

    pub fn get(&self, key: FormatKey) -> Option<&FormatValue> {
        self.entries.get(&key)
    }

    /// Returns the value for `key` if it is stored as a string.
    pub fn get_string(&self, key: FormatKey) -> Option<&str> {
        match self.get(key) {
            Some(FormatValue::String(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// Returns the value for `key` if it is stored as a 32-bit integer.
    pub fn get_i32(&self, key: FormatKey) -> Option<i32> {
        match self.get(key) {
            Some(FormatValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value for `key` if it is stored as a 64-bit integer.
    pub fn get_i64(&self, key: FormatKey) -> Option<i64> {
        match self.get(key) {
            Some(FormatValue::Int64(v)) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value for `key` if it is stored as a float.
    pub fn get_f32(&self, key: FormatKey) -> Option<f32> {
        match self.get(key) {
            Some(FormatValue::Float(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: FormatKey) -> Option<FormatValue> {
        self.entries.remove(&key)
    }

    pub fn contains(&self, key: FormatKey) -> bool {
        self.entries.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (FormatKey, &FormatValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Returns the mime type, if any.
    pub fn mime(&self) -> Option<&str> {
        self.get_string(FormatKey::Mime)
    }

    /// Returns true if the format carries a video mime type.
    pub fn is_video(&self) -> bool {
        self.mime().is_some_and(is_video_mime)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (key, value) in self.iter() {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
            first = false;
        }
        Ok(())
    }
}
