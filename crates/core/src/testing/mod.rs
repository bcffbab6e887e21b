//! Testing utilities and mock pipeline stages.
//!
//! The mocks run real worker threads and report through the same callback
//! traits as production stages, so sessions can be exercised end to end
//! without codecs or containers.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use transcoder_core::testing::{fixtures, MockPipelineFactory, RecordingCallback};
//!
//! let factory = Arc::new(MockPipelineFactory::with_formats(vec![
//!     fixtures::avc_video_format(),
//!     fixtures::aac_audio_format(),
//! ]));
//! let (callback, mut events) = RecordingCallback::new();
//!
//! // Create a session over the factory, configure it and start it...
//!
//! let event = events.recv().await;
//! ```

mod mock_factory;
mod mock_reader;
mod mock_transcoder;
mod mock_writer;
mod recording_callback;

pub use mock_factory::{MockPipelineFactory, ReaderRequest};
pub use mock_reader::MockSampleReader;
pub use mock_transcoder::{MockTrackTranscoder, TranscoderBehavior};
pub use mock_writer::{MockSampleWriter, RecordedSample, WriterBehavior};
pub use recording_callback::{RecordingCallback, SessionEvent};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::format::{FormatKey, MediaFormat};

    /// Create a 1080p H.264 video track format.
    pub fn avc_video_format() -> MediaFormat {
        MediaFormat::new()
            .with_string(FormatKey::Mime, "video/avc")
            .with_i32(FormatKey::Width, 1920)
            .with_i32(FormatKey::Height, 1080)
            .with_i32(FormatKey::BitRate, 20_000_000)
            .with_i32(FormatKey::FrameRate, 30)
            .with_i64(FormatKey::Duration, 10_000_000)
            .with_string(FormatKey::Language, "und")
    }

    /// Create a stereo AAC audio track format.
    pub fn aac_audio_format() -> MediaFormat {
        MediaFormat::new()
            .with_string(FormatKey::Mime, "audio/mp4a-latm")
            .with_i32(FormatKey::SampleRate, 48_000)
            .with_i32(FormatKey::ChannelCount, 2)
            .with_i32(FormatKey::BitRate, 128_000)
            .with_i64(FormatKey::Duration, 10_000_000)
    }

    /// Create a re-encode request for a lower bitrate HEVC video.
    pub fn hevc_request(bit_rate: i32) -> MediaFormat {
        MediaFormat::new()
            .with_string(FormatKey::Mime, "video/hevc")
            .with_i32(FormatKey::BitRate, bit_rate)
    }
}
