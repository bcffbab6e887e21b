pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod pipeline;
pub mod session;
pub mod testing;

pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use error::{ErrorKind, TranscodeError, TranscodeResult};
pub use format::{merge_formats, FormatError, FormatKey, FormatValue, MediaFormat};
pub use pipeline::{
    MediaHandle, MediaSample, PipelineFactory, Requester, SampleConsumer, SampleFlags,
    SampleReader, SampleWriter, SampleWriterCallback, TrackKind, TrackTranscoder,
    TrackTranscoderCallback,
};
pub use session::{
    MediaTranscoder, PausedState, SessionConfig, SessionId, SessionState, TrackInfo,
    TranscoderCallback,
};
