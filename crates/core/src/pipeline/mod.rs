//! Pipeline stages coordinated by a transcoding session.
//!
//! The session does not demux, transcode or mux anything itself. It drives
//! three kinds of stages through the traits in this module:
//! - [`SampleReader`]: demuxes encoded samples from the source
//! - [`TrackTranscoder`]: moves one track to the writer, either copying samples
//!   unchanged or re-encoding them
//! - [`SampleWriter`]: muxes output samples into the destination
//!
//! Hosts provide all three through a [`PipelineFactory`].

mod traits;
mod types;

pub use traits::{
    PipelineFactory, SampleConsumer, SampleReader, SampleWriter, SampleWriterCallback,
    TrackTranscoder, TrackTranscoderCallback,
};
pub use types::{MediaHandle, MediaSample, Requester, SampleFlags, TrackKind};
