//! Mock sample reader for testing.

use parking_lot::Mutex;

use crate::error::{TranscodeError, TranscodeResult};
use crate::format::MediaFormat;
use crate::pipeline::SampleReader;

/// Mock implementation of the SampleReader trait.
///
/// Provides controllable behavior for testing:
/// - Fixed track formats, including tracks without one
/// - Record selected tracks and sequential access changes
/// - Simulate track selection failure
///
/// # Example
///
/// ```rust,ignore
/// use transcoder_core::testing::{fixtures, MockSampleReader};
///
/// let reader = MockSampleReader::new(vec![
///     fixtures::avc_video_format(),
///     fixtures::aac_audio_format(),
/// ]);
///
/// // ...configure a session over it...
///
/// assert_eq!(reader.selected_tracks(), vec![0, 1]);
/// assert_eq!(reader.sequential_access_enabled(), Some(true));
/// ```
#[derive(Debug, Default)]
pub struct MockSampleReader {
    /// Track formats; `None` simulates a track the container does not describe.
    formats: Vec<Option<MediaFormat>>,
    /// Track indices passed to `select_track`, in call order.
    selected: Mutex<Vec<usize>>,
    /// Values passed to `set_enforce_sequential_access`, in call order.
    sequential_access: Mutex<Vec<bool>>,
    /// If set, the next `select_track` will fail with this error.
    next_select_error: Mutex<Option<TranscodeError>>,
}

impl MockSampleReader {
    /// Create a reader whose every track has a format.
    pub fn new(formats: Vec<MediaFormat>) -> Self {
        Self::with_tracks(formats.into_iter().map(Some).collect())
    }

    /// Create a reader where some tracks may lack a format.
    pub fn with_tracks(formats: Vec<Option<MediaFormat>>) -> Self {
        Self {
            formats,
            ..Self::default()
        }
    }

    /// Configure the next `select_track` to fail with the given error.
    pub fn set_next_select_error(&self, error: TranscodeError) {
        *self.next_select_error.lock() = Some(error);
    }

    /// Get the selected track indices.
    pub fn selected_tracks(&self) -> Vec<usize> {
        self.selected.lock().clone()
    }

    /// Get every sequential access change.
    pub fn sequential_access_changes(&self) -> Vec<bool> {
        self.sequential_access.lock().clone()
    }

    /// Get the last sequential access value set, if any.
    pub fn sequential_access_enabled(&self) -> Option<bool> {
        self.sequential_access.lock().last().copied()
    }
}

impl SampleReader for MockSampleReader {
    fn track_count(&self) -> usize {
        self.formats.len()
    }

    fn track_format(&self, track_index: usize) -> Option<MediaFormat> {
        self.formats.get(track_index).cloned().flatten()
    }

    fn select_track(&self, track_index: usize) -> TranscodeResult<()> {
        if let Some(err) = self.next_select_error.lock().take() {
            return Err(err);
        }
        if track_index >= self.formats.len() {
            return Err(TranscodeError::invalid_parameter(format!(
                "no track #{}",
                track_index
            )));
        }
        self.selected.lock().push(track_index);
        Ok(())
    }

    fn set_enforce_sequential_access(&self, enforce: bool) {
        self.sequential_access.lock().push(enforce);
    }
}
