//! Configuration for transcoding sessions.

use serde::{Deserialize, Serialize};

/// Configuration applied to every session created with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Switch the reader to enforced sequential access once every track has
    /// reported its output format.
    #[serde(default = "default_enforce_sequential_access")]
    pub enforce_sequential_access: bool,

    /// Name of the thread that tears the pipeline down after the final
    /// callback.
    #[serde(default = "default_teardown_thread_name")]
    pub teardown_thread_name: String,

    /// Byte offset of the media data within the source.
    #[serde(default)]
    pub source_offset: u64,

    /// Length of the media data in bytes. Unset reads to the end of the source.
    #[serde(default)]
    pub source_length: Option<u64>,
}

fn default_enforce_sequential_access() -> bool {
    true
}

fn default_teardown_thread_name() -> String {
    "transcoder-teardown".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enforce_sequential_access: default_enforce_sequential_access(),
            teardown_thread_name: default_teardown_thread_name(),
            source_offset: 0,
            source_length: None,
        }
    }
}

impl SessionConfig {
    /// Whether the teardown thread name can be given to a spawned thread.
    pub fn has_valid_thread_name(&self) -> bool {
        !self.teardown_thread_name.is_empty() && !self.teardown_thread_name.contains('\0')
    }

    /// Enables or disables sequential access at writer start.
    pub fn with_sequential_access(mut self, enabled: bool) -> Self {
        self.enforce_sequential_access = enabled;
        self
    }

    /// Sets the teardown thread name.
    pub fn with_teardown_thread_name(mut self, name: impl Into<String>) -> Self {
        self.teardown_thread_name = name.into();
        self
    }

    /// Restricts reading to a byte range of the source.
    pub fn with_source_range(mut self, offset: u64, length: Option<u64>) -> Self {
        self.source_offset = offset;
        self.source_length = length;
        self
    }
}
