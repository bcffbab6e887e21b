use serde::{Deserialize, Serialize};

use crate::session::SessionConfig;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Defaults for sessions created by the host.
    #[serde(default)]
    pub session: SessionConfig,
}
