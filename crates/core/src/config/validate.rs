use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Teardown thread name is non-empty and has no NUL byte
/// - Source length, when set, is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let session = &config.session;

    if session.teardown_thread_name.is_empty() {
        return Err(ConfigError::ValidationError(
            "session.teardown_thread_name cannot be empty".to_string(),
        ));
    }
    if session.teardown_thread_name.contains('\0') {
        return Err(ConfigError::ValidationError(
            "session.teardown_thread_name cannot contain NUL".to_string(),
        ));
    }

    if session.source_length == Some(0) {
        return Err(ConfigError::ValidationError(
            "session.source_length cannot be 0".to_string(),
        ));
    }

    Ok(())
}
