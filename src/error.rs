//! Engine error types.
//!
//! One error enum covers the whole control surface. Nothing on the audio
//! thread ever returns one of these synchronously; faults detected there are
//! surfaced through the lifecycle state instead.

use thiserror::Error;

/// Errors reported by the engine's control-thread operations.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The requested session format is out of range (zero sample rate,
    /// zero channels, or more channels than the engine supports).
    #[error("invalid session config: {reason}")]
    InvalidConfig { reason: String },

    /// The output device could not be acquired or refused the requested
    /// stream format at start time.
    #[error("audio device unavailable: {0}")]
    DeviceUnavailable(String),

    /// `start` was called while a session is already live. The existing
    /// session is left untouched.
    #[error("engine is already running")]
    AlreadyRunning,

    /// An operation that needs a live session was called without one.
    #[error("engine is not running")]
    NotRunning,

    /// The parameter document could not be decoded or referenced unknown
    /// stages or parameters. The live state is left unchanged.
    #[error("malformed state document: {0}")]
    MalformedState(String),

    /// The device failed while running; the session is in the error state
    /// and must be stopped before a new start.
    #[error("audio device failed while running")]
    DeviceFailure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::InvalidConfig {
            reason: "channel count 9 exceeds maximum".to_string(),
        };
        assert!(err.to_string().contains("channel count 9"));

        let err = EngineError::DeviceUnavailable("no default device".to_string());
        assert!(err.to_string().contains("no default device"));

        assert_eq!(
            EngineError::AlreadyRunning.to_string(),
            "engine is already running"
        );
    }

    #[test]
    fn test_error_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<EngineError>();
    }
}
