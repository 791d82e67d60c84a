use thiserror::Error;

#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Camera access is not authorized")]
    NotAuthorized,

    #[error("Session configuration failed: {details}")]
    ConfigurationFailed { details: String },

    #[error("A session configuration is already in progress")]
    ConfigurationInProgress,

    #[error("Could not lock device for configuration: {details}")]
    DeviceLockFailed { details: String },

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Session queue is closed")]
    QueueClosed,

    #[error("System error: {message}")]
    System { message: String },
}

/// Per-request photo capture failures, delivered through the completion callback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("Platform capture error: {details}")]
    Platform { details: String },

    #[error("Capture finished without photo data")]
    NoPhotoData,

    #[error("Capture session is not ready")]
    SessionNotReady,

    #[error("Capture request {id} is already in flight")]
    DuplicateRequest { id: i64 },

    #[error("Capture request {id} was abandoned by the platform")]
    Abandoned { id: i64 },

    #[error("Session queue is closed")]
    QueueClosed,
}

impl CameraError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }

    pub fn configuration_failed<S: Into<String>>(details: S) -> Self {
        Self::ConfigurationFailed {
            details: details.into(),
        }
    }

    /// Whether the session can still be recovered by calling `initialize` again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CameraError::ConfigurationFailed { .. }
                | CameraError::ConfigurationInProgress
                | CameraError::DeviceLockFailed { .. }
                | CameraError::Capture(_)
        )
    }
}

impl CaptureError {
    pub fn platform<S: Into<String>>(details: S) -> Self {
        Self::Platform {
            details: details.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CameraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CameraError::configuration_failed("no default video device");
        assert_eq!(
            err.to_string(),
            "Session configuration failed: no default video device"
        );

        let err = CameraError::from(CaptureError::DuplicateRequest { id: 7 });
        assert_eq!(err.to_string(), "Capture error: Capture request 7 is already in flight");
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(CameraError::configuration_failed("x").is_recoverable());
        assert!(CameraError::ConfigurationInProgress.is_recoverable());
        assert!(!CameraError::NotAuthorized.is_recoverable());
        assert!(!CameraError::QueueClosed.is_recoverable());
    }
}
