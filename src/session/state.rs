use crate::error::{CameraError, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Terminal outcome of the permission check plus session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionSetupResult {
    Success,
    NotAuthorized,
    ConfigurationFailed,
}

impl SessionSetupResult {
    pub fn is_success(&self) -> bool {
        matches!(self, SessionSetupResult::Success)
    }

    /// Convert into the matching error for callers that prefer `?`
    pub fn into_result(self) -> Result<()> {
        match self {
            SessionSetupResult::Success => Ok(()),
            SessionSetupResult::NotAuthorized => Err(CameraError::NotAuthorized),
            SessionSetupResult::ConfigurationFailed => Err(CameraError::configuration_failed(
                "capture session could not be configured",
            )),
        }
    }

    /// Text suitable for presenting the outcome to a user
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionSetupResult::Success => "Camera ready",
            SessionSetupResult::NotAuthorized => {
                "SimpleCamera doesn't have permission to use the camera, please change privacy settings"
            }
            SessionSetupResult::ConfigurationFailed => "Unable to capture media",
        }
    }
}

/// Runtime setup state of a session manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    Unconfigured,
    /// The session queue is running the permission check and configuration
    Configuring,
    Ready(SessionSetupResult),
}

impl SetupState {
    pub fn result(&self) -> Option<SessionSetupResult> {
        match self {
            SetupState::Ready(result) => Some(*result),
            _ => None,
        }
    }
}

/// Counters for session activity
#[derive(Debug, Default)]
pub struct SessionStats {
    pub configurations: AtomicU64,
    pub captures_requested: AtomicU64,
    pub captures_succeeded: AtomicU64,
    pub captures_failed: AtomicU64,
    pub focus_adjustments: AtomicU64,
    pub device_lock_failures: AtomicU64,
    pub subject_area_changes: AtomicU64,
}

impl SessionStats {
    pub(crate) fn increment(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current statistics as a snapshot
    pub fn snapshot(&self) -> SessionStatsSnapshot {
        SessionStatsSnapshot {
            configurations: self.configurations.load(Ordering::Relaxed),
            captures_requested: self.captures_requested.load(Ordering::Relaxed),
            captures_succeeded: self.captures_succeeded.load(Ordering::Relaxed),
            captures_failed: self.captures_failed.load(Ordering::Relaxed),
            focus_adjustments: self.focus_adjustments.load(Ordering::Relaxed),
            device_lock_failures: self.device_lock_failures.load(Ordering::Relaxed),
            subject_area_changes: self.subject_area_changes.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of session statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStatsSnapshot {
    pub configurations: u64,
    pub captures_requested: u64,
    pub captures_succeeded: u64,
    pub captures_failed: u64,
    pub focus_adjustments: u64,
    pub device_lock_failures: u64,
    pub subject_area_changes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_result_into_result() {
        assert!(SessionSetupResult::Success.into_result().is_ok());
        assert!(matches!(
            SessionSetupResult::NotAuthorized.into_result(),
            Err(CameraError::NotAuthorized)
        ));
        assert!(matches!(
            SessionSetupResult::ConfigurationFailed.into_result(),
            Err(CameraError::ConfigurationFailed { .. })
        ));
    }

    #[test]
    fn test_setup_state_result() {
        assert_eq!(SetupState::Unconfigured.result(), None);
        assert_eq!(SetupState::Configuring.result(), None);
        assert_eq!(
            SetupState::Ready(SessionSetupResult::NotAuthorized).result(),
            Some(SessionSetupResult::NotAuthorized)
        );
    }
}
