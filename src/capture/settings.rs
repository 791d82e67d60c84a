use crate::platform::FlashMode;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Identifier of one in-flight capture, taken from the settings it was issued with
pub type RequestId = i64;

static NEXT_SETTINGS_ID: AtomicI64 = AtomicI64::new(1);

/// Per-capture photo settings. Every instance carries a process-unique id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoSettings {
    unique_id: RequestId,
    pub flash_mode: FlashMode,
    pub high_resolution_photo_enabled: bool,
}

impl PhotoSettings {
    pub fn new() -> Self {
        Self {
            unique_id: NEXT_SETTINGS_ID.fetch_add(1, Ordering::Relaxed),
            flash_mode: FlashMode::Off,
            high_resolution_photo_enabled: false,
        }
    }

    /// Copy the parameters of `other` under a fresh id, so they can be issued again
    pub fn from_settings(other: &PhotoSettings) -> Self {
        Self {
            flash_mode: other.flash_mode,
            high_resolution_photo_enabled: other.high_resolution_photo_enabled,
            ..Self::new()
        }
    }

    pub fn with_flash_mode(mut self, flash_mode: FlashMode) -> Self {
        self.flash_mode = flash_mode;
        self
    }

    pub fn with_high_resolution(mut self, enabled: bool) -> Self {
        self.high_resolution_photo_enabled = enabled;
        self
    }

    pub fn unique_id(&self) -> RequestId {
        self.unique_id
    }
}

impl Default for PhotoSettings {
    fn default() -> Self {
        Self::new()
    }
}
