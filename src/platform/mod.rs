pub mod mock;

use crate::capture::{CaptureEventSink, PhotoSettings};
use crate::error::Result;
use crate::orientation::{DeviceOrientation, DevicePoint, VideoOrientation};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::broadcast;

pub use mock::{
    CaptureScript, MockDevice, MockPlatform, MockSession, MockSurface, OperationLog, SAMPLE_PHOTO,
};

/// Camera authorization state reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevicePosition {
    Back,
    Front,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPreset {
    Photo,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FocusMode {
    Locked,
    AutoFocus,
    ContinuousAutoFocus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExposureMode {
    Locked,
    AutoExpose,
    ContinuousAutoExposure,
    Custom,
}

/// Entry point into the platform media framework
#[async_trait]
pub trait CameraPlatform: Send + Sync + 'static {
    /// Current camera authorization without prompting
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompt the user for camera access and wait for the answer
    async fn request_access(&self) -> bool;

    /// Default wide-angle video device at the given position
    fn default_device(&self, position: DevicePosition) -> Option<Arc<dyn CaptureDevice>>;

    /// Wrap a device as a session input
    fn create_input(&self, device: Arc<dyn CaptureDevice>) -> Result<DeviceInput>;

    fn create_session(&self) -> Arc<dyn CaptureSession>;

    fn device_orientation(&self) -> DeviceOrientation;
}

/// Runtime object coordinating a video input and a photo output
pub trait CaptureSession: Send + Sync {
    fn begin_configuration(&self);
    fn commit_configuration(&self);

    fn can_set_preset(&self, preset: SessionPreset) -> bool;
    fn set_preset(&self, preset: SessionPreset);
    fn set_automatically_configures_wide_color(&self, enabled: bool);

    fn can_add_input(&self, input: &DeviceInput) -> bool;
    fn add_input(&self, input: &DeviceInput);
    fn remove_input(&self, input: &DeviceInput);

    fn can_add_photo_output(&self) -> bool;
    fn add_photo_output(&self);
    fn remove_photo_output(&self);
    fn set_high_resolution_capture_enabled(&self, enabled: bool);

    /// Apply an orientation to the photo output's video connection, if it has one
    fn set_photo_orientation(&self, orientation: VideoOrientation);

    /// Issue a capture. Progress is reported through `sink`.
    fn capture_photo(&self, settings: &PhotoSettings, sink: CaptureEventSink);

    fn start_running(&self);
    fn stop_running(&self);
    fn is_running(&self) -> bool;
}

/// A physical capture device
pub trait CaptureDevice: Send + Sync {
    fn unique_id(&self) -> String;
    fn position(&self) -> DevicePosition;
    fn is_flash_available(&self) -> bool;

    fn lock_for_configuration(&self) -> Result<()>;
    fn unlock_for_configuration(&self);

    fn is_focus_point_of_interest_supported(&self) -> bool;
    fn is_focus_mode_supported(&self, mode: FocusMode) -> bool;
    fn set_focus_point_of_interest(&self, point: DevicePoint);
    fn set_focus_mode(&self, mode: FocusMode);

    fn is_exposure_point_of_interest_supported(&self) -> bool;
    fn is_exposure_mode_supported(&self, mode: ExposureMode) -> bool;
    fn set_exposure_point_of_interest(&self, point: DevicePoint);
    fn set_exposure_mode(&self, mode: ExposureMode);

    fn set_subject_area_change_monitoring(&self, enabled: bool);

    /// Notifications fired when the scene under the lens changes substantially
    fn subject_area_changes(&self) -> broadcast::Receiver<()>;
}

/// A device wrapped for attachment to a session
#[derive(Clone)]
pub struct DeviceInput {
    device: Arc<dyn CaptureDevice>,
}

impl DeviceInput {
    pub fn new(device: Arc<dyn CaptureDevice>) -> Self {
        Self { device }
    }

    pub fn device(&self) -> &Arc<dyn CaptureDevice> {
        &self.device
    }
}

impl fmt::Debug for DeviceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceInput")
            .field("device", &self.device.unique_id())
            .field("position", &self.device.position())
            .finish()
    }
}

/// Exclusive configuration lock on a device, released on drop
pub struct DeviceConfigurationLock<'a> {
    device: &'a (dyn CaptureDevice + 'static),
}

impl<'a> DeviceConfigurationLock<'a> {
    pub fn acquire(device: &'a (dyn CaptureDevice + 'static)) -> Result<Self> {
        device.lock_for_configuration()?;
        Ok(Self { device })
    }
}

impl Deref for DeviceConfigurationLock<'_> {
    type Target = dyn CaptureDevice + 'static;

    fn deref(&self) -> &Self::Target {
        self.device
    }
}

impl Drop for DeviceConfigurationLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
    }
}
