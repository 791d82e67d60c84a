pub mod capture;
pub mod config;
pub mod error;
pub mod orientation;
pub mod platform;
pub mod preview;
pub mod session;

pub use capture::{
    CaptureEventSink, CaptureHandlers, CaptureOutcome, InFlightRequests, PhotoCaptureEvent,
    PhotoSettings, RequestId,
};
pub use config::SimpleCameraConfig;
pub use error::{CameraError, CaptureError, Result};
pub use orientation::{DeviceOrientation, DevicePoint, Size, VideoOrientation};
pub use platform::{
    AuthorizationStatus, CameraPlatform, CaptureDevice, CaptureSession, DeviceConfigurationLock,
    DeviceInput, DevicePosition, ExposureMode, FlashMode, FocusMode, SessionPreset,
};
pub use preview::{PreviewLayer, PreviewSurface};
pub use session::{
    FocusRequest, SessionSetupResult, SessionStatsSnapshot, SetupState, SimpleCamera,
    SimpleCameraBuilder,
};
