use crate::capture::{CaptureHandlers, PhotoCaptureEvent, PhotoSettings, RequestId};
use crate::orientation::{DevicePoint, VideoOrientation};
use crate::platform::{ExposureMode, FocusMode};
use crate::preview::PreviewLayer;

use super::state::SessionSetupResult;
use tokio::sync::oneshot;

pub(crate) type SetupCallback = Box<dyn FnOnce(SessionSetupResult) + Send>;

/// Focus and exposure adjustment around a point of interest
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRequest {
    pub focus_mode: FocusMode,
    pub exposure_mode: ExposureMode,
    pub point: DevicePoint,
    pub monitor_subject_area_change: bool,
}

/// Work executed in order on the session queue
pub(crate) enum SessionCommand {
    Configure {
        preview: PreviewLayer,
    },
    Start {
        on_complete: Option<SetupCallback>,
    },
    Stop,
    Focus(FocusRequest),
    SubjectAreaChanged,
    Capture {
        settings: Option<PhotoSettings>,
        preview_orientation: Option<VideoOrientation>,
        handlers: CaptureHandlers,
    },
    CaptureEvent {
        id: RequestId,
        event: PhotoCaptureEvent,
    },
    /// Signals once everything queued before it has run
    Flush {
        done: oneshot::Sender<()>,
    },
}

impl SessionCommand {
    pub fn name(&self) -> &'static str {
        match self {
            SessionCommand::Configure { .. } => "configure",
            SessionCommand::Start { .. } => "start",
            SessionCommand::Stop => "stop",
            SessionCommand::Focus(_) => "focus",
            SessionCommand::SubjectAreaChanged => "subject_area_changed",
            SessionCommand::Capture { .. } => "capture",
            SessionCommand::CaptureEvent { .. } => "capture_event",
            SessionCommand::Flush { .. } => "flush",
        }
    }
}
