use super::settings::RequestId;
use crate::session::SessionCommand;
use tokio::sync::mpsc;
use tracing::trace;

/// Progress reported by the platform for one capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoCaptureEvent {
    WillBeginCapture,
    /// Shutter is about to fire; drives the flash/shutter animation
    WillCapturePhoto,
    DidCapturePhoto,
    /// Encoded photo is ready, or processing failed
    DidFinishProcessing(Result<Vec<u8>, String>),
    /// Final event for the capture, with the platform error if any
    DidFinishCapture(Option<String>),
    /// The platform dropped its sink without finishing
    Abandoned,
}

impl PhotoCaptureEvent {
    /// Get the event type as a string for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            PhotoCaptureEvent::WillBeginCapture => "will_begin_capture",
            PhotoCaptureEvent::WillCapturePhoto => "will_capture_photo",
            PhotoCaptureEvent::DidCapturePhoto => "did_capture_photo",
            PhotoCaptureEvent::DidFinishProcessing(_) => "did_finish_processing",
            PhotoCaptureEvent::DidFinishCapture(_) => "did_finish_capture",
            PhotoCaptureEvent::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PhotoCaptureEvent::DidFinishCapture(_) | PhotoCaptureEvent::Abandoned
        )
    }
}

/// Handle given to the platform for one capture. Events are routed back onto
/// the session queue, in order.
pub struct CaptureEventSink {
    id: RequestId,
    commands: mpsc::UnboundedSender<SessionCommand>,
    finished: bool,
}

impl CaptureEventSink {
    pub(crate) fn new(id: RequestId, commands: mpsc::UnboundedSender<SessionCommand>) -> Self {
        Self {
            id,
            commands,
            finished: false,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.id
    }

    pub fn will_begin_capture(&self) {
        self.send(PhotoCaptureEvent::WillBeginCapture);
    }

    pub fn will_capture_photo(&self) {
        self.send(PhotoCaptureEvent::WillCapturePhoto);
    }

    pub fn did_capture_photo(&self) {
        self.send(PhotoCaptureEvent::DidCapturePhoto);
    }

    pub fn did_finish_processing(&self, photo: Result<Vec<u8>, String>) {
        self.send(PhotoCaptureEvent::DidFinishProcessing(photo));
    }

    /// Report the end of the capture. Consumes the sink.
    pub fn did_finish_capture(mut self, error: Option<String>) {
        self.send(PhotoCaptureEvent::DidFinishCapture(error));
        self.finished = true;
    }

    fn send(&self, event: PhotoCaptureEvent) {
        trace!("Capture {} event: {}", self.id, event.event_type());
        if self
            .commands
            .send(SessionCommand::CaptureEvent { id: self.id, event })
            .is_err()
        {
            trace!("Session queue closed; dropping event for capture {}", self.id);
        }
    }
}

impl Drop for CaptureEventSink {
    fn drop(&mut self) {
        if !self.finished {
            self.send(PhotoCaptureEvent::Abandoned);
        }
    }
}
