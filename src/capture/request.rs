use super::events::PhotoCaptureEvent;
use super::settings::{PhotoSettings, RequestId};
use crate::error::CaptureError;
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

/// Result delivered to the completion handler of a capture
pub type CaptureOutcome = Result<Vec<u8>, CaptureError>;

type WillCaptureHandler = Box<dyn FnOnce() + Send>;
type ProcessingHandler = Box<dyn FnMut(bool) + Send>;
type CompletionHandler = Box<dyn FnOnce(CaptureOutcome) + Send>;

/// Caller callbacks for one capture
pub struct CaptureHandlers {
    will_capture: Option<WillCaptureHandler>,
    processing: Option<ProcessingHandler>,
    completion: CompletionHandler,
}

impl CaptureHandlers {
    pub fn new<F>(completion: F) -> Self
    where
        F: FnOnce(CaptureOutcome) + Send + 'static,
    {
        Self {
            will_capture: None,
            processing: None,
            completion: Box::new(completion),
        }
    }

    /// Fired once, right before the shutter, to run a flash/shutter animation
    pub fn on_will_capture<F>(mut self, handler: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.will_capture = Some(Box::new(handler));
        self
    }

    /// Fired with `true` when processing starts and `false` when it stops
    pub fn on_processing<F>(mut self, handler: F) -> Self
    where
        F: FnMut(bool) + Send + 'static,
    {
        self.processing = Some(Box::new(handler));
        self
    }
}

impl fmt::Debug for CaptureHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureHandlers")
            .field("will_capture", &self.will_capture.is_some())
            .field("processing", &self.processing.is_some())
            .finish()
    }
}

pub(crate) enum RequestProgress {
    Pending,
    Finished(CaptureOutcome),
}

/// State of one in-flight capture from submission to completion
pub(crate) struct CaptureRequest {
    settings: PhotoSettings,
    handlers: CaptureHandlers,
    processing: bool,
    photo_data: Option<Vec<u8>>,
    processing_error: Option<String>,
    started_at: Instant,
}

impl CaptureRequest {
    pub fn new(settings: PhotoSettings, handlers: CaptureHandlers) -> Self {
        Self {
            settings,
            handlers,
            processing: false,
            photo_data: None,
            processing_error: None,
            started_at: Instant::now(),
        }
    }

    pub fn id(&self) -> RequestId {
        self.settings.unique_id()
    }

    pub fn settings(&self) -> &PhotoSettings {
        &self.settings
    }

    /// Apply a platform event. Returns the outcome once the capture is over.
    pub fn handle_event(&mut self, event: PhotoCaptureEvent) -> RequestProgress {
        match event {
            PhotoCaptureEvent::WillBeginCapture | PhotoCaptureEvent::DidCapturePhoto => {
                RequestProgress::Pending
            }
            PhotoCaptureEvent::WillCapturePhoto => {
                if let Some(will_capture) = self.handlers.will_capture.take() {
                    will_capture();
                }
                self.set_processing(true);
                RequestProgress::Pending
            }
            PhotoCaptureEvent::DidFinishProcessing(result) => {
                self.set_processing(false);
                match result {
                    Ok(data) => self.photo_data = Some(data),
                    Err(e) => {
                        warn!("Error processing photo {}: {}", self.id(), e);
                        self.processing_error = Some(e);
                    }
                }
                RequestProgress::Pending
            }
            PhotoCaptureEvent::DidFinishCapture(Some(error)) => {
                RequestProgress::Finished(Err(CaptureError::platform(error)))
            }
            PhotoCaptureEvent::DidFinishCapture(None) => {
                let outcome = match (self.processing_error.take(), self.photo_data.take()) {
                    (Some(error), _) => Err(CaptureError::platform(error)),
                    (None, Some(data)) => Ok(data),
                    (None, None) => Err(CaptureError::NoPhotoData),
                };
                RequestProgress::Finished(outcome)
            }
            PhotoCaptureEvent::Abandoned => {
                RequestProgress::Finished(Err(CaptureError::Abandoned { id: self.id() }))
            }
        }
    }

    /// Fire the completion handler. Consuming `self` makes this happen once.
    pub fn complete(mut self, outcome: CaptureOutcome) {
        self.set_processing(false);

        match &outcome {
            Ok(data) => debug!(
                "Capture {} finished with {} bytes in {:?}",
                self.id(),
                data.len(),
                self.started_at.elapsed()
            ),
            Err(e) => debug!(
                "Capture {} failed after {:?}: {}",
                self.id(),
                self.started_at.elapsed(),
                e
            ),
        }

        (self.handlers.completion)(outcome);
    }

    fn set_processing(&mut self, active: bool) {
        if self.processing == active {
            return;
        }
        self.processing = active;
        if let Some(processing) = self.handlers.processing.as_mut() {
            processing(active);
        }
    }
}
