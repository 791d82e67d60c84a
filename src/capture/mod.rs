mod events;
mod registry;
mod request;
mod settings;
#[cfg(test)]
mod tests;

pub use events::{CaptureEventSink, PhotoCaptureEvent};
pub use registry::InFlightRequests;
pub use request::{CaptureHandlers, CaptureOutcome};
pub use settings::{PhotoSettings, RequestId};

pub(crate) use registry::CaptureRegistry;
pub(crate) use request::CaptureRequest;
