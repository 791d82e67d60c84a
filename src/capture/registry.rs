use super::events::PhotoCaptureEvent;
use super::request::{CaptureRequest, RequestProgress};
use super::settings::RequestId;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::trace;

/// Read-only view of the ids currently in flight
#[derive(Debug, Clone, Default)]
pub struct InFlightRequests {
    ids: Arc<RwLock<BTreeSet<RequestId>>>,
}

impl InFlightRequests {
    pub fn ids(&self) -> Vec<RequestId> {
        self.ids.read().iter().copied().collect()
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.ids.read().contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.read().is_empty()
    }
}

/// Arena of in-flight capture requests, owned by the session worker.
///
/// Callbacks never run while the published id set is locked.
pub(crate) struct CaptureRegistry {
    requests: HashMap<RequestId, CaptureRequest>,
    published: InFlightRequests,
}

impl CaptureRegistry {
    pub fn new(published: InFlightRequests) -> Self {
        Self {
            requests: HashMap::new(),
            published,
        }
    }

    /// Track a new request. Hands the request back if its id is already in flight.
    pub fn register(&mut self, request: CaptureRequest) -> Result<(), CaptureRequest> {
        let id = request.id();
        if self.requests.contains_key(&id) {
            return Err(request);
        }
        self.requests.insert(id, request);
        self.published.ids.write().insert(id);
        Ok(())
    }

    /// Route an event to its request. When the request finishes it is removed
    /// and its completion fired; returns whether it succeeded.
    pub fn dispatch(&mut self, id: RequestId, event: PhotoCaptureEvent) -> Option<bool> {
        let progress = match self.requests.get_mut(&id) {
            Some(request) => request.handle_event(event),
            None => {
                trace!("Ignoring {} for unknown capture {}", event.event_type(), id);
                return None;
            }
        };

        match progress {
            RequestProgress::Pending => None,
            RequestProgress::Finished(outcome) => {
                let request = self.remove(id)?;
                let succeeded = outcome.is_ok();
                request.complete(outcome);
                Some(succeeded)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    fn remove(&mut self, id: RequestId) -> Option<CaptureRequest> {
        let request = self.requests.remove(&id);
        self.published.ids.write().remove(&id);
        request
    }
}
