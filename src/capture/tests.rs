use super::request::RequestProgress;
use super::*;
use crate::error::CaptureError;
use crate::platform::FlashMode;
use crate::session::SessionCommand;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Default)]
struct Recorded {
    will_capture: AtomicUsize,
    processing: Mutex<Vec<bool>>,
    outcomes: Mutex<Vec<CaptureOutcome>>,
}

fn create_test_request(settings: PhotoSettings) -> (CaptureRequest, Arc<Recorded>) {
    let recorded = Arc::new(Recorded::default());
    let on_complete = Arc::clone(&recorded);
    let on_will_capture = Arc::clone(&recorded);
    let on_processing = Arc::clone(&recorded);

    let handlers = CaptureHandlers::new(move |outcome| on_complete.outcomes.lock().push(outcome))
        .on_will_capture(move || {
            on_will_capture.will_capture.fetch_add(1, Ordering::SeqCst);
        })
        .on_processing(move |active| on_processing.processing.lock().push(active));

    (CaptureRequest::new(settings, handlers), recorded)
}

fn finish(registry: &mut CaptureRegistry, id: RequestId, events: Vec<PhotoCaptureEvent>) -> Option<bool> {
    let mut result = None;
    for event in events {
        result = registry.dispatch(id, event);
    }
    result
}

#[test]
fn test_settings_ids_are_unique() {
    let first = PhotoSettings::new();
    let second = PhotoSettings::new();
    let copy = PhotoSettings::from_settings(&first.clone().with_flash_mode(FlashMode::On));

    assert_ne!(first.unique_id(), second.unique_id());
    assert_ne!(first.unique_id(), copy.unique_id());
    assert_eq!(copy.flash_mode, FlashMode::On);
    assert_eq!(first.flash_mode, FlashMode::Off);
    assert!(!first.high_resolution_photo_enabled);
}

#[test]
fn test_event_types() {
    assert_eq!(PhotoCaptureEvent::WillCapturePhoto.event_type(), "will_capture_photo");
    assert_eq!(
        PhotoCaptureEvent::DidFinishProcessing(Ok(vec![1])).event_type(),
        "did_finish_processing"
    );
    assert!(PhotoCaptureEvent::DidFinishCapture(None).is_terminal());
    assert!(PhotoCaptureEvent::Abandoned.is_terminal());
    assert!(!PhotoCaptureEvent::DidCapturePhoto.is_terminal());
}

#[test]
fn test_successful_capture_sequence() {
    let published = InFlightRequests::default();
    let mut registry = CaptureRegistry::new(published.clone());
    let (request, recorded) = create_test_request(PhotoSettings::new());
    let id = request.id();

    assert!(registry.register(request).is_ok());
    assert!(published.contains(id));
    assert_eq!(registry.len(), 1);

    let result = finish(
        &mut registry,
        id,
        vec![
            PhotoCaptureEvent::WillBeginCapture,
            PhotoCaptureEvent::WillCapturePhoto,
            PhotoCaptureEvent::DidCapturePhoto,
            PhotoCaptureEvent::DidFinishProcessing(Ok(vec![0xFF, 0xD8])),
            PhotoCaptureEvent::DidFinishCapture(None),
        ],
    );

    assert_eq!(result, Some(true));
    assert_eq!(recorded.will_capture.load(Ordering::SeqCst), 1);
    assert_eq!(*recorded.processing.lock(), vec![true, false]);
    assert_eq!(*recorded.outcomes.lock(), vec![Ok(vec![0xFF, 0xD8])]);
    assert!(published.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_events_after_completion_are_ignored() {
    let mut registry = CaptureRegistry::new(InFlightRequests::default());
    let (request, recorded) = create_test_request(PhotoSettings::new());
    let id = request.id();
    registry.register(request).unwrap_or_else(|_| panic!("register failed"));

    assert_eq!(
        registry.dispatch(id, PhotoCaptureEvent::DidFinishCapture(Some("boom".to_string()))),
        Some(false)
    );
    assert_eq!(registry.dispatch(id, PhotoCaptureEvent::Abandoned), None);
    assert_eq!(
        registry.dispatch(id, PhotoCaptureEvent::DidFinishCapture(None)),
        None
    );

    assert_eq!(
        *recorded.outcomes.lock(),
        vec![Err(CaptureError::platform("boom"))]
    );
}

#[test]
fn test_capture_error_wins_over_photo_data() {
    let mut registry = CaptureRegistry::new(InFlightRequests::default());
    let (request, recorded) = create_test_request(PhotoSettings::new());
    let id = request.id();
    registry.register(request).unwrap_or_else(|_| panic!("register failed"));

    finish(
        &mut registry,
        id,
        vec![
            PhotoCaptureEvent::WillCapturePhoto,
            PhotoCaptureEvent::DidFinishProcessing(Ok(vec![1, 2])),
            PhotoCaptureEvent::DidFinishCapture(Some("interrupted".to_string())),
        ],
    );

    assert_eq!(
        *recorded.outcomes.lock(),
        vec![Err(CaptureError::platform("interrupted"))]
    );
}

#[test]
fn test_finish_without_photo_data() {
    let mut registry = CaptureRegistry::new(InFlightRequests::default());
    let (request, recorded) = create_test_request(PhotoSettings::new());
    let id = request.id();
    registry.register(request).unwrap_or_else(|_| panic!("register failed"));

    let result = registry.dispatch(id, PhotoCaptureEvent::DidFinishCapture(None));

    assert_eq!(result, Some(false));
    assert_eq!(*recorded.outcomes.lock(), vec![Err(CaptureError::NoPhotoData)]);
    // Processing never started, so it is never reported as stopped
    assert!(recorded.processing.lock().is_empty());
    assert_eq!(recorded.will_capture.load(Ordering::SeqCst), 0);
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let published = InFlightRequests::default();
    let mut registry = CaptureRegistry::new(published.clone());
    let settings = PhotoSettings::new();

    let (first, _) = create_test_request(settings.clone());
    let (second, recorded) = create_test_request(settings.clone());
    assert!(registry.register(first).is_ok());

    let rejected = match registry.register(second) {
        Ok(()) => panic!("duplicate id was accepted"),
        Err(request) => request,
    };
    assert_eq!(rejected.id(), settings.unique_id());
    assert_eq!(published.ids(), vec![settings.unique_id()]);

    rejected.complete(Err(CaptureError::DuplicateRequest {
        id: settings.unique_id(),
    }));
    assert_eq!(
        *recorded.outcomes.lock(),
        vec![Err(CaptureError::DuplicateRequest {
            id: settings.unique_id()
        })]
    );
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_requests_complete_independently() {
    let published = InFlightRequests::default();
    let mut registry = CaptureRegistry::new(published.clone());
    let (first, first_recorded) = create_test_request(PhotoSettings::new());
    let (second, second_recorded) = create_test_request(PhotoSettings::new());
    let first_id = first.id();
    let second_id = second.id();
    registry.register(first).unwrap_or_else(|_| panic!("register failed"));
    registry.register(second).unwrap_or_else(|_| panic!("register failed"));

    registry.dispatch(second_id, PhotoCaptureEvent::WillCapturePhoto);
    registry.dispatch(first_id, PhotoCaptureEvent::WillCapturePhoto);
    registry.dispatch(second_id, PhotoCaptureEvent::DidFinishProcessing(Ok(vec![2])));
    registry.dispatch(second_id, PhotoCaptureEvent::DidFinishCapture(None));

    assert_eq!(published.ids(), vec![first_id]);
    assert_eq!(*second_recorded.outcomes.lock(), vec![Ok(vec![2])]);
    assert!(first_recorded.outcomes.lock().is_empty());
    assert_eq!(*first_recorded.processing.lock(), vec![true]);

    registry.dispatch(first_id, PhotoCaptureEvent::Abandoned);
    assert_eq!(
        *first_recorded.outcomes.lock(),
        vec![Err(CaptureError::Abandoned { id: first_id })]
    );
    assert_eq!(*first_recorded.processing.lock(), vec![true, false]);
    assert!(published.is_empty());
}

#[test]
fn test_handlers_are_optional() {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    let mut request = CaptureRequest::new(
        PhotoSettings::new(),
        CaptureHandlers::new(move |outcome| sink.lock().push(outcome)),
    );

    assert!(matches!(
        request.handle_event(PhotoCaptureEvent::WillCapturePhoto),
        RequestProgress::Pending
    ));
    request.complete(Ok(vec![9]));
    assert_eq!(*outcomes.lock(), vec![Ok(vec![9])]);
}

#[tokio::test]
async fn test_sink_routes_events_in_order() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = CaptureEventSink::new(7, tx);

    sink.will_begin_capture();
    sink.will_capture_photo();
    sink.did_capture_photo();
    sink.did_finish_processing(Ok(vec![3]));
    sink.did_finish_capture(None);

    let mut events = Vec::new();
    while let Ok(command) = rx.try_recv() {
        match command {
            SessionCommand::CaptureEvent { id, event } => {
                assert_eq!(id, 7);
                events.push(event);
            }
            other => panic!("unexpected command {}", other.name()),
        }
    }

    assert_eq!(
        events,
        vec![
            PhotoCaptureEvent::WillBeginCapture,
            PhotoCaptureEvent::WillCapturePhoto,
            PhotoCaptureEvent::DidCapturePhoto,
            PhotoCaptureEvent::DidFinishProcessing(Ok(vec![3])),
            PhotoCaptureEvent::DidFinishCapture(None),
        ]
    );
}

#[tokio::test]
async fn test_dropped_sink_reports_abandoned() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let sink = CaptureEventSink::new(11, tx);
    sink.will_begin_capture();
    drop(sink);

    let mut events = Vec::new();
    while let Ok(SessionCommand::CaptureEvent { event, .. }) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            PhotoCaptureEvent::WillBeginCapture,
            PhotoCaptureEvent::Abandoned
        ]
    );
}

#[tokio::test]
async fn test_sink_survives_closed_queue() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    let sink = CaptureEventSink::new(12, tx);
    sink.will_capture_photo();
    drop(sink);
}
