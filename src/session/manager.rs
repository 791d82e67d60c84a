use super::commands::{FocusRequest, SessionCommand};
use super::state::{SessionSetupResult, SessionStats, SessionStatsSnapshot, SetupState};
use super::worker::SessionWorker;
use crate::capture::{CaptureHandlers, CaptureOutcome, InFlightRequests, PhotoSettings};
use crate::config::SimpleCameraConfig;
use crate::error::{CameraError, CaptureError, Result};
use crate::orientation::{DevicePoint, Size, VideoOrientation};
use crate::platform::{CameraPlatform, CaptureSession, ExposureMode, FocusMode};
use crate::preview::{PreviewLayer, PreviewSurface};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

/// Convenience wrapper around one platform capture session.
///
/// Every operation that touches the session is queued and runs in submission
/// order on a single worker task. Entry points never block; results come back
/// through callbacks, which run on that worker.
pub struct SimpleCamera {
    platform: Arc<dyn CameraPlatform>,
    session: Arc<dyn CaptureSession>,
    config: Arc<SimpleCameraConfig>,
    pub(super) commands: mpsc::UnboundedSender<SessionCommand>,
    setup: Arc<RwLock<SetupState>>,
    /// Set from `initialize` until the worker finishes that configuration
    configuration_pending: Arc<AtomicBool>,
    preview: RwLock<Option<PreviewLayer>>,
    initialized: AtomicBool,
    in_flight: InFlightRequests,
    stats: Arc<SessionStats>,
}

impl SimpleCamera {
    /// Create a manager and spawn its session queue. Must be called inside a
    /// tokio runtime.
    pub fn new(platform: Arc<dyn CameraPlatform>, config: SimpleCameraConfig) -> Self {
        let config = Arc::new(config);
        let session = platform.create_session();
        let setup = Arc::new(RwLock::new(SetupState::Unconfigured));
        let configuration_pending = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(SessionStats::default());
        let in_flight = InFlightRequests::default();
        let (commands, receiver) = mpsc::unbounded_channel();

        let worker = SessionWorker::new(
            Arc::clone(&platform),
            Arc::clone(&session),
            Arc::clone(&config),
            Arc::clone(&setup),
            Arc::clone(&configuration_pending),
            Arc::clone(&stats),
            in_flight.clone(),
            commands.downgrade(),
        );
        tokio::spawn(worker.run(receiver));

        Self {
            platform,
            session,
            config,
            commands,
            setup,
            configuration_pending,
            preview: RwLock::new(None),
            initialized: AtomicBool::new(false),
            in_flight,
            stats,
        }
    }

    pub fn builder() -> super::SimpleCameraBuilder {
        super::SimpleCameraBuilder::new()
    }

    /// Bind a preview surface and queue the permission check and session
    /// configuration.
    ///
    /// Rejected while a previous configuration is still queued or running.
    pub fn initialize(&self, surface: &dyn PreviewSurface) -> Result<()> {
        // Setup state itself only moves on the queue, so commands queued
        // before this call still see the previous result
        if self
            .configuration_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("initialize called while a configuration is already in progress");
            return Err(CameraError::ConfigurationInProgress);
        }

        let preview = PreviewLayer::new(surface.bounds());
        surface.attach_preview(preview.clone());
        *self.preview.write() = Some(preview.clone());
        self.initialized.store(true, Ordering::Release);

        info!("Initializing camera session");
        if self.send(SessionCommand::Configure { preview }).is_err() {
            self.configuration_pending.store(false, Ordering::Release);
            return Err(CameraError::QueueClosed);
        }
        Ok(())
    }

    /// Queue a session start. `on_complete` always receives the setup result,
    /// including when setup failed.
    pub fn start_session<F>(&self, on_complete: F)
    where
        F: FnOnce(SessionSetupResult) + Send + 'static,
    {
        if !self.is_initialized() {
            warn!("SimpleCamera initialize is not called. Please call initialize before start_session");
            return;
        }

        let command = SessionCommand::Start {
            on_complete: Some(Box::new(on_complete)),
        };
        if self.send(command).is_err() {
            warn!("Session queue closed; start ignored");
        }
    }

    /// Start the session and wait for the setup result
    pub async fn start(&self) -> Result<SessionSetupResult> {
        if !self.is_initialized() {
            return Err(CameraError::system(
                "initialize must be called before starting the session",
            ));
        }

        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Start {
            on_complete: Some(Box::new(move |result| {
                let _ = tx.send(result);
            })),
        })?;
        rx.await.map_err(|_| CameraError::QueueClosed)
    }

    /// Queue a session stop. No effect unless setup succeeded.
    pub fn stop_session(&self) {
        if !self.is_initialized() {
            debug!("stop_session before initialize; nothing to stop");
            return;
        }
        if self.send(SessionCommand::Stop).is_err() {
            warn!("Session queue closed; stop ignored");
        }
    }

    /// Queue a focus and exposure adjustment at a device point
    pub fn focus(
        &self,
        focus_mode: FocusMode,
        exposure_mode: ExposureMode,
        point: DevicePoint,
        monitor_subject_area_change: bool,
    ) {
        let request = FocusRequest {
            focus_mode,
            exposure_mode,
            point,
            monitor_subject_area_change,
        };
        if self.send(SessionCommand::Focus(request)).is_err() {
            warn!("Session queue closed; focus ignored");
        }
    }

    /// Queue a photo capture.
    ///
    /// Without `settings` the defaults are used: flash per configuration when
    /// the device has one, high resolution enabled. The completion handler
    /// fires exactly once.
    pub fn capture_photo(&self, settings: Option<PhotoSettings>, handlers: CaptureHandlers) {
        let preview_orientation = self.preview_layer().and_then(|p| p.video_orientation());

        let command = SessionCommand::Capture {
            settings,
            preview_orientation,
            handlers,
        };
        if let Err(mpsc::error::SendError(SessionCommand::Capture { settings, handlers, .. })) =
            self.commands.send(command)
        {
            warn!("Session queue closed; capture rejected");
            let request = crate::capture::CaptureRequest::new(settings.unwrap_or_default(), handlers);
            request.complete(Err(CaptureError::QueueClosed));
        }
    }

    /// Capture a photo and wait for its bytes
    pub async fn capture(&self, settings: Option<PhotoSettings>) -> CaptureOutcome {
        let (tx, rx) = oneshot::channel();
        self.capture_photo(
            settings,
            CaptureHandlers::new(move |outcome| {
                let _ = tx.send(outcome);
            }),
        );
        rx.await.unwrap_or(Err(CaptureError::QueueClosed))
    }

    /// Follow a view size change: rotate the preview to the device orientation
    /// and resize it.
    ///
    /// Face up, face down and unknown orientations leave the preview untouched.
    pub fn view_will_transition(&self, size: Size) {
        let Some(preview) = self.preview_layer() else {
            debug!("view_will_transition before initialize");
            return;
        };

        if preview.is_connected() {
            let device_orientation = self.platform.device_orientation();
            match VideoOrientation::from_device(device_orientation) {
                Some(orientation)
                    if device_orientation.is_portrait() || device_orientation.is_landscape() =>
                {
                    preview.set_video_orientation(orientation);
                }
                _ => {
                    debug!("Ignoring device orientation {:?}", device_orientation);
                    return;
                }
            }
        }

        preview.set_frame_size(size);
    }

    /// Wait until every command queued so far has run
    pub async fn wait_until_idle(&self) -> Result<()> {
        let (done, rx) = oneshot::channel();
        self.send(SessionCommand::Flush { done })?;
        rx.await.map_err(|_| CameraError::QueueClosed)
    }

    pub fn is_session_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    pub fn preview_layer(&self) -> Option<PreviewLayer> {
        self.preview.read().clone()
    }

    pub fn setup_state(&self) -> SetupState {
        *self.setup.read()
    }

    pub fn in_flight_requests(&self) -> InFlightRequests {
        self.in_flight.clone()
    }

    pub fn stats(&self) -> SessionStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &SimpleCameraConfig {
        &self.config
    }

    fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| CameraError::QueueClosed)
    }
}
