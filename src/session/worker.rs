use super::commands::{FocusRequest, SessionCommand, SetupCallback};
use super::observer::SubjectAreaObserver;
use super::state::{SessionSetupResult, SessionStats, SetupState};
use crate::capture::{
    CaptureEventSink, CaptureHandlers, CaptureRegistry, CaptureRequest, InFlightRequests,
    PhotoCaptureEvent, PhotoSettings, RequestId,
};
use crate::config::SimpleCameraConfig;
use crate::error::{CameraError, CaptureError, Result};
use crate::orientation::VideoOrientation;
use crate::platform::{
    AuthorizationStatus, CameraPlatform, CaptureSession, DeviceConfigurationLock, DeviceInput,
    ExposureMode, FocusMode,
};
use crate::preview::PreviewLayer;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

/// Owner of the hardware session. Runs every queued command in order.
pub(crate) struct SessionWorker {
    platform: Arc<dyn CameraPlatform>,
    session: Arc<dyn CaptureSession>,
    config: Arc<SimpleCameraConfig>,
    setup: Arc<RwLock<SetupState>>,
    configuration_pending: Arc<AtomicBool>,
    stats: Arc<SessionStats>,
    commands: mpsc::WeakUnboundedSender<SessionCommand>,
    video_input: Option<DeviceInput>,
    has_photo_output: bool,
    preview: Option<PreviewLayer>,
    captures: CaptureRegistry,
    observer: Option<SubjectAreaObserver>,
    shutdown: CancellationToken,
}

impl SessionWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        platform: Arc<dyn CameraPlatform>,
        session: Arc<dyn CaptureSession>,
        config: Arc<SimpleCameraConfig>,
        setup: Arc<RwLock<SetupState>>,
        configuration_pending: Arc<AtomicBool>,
        stats: Arc<SessionStats>,
        in_flight: InFlightRequests,
        commands: mpsc::WeakUnboundedSender<SessionCommand>,
    ) -> Self {
        Self {
            platform,
            session,
            config,
            setup,
            configuration_pending,
            stats,
            commands,
            video_input: None,
            has_photo_output: false,
            preview: None,
            captures: CaptureRegistry::new(in_flight),
            observer: None,
            shutdown: CancellationToken::new(),
        }
    }

    /// Drain the session queue until every sender is gone
    pub async fn run(mut self, mut receiver: mpsc::UnboundedReceiver<SessionCommand>) {
        debug!("Session queue started");

        while let Some(command) = receiver.recv().await {
            trace!("Session queue running {}", command.name());
            self.handle(command).await;
        }

        if let Some(observer) = self.observer.take() {
            observer.release();
        }
        self.shutdown.cancel();
        debug!(
            "Session queue closed with {} captures outstanding",
            self.captures.len()
        );
    }

    async fn handle(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Configure { preview } => self.configure(preview).await,
            SessionCommand::Start { on_complete } => self.start(on_complete),
            SessionCommand::Stop => self.stop(),
            SessionCommand::Focus(request) => self.focus(request),
            SessionCommand::SubjectAreaChanged => self.subject_area_changed(),
            SessionCommand::Capture {
                settings,
                preview_orientation,
                handlers,
            } => self.capture(settings, preview_orientation, handlers),
            SessionCommand::CaptureEvent { id, event } => self.capture_event(id, event),
            SessionCommand::Flush { done } => {
                let _ = done.send(());
            }
        }
    }

    fn setup_result(&self) -> SessionSetupResult {
        // A start that somehow precedes configuration reports failure
        self.setup
            .read()
            .result()
            .unwrap_or(SessionSetupResult::ConfigurationFailed)
    }

    async fn configure(&mut self, preview: PreviewLayer) {
        *self.setup.write() = SetupState::Configuring;
        self.reset_session();
        self.preview = Some(preview);

        let platform = Arc::clone(&self.platform);
        let mut result = Self::check_permission(platform.as_ref()).await;

        if result.is_success() {
            result = match self.configure_session() {
                Ok(()) => SessionSetupResult::Success,
                Err(e) => {
                    error!("{}", e);
                    SessionSetupResult::ConfigurationFailed
                }
            };
        }

        SessionStats::increment(&self.stats.configurations);
        *self.setup.write() = SetupState::Ready(result);
        self.configuration_pending.store(false, Ordering::Release);
        info!("Capture session setup finished: {:?}", result);
    }

    /// Check authorization, prompting if undetermined.
    ///
    /// Runs on the queue, so nothing behind it executes until the user answers.
    async fn check_permission(platform: &dyn CameraPlatform) -> SessionSetupResult {
        match platform.authorization_status() {
            AuthorizationStatus::Authorized => SessionSetupResult::Success,
            AuthorizationStatus::NotDetermined => {
                info!("Requesting camera access; session queue suspended until answered");
                if platform.request_access().await {
                    info!("Camera access granted");
                    SessionSetupResult::Success
                } else {
                    warn!("Camera access denied by user");
                    SessionSetupResult::NotAuthorized
                }
            }
            status => {
                warn!("Camera access not authorized: {:?}", status);
                SessionSetupResult::NotAuthorized
            }
        }
    }

    fn configure_session(&mut self) -> Result<()> {
        self.session.begin_configuration();
        let result = self.add_input_and_output();
        self.session.commit_configuration();
        result
    }

    fn add_input_and_output(&mut self) -> Result<()> {
        let session_config = &self.config.session;

        if self.session.can_set_preset(session_config.preset) {
            self.session.set_preset(session_config.preset);
        } else {
            debug!(
                "Session preset {:?} unsupported; keeping the session default",
                session_config.preset
            );
        }
        self.session
            .set_automatically_configures_wide_color(session_config.automatically_configure_wide_color);

        let device = self
            .platform
            .default_device(session_config.device_position)
            .ok_or_else(|| CameraError::configuration_failed("Default video device is unavailable"))?;

        let input = self.platform.create_input(device).map_err(|e| {
            CameraError::configuration_failed(format!("Couldn't create video device input: {}", e))
        })?;

        if !self.session.can_add_input(&input) {
            return Err(CameraError::configuration_failed(
                "Couldn't add video device input to the session",
            ));
        }
        self.session.add_input(&input);
        info!("Added video input {:?}", input);
        self.video_input = Some(input);
        self.connect_preview();

        if !self.session.can_add_photo_output() {
            return Err(CameraError::configuration_failed(
                "Could not add photo output to the session",
            ));
        }
        self.session.add_photo_output();
        self.session
            .set_high_resolution_capture_enabled(session_config.high_resolution_capture);
        self.has_photo_output = true;

        Ok(())
    }

    fn connect_preview(&self) {
        let Some(preview) = &self.preview else {
            return;
        };
        let orientation = VideoOrientation::from_device(self.platform.device_orientation())
            .unwrap_or(self.config.preview.initial_orientation);
        preview.connect(orientation);
    }

    /// Undo a previous configuration before configuring again
    fn reset_session(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.release();
        }
        if self.session.is_running() {
            info!("Stopping running session for reconfiguration");
            self.session.stop_running();
        }
        if self.video_input.is_none() && !self.has_photo_output {
            return;
        }

        self.session.begin_configuration();
        if let Some(input) = self.video_input.take() {
            self.session.remove_input(&input);
        }
        if self.has_photo_output {
            self.session.remove_photo_output();
            self.has_photo_output = false;
        }
        self.session.commit_configuration();

        if let Some(preview) = self.preview.take() {
            preview.disconnect();
        }
        debug!("Previous session configuration removed");
    }

    fn start(&mut self, on_complete: Option<SetupCallback>) {
        let result = self.setup_result();

        if result.is_success() {
            self.register_observer();
            self.session.start_running();
            info!("Capture session started");
        } else {
            warn!("Not starting capture session: {:?}", result);
        }

        if let Some(on_complete) = on_complete {
            on_complete(result);
        }
    }

    fn stop(&mut self) {
        if !self.setup_result().is_success() {
            debug!("Stop ignored; session was never set up");
            return;
        }

        self.session.stop_running();
        if let Some(observer) = self.observer.take() {
            observer.release();
        }
        info!("Capture session stopped");
    }

    fn register_observer(&mut self) {
        let Some(input) = &self.video_input else {
            return;
        };
        if let Some(previous) = self.observer.take() {
            previous.release();
        }
        self.observer = Some(SubjectAreaObserver::register(
            input.device().as_ref(),
            self.commands.clone(),
            &self.shutdown,
        ));
    }

    fn focus(&self, request: FocusRequest) {
        let Some(input) = &self.video_input else {
            warn!("Focus requested before a video device was configured");
            return;
        };

        match DeviceConfigurationLock::acquire(input.device().as_ref()) {
            Ok(device) => {
                if device.is_focus_point_of_interest_supported()
                    && device.is_focus_mode_supported(request.focus_mode)
                {
                    device.set_focus_point_of_interest(request.point);
                    device.set_focus_mode(request.focus_mode);
                }

                if device.is_exposure_point_of_interest_supported()
                    && device.is_exposure_mode_supported(request.exposure_mode)
                {
                    device.set_exposure_point_of_interest(request.point);
                    device.set_exposure_mode(request.exposure_mode);
                }

                device.set_subject_area_change_monitoring(request.monitor_subject_area_change);
                SessionStats::increment(&self.stats.focus_adjustments);
                debug!(
                    "Focus {:?}/{:?} at ({:.2}, {:.2})",
                    request.focus_mode, request.exposure_mode, request.point.x, request.point.y
                );
            }
            Err(e) => {
                SessionStats::increment(&self.stats.device_lock_failures);
                warn!("{}", e);
            }
        }
    }

    fn subject_area_changed(&self) {
        if self.observer.is_none() {
            trace!("Subject area change after observation was released");
            return;
        }

        SessionStats::increment(&self.stats.subject_area_changes);
        debug!("Subject area changed; refocusing");
        self.focus(FocusRequest {
            focus_mode: FocusMode::ContinuousAutoFocus,
            exposure_mode: ExposureMode::ContinuousAutoExposure,
            point: self.config.preview.subject_area_focus_point,
            monitor_subject_area_change: false,
        });
    }

    fn default_photo_settings(&self) -> PhotoSettings {
        let capture_config = &self.config.capture;
        let mut settings =
            PhotoSettings::new().with_high_resolution(capture_config.high_resolution_photo);

        let flash_available = self
            .video_input
            .as_ref()
            .map(|input| input.device().is_flash_available())
            .unwrap_or(false);
        if flash_available {
            settings.flash_mode = capture_config.default_flash_mode;
        }

        settings
    }

    fn capture(
        &mut self,
        settings: Option<PhotoSettings>,
        preview_orientation: Option<VideoOrientation>,
        handlers: CaptureHandlers,
    ) {
        SessionStats::increment(&self.stats.captures_requested);

        let settings = settings.unwrap_or_else(|| self.default_photo_settings());
        let request = CaptureRequest::new(settings, handlers);
        let id = request.id();

        if !self.setup_result().is_success() || self.video_input.is_none() || !self.has_photo_output
        {
            warn!("Capture {} rejected; session is not set up", id);
            self.fail_capture(request, CaptureError::SessionNotReady);
            return;
        }

        let Some(commands) = self.commands.upgrade() else {
            self.fail_capture(request, CaptureError::QueueClosed);
            return;
        };

        self.session.set_photo_orientation(
            preview_orientation.unwrap_or(self.config.preview.initial_orientation),
        );

        let settings = request.settings().clone();
        if let Err(request) = self.captures.register(request) {
            warn!("Capture {} rejected; settings already in flight", id);
            self.fail_capture(request, CaptureError::DuplicateRequest { id });
            return;
        }

        debug!(
            "Issuing capture {} (flash {:?}, high resolution {})",
            id, settings.flash_mode, settings.high_resolution_photo_enabled
        );
        self.session
            .capture_photo(&settings, CaptureEventSink::new(id, commands));
    }

    fn fail_capture(&self, request: CaptureRequest, error: CaptureError) {
        SessionStats::increment(&self.stats.captures_failed);
        request.complete(Err(error));
    }

    fn capture_event(&mut self, id: RequestId, event: PhotoCaptureEvent) {
        match self.captures.dispatch(id, event) {
            Some(true) => SessionStats::increment(&self.stats.captures_succeeded),
            Some(false) => SessionStats::increment(&self.stats.captures_failed),
            None => {}
        }
    }
}
