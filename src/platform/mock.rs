use super::{
    AuthorizationStatus, CameraPlatform, CaptureDevice, CaptureSession, DeviceInput,
    DevicePosition, ExposureMode, FocusMode, SessionPreset,
};
use crate::capture::{CaptureEventSink, PhotoSettings};
use crate::error::{CameraError, Result};
use crate::orientation::{DeviceOrientation, DevicePoint, Size, VideoOrientation};
use crate::preview::{PreviewLayer, PreviewSurface};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, Notify};
use tracing::debug;

/// Minimal JPEG returned by successful mock captures
pub const SAMPLE_PHOTO: &[u8] = &[
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01, 0x01, 0x00, 0xFF,
    0xD9,
];

/// Ordered record of the calls made into the mock platform
#[derive(Debug, Clone, Default)]
pub struct OperationLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl OperationLog {
    fn push<S: Into<String>>(&self, entry: S) {
        self.entries.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Index of the first entry starting with `prefix`
    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.entries.lock().iter().position(|e| e.starts_with(prefix))
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

/// In-process camera platform with scripted behaviour
pub struct MockPlatform {
    log: OperationLog,
    authorization: Mutex<AuthorizationStatus>,
    access_answer: AtomicBool,
    access_gate: Mutex<Option<Arc<Notify>>>,
    access_requests: AtomicUsize,
    device: Mutex<Option<Arc<MockDevice>>>,
    input_creation_error: Mutex<Option<String>>,
    orientation: Mutex<DeviceOrientation>,
    session: Arc<MockSession>,
}

impl MockPlatform {
    /// Authorized platform with a back camera that has a flash
    pub fn new() -> Self {
        let log = OperationLog::default();
        Self {
            device: Mutex::new(Some(Arc::new(MockDevice::new(
                "mock-back-wide",
                DevicePosition::Back,
                log.clone(),
            )))),
            session: Arc::new(MockSession::new(log.clone())),
            log,
            authorization: Mutex::new(AuthorizationStatus::Authorized),
            access_answer: AtomicBool::new(true),
            access_gate: Mutex::new(None),
            access_requests: AtomicUsize::new(0),
            input_creation_error: Mutex::new(None),
            orientation: Mutex::new(DeviceOrientation::Portrait),
        }
    }

    pub fn with_authorization(self, status: AuthorizationStatus) -> Self {
        *self.authorization.lock() = status;
        self
    }

    /// Answer given when the user is prompted for access
    pub fn with_access_answer(self, granted: bool) -> Self {
        self.access_answer.store(granted, Ordering::SeqCst);
        self
    }

    /// Hold every access prompt until `answer_access_request` is called
    pub fn with_access_gate(self) -> Self {
        *self.access_gate.lock() = Some(Arc::new(Notify::new()));
        self
    }

    pub fn without_device(self) -> Self {
        *self.device.lock() = None;
        self
    }

    pub fn with_input_creation_error<S: Into<String>>(self, message: S) -> Self {
        *self.input_creation_error.lock() = Some(message.into());
        self
    }

    pub fn with_orientation(self, orientation: DeviceOrientation) -> Self {
        self.set_orientation(orientation);
        self
    }

    /// Release a gated access prompt
    pub fn answer_access_request(&self) {
        if let Some(gate) = self.access_gate.lock().as_ref() {
            gate.notify_one();
        }
    }

    pub fn access_requests(&self) -> usize {
        self.access_requests.load(Ordering::SeqCst)
    }

    pub fn set_orientation(&self, orientation: DeviceOrientation) {
        *self.orientation.lock() = orientation;
    }

    pub fn device(&self) -> Option<Arc<MockDevice>> {
        self.device.lock().clone()
    }

    pub fn session(&self) -> Arc<MockSession> {
        Arc::clone(&self.session)
    }

    pub fn log(&self) -> &OperationLog {
        &self.log
    }
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraPlatform for MockPlatform {
    fn authorization_status(&self) -> AuthorizationStatus {
        let status = *self.authorization.lock();
        self.log.push(format!("authorization_status:{:?}", status));
        status
    }

    async fn request_access(&self) -> bool {
        self.access_requests.fetch_add(1, Ordering::SeqCst);
        self.log.push("request_access");

        let gate = self.access_gate.lock().clone();
        if let Some(gate) = gate {
            debug!("Mock access prompt waiting for an answer");
            gate.notified().await;
        }

        let granted = self.access_answer.load(Ordering::SeqCst);
        *self.authorization.lock() = if granted {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        };
        self.log.push(format!("access_answered:{}", granted));
        granted
    }

    fn default_device(&self, position: DevicePosition) -> Option<Arc<dyn CaptureDevice>> {
        self.log.push(format!("default_device:{:?}", position));
        let device = self.device.lock().clone()?;
        if device.position() != position {
            return None;
        }
        Some(device as Arc<dyn CaptureDevice>)
    }

    fn create_input(&self, device: Arc<dyn CaptureDevice>) -> Result<DeviceInput> {
        if let Some(message) = self.input_creation_error.lock().clone() {
            return Err(CameraError::system(message));
        }
        Ok(DeviceInput::new(device))
    }

    fn create_session(&self) -> Arc<dyn CaptureSession> {
        Arc::clone(&self.session) as Arc<dyn CaptureSession>
    }

    fn device_orientation(&self) -> DeviceOrientation {
        *self.orientation.lock()
    }
}

/// What the mock session does with each capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureScript {
    /// Run the full event sequence and deliver these bytes
    Succeed(Vec<u8>),
    /// Finish the capture with a platform error
    FailCapture(String),
    /// Fail while encoding the photo
    FailProcessing(String),
    /// Keep the sink; drive it through `take_held_sinks`
    Hold,
    /// Drop the sink without reporting anything
    Drop,
}

pub struct MockSession {
    log: OperationLog,
    running: AtomicBool,
    in_configuration: AtomicBool,
    accepts_input: AtomicBool,
    accepts_photo_output: AtomicBool,
    supported_presets: Mutex<Vec<SessionPreset>>,
    preset: Mutex<Option<SessionPreset>>,
    wide_color: AtomicBool,
    inputs: Mutex<Vec<String>>,
    photo_output: AtomicBool,
    high_resolution: AtomicBool,
    photo_orientation: Mutex<Option<VideoOrientation>>,
    script: Mutex<CaptureScript>,
    held_sinks: Mutex<Vec<CaptureEventSink>>,
    captures: Mutex<Vec<PhotoSettings>>,
}

impl MockSession {
    fn new(log: OperationLog) -> Self {
        Self {
            log,
            running: AtomicBool::new(false),
            in_configuration: AtomicBool::new(false),
            accepts_input: AtomicBool::new(true),
            accepts_photo_output: AtomicBool::new(true),
            supported_presets: Mutex::new(vec![
                SessionPreset::Photo,
                SessionPreset::High,
                SessionPreset::Medium,
                SessionPreset::Low,
            ]),
            preset: Mutex::new(None),
            wide_color: AtomicBool::new(false),
            inputs: Mutex::new(Vec::new()),
            photo_output: AtomicBool::new(false),
            high_resolution: AtomicBool::new(false),
            photo_orientation: Mutex::new(None),
            script: Mutex::new(CaptureScript::Succeed(SAMPLE_PHOTO.to_vec())),
            held_sinks: Mutex::new(Vec::new()),
            captures: Mutex::new(Vec::new()),
        }
    }

    pub fn set_accepts_input(&self, accepts: bool) {
        self.accepts_input.store(accepts, Ordering::SeqCst);
    }

    pub fn set_accepts_photo_output(&self, accepts: bool) {
        self.accepts_photo_output.store(accepts, Ordering::SeqCst);
    }

    pub fn set_supported_presets(&self, presets: Vec<SessionPreset>) {
        *self.supported_presets.lock() = presets;
    }

    pub fn set_capture_script(&self, script: CaptureScript) {
        *self.script.lock() = script;
    }

    pub fn take_held_sinks(&self) -> Vec<CaptureEventSink> {
        std::mem::take(&mut *self.held_sinks.lock())
    }

    pub fn preset(&self) -> Option<SessionPreset> {
        *self.preset.lock()
    }

    pub fn inputs(&self) -> Vec<String> {
        self.inputs.lock().clone()
    }

    pub fn has_photo_output(&self) -> bool {
        self.photo_output.load(Ordering::SeqCst)
    }

    pub fn is_high_resolution_capture_enabled(&self) -> bool {
        self.high_resolution.load(Ordering::SeqCst)
    }

    pub fn wide_color_enabled(&self) -> bool {
        self.wide_color.load(Ordering::SeqCst)
    }

    pub fn photo_orientation(&self) -> Option<VideoOrientation> {
        *self.photo_orientation.lock()
    }

    /// Settings of every capture issued so far
    pub fn captures(&self) -> Vec<PhotoSettings> {
        self.captures.lock().clone()
    }

    pub fn is_in_configuration(&self) -> bool {
        self.in_configuration.load(Ordering::SeqCst)
    }
}

impl CaptureSession for MockSession {
    fn begin_configuration(&self) {
        self.log.push("begin_configuration");
        self.in_configuration.store(true, Ordering::SeqCst);
    }

    fn commit_configuration(&self) {
        self.log.push("commit_configuration");
        self.in_configuration.store(false, Ordering::SeqCst);
    }

    fn can_set_preset(&self, preset: SessionPreset) -> bool {
        self.supported_presets.lock().contains(&preset)
    }

    fn set_preset(&self, preset: SessionPreset) {
        self.log.push(format!("set_preset:{:?}", preset));
        *self.preset.lock() = Some(preset);
    }

    fn set_automatically_configures_wide_color(&self, enabled: bool) {
        self.wide_color.store(enabled, Ordering::SeqCst);
    }

    fn can_add_input(&self, _input: &DeviceInput) -> bool {
        self.accepts_input.load(Ordering::SeqCst) && self.inputs.lock().is_empty()
    }

    fn add_input(&self, input: &DeviceInput) {
        let id = input.device().unique_id();
        self.log.push(format!("add_input:{}", id));
        self.inputs.lock().push(id);
    }

    fn remove_input(&self, input: &DeviceInput) {
        let id = input.device().unique_id();
        self.log.push(format!("remove_input:{}", id));
        self.inputs.lock().retain(|existing| *existing != id);
    }

    fn can_add_photo_output(&self) -> bool {
        self.accepts_photo_output.load(Ordering::SeqCst) && !self.has_photo_output()
    }

    fn add_photo_output(&self) {
        self.log.push("add_photo_output");
        self.photo_output.store(true, Ordering::SeqCst);
    }

    fn remove_photo_output(&self) {
        self.log.push("remove_photo_output");
        self.photo_output.store(false, Ordering::SeqCst);
        *self.photo_orientation.lock() = None;
    }

    fn set_high_resolution_capture_enabled(&self, enabled: bool) {
        self.high_resolution.store(enabled, Ordering::SeqCst);
    }

    fn set_photo_orientation(&self, orientation: VideoOrientation) {
        if self.has_photo_output() && !self.inputs.lock().is_empty() {
            *self.photo_orientation.lock() = Some(orientation);
        }
    }

    fn capture_photo(&self, settings: &PhotoSettings, sink: CaptureEventSink) {
        self.log
            .push(format!("capture_photo:{}", settings.unique_id()));
        self.captures.lock().push(settings.clone());

        if !self.is_running() || !self.has_photo_output() {
            sink.did_finish_capture(Some("No active and enabled video connection".to_string()));
            return;
        }

        let script = self.script.lock().clone();
        match script {
            CaptureScript::Succeed(bytes) => {
                sink.will_begin_capture();
                sink.will_capture_photo();
                sink.did_capture_photo();
                sink.did_finish_processing(Ok(bytes));
                sink.did_finish_capture(None);
            }
            CaptureScript::FailCapture(message) => {
                sink.will_begin_capture();
                sink.will_capture_photo();
                sink.did_finish_capture(Some(message));
            }
            CaptureScript::FailProcessing(message) => {
                sink.will_begin_capture();
                sink.will_capture_photo();
                sink.did_capture_photo();
                sink.did_finish_processing(Err(message));
                sink.did_finish_capture(None);
            }
            CaptureScript::Hold => self.held_sinks.lock().push(sink),
            CaptureScript::Drop => drop(sink),
        }
    }

    fn start_running(&self) {
        self.log.push("start_running");
        self.running.store(true, Ordering::SeqCst);
    }

    fn stop_running(&self) {
        self.log.push("stop_running");
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

pub struct MockDevice {
    id: String,
    position: DevicePosition,
    log: OperationLog,
    flash_available: AtomicBool,
    fail_lock: AtomicBool,
    locked: AtomicBool,
    lock_attempts: AtomicUsize,
    point_of_interest_supported: AtomicBool,
    focus_mode: Mutex<FocusMode>,
    focus_point: Mutex<DevicePoint>,
    exposure_mode: Mutex<ExposureMode>,
    exposure_point: Mutex<DevicePoint>,
    subject_area_monitoring: AtomicBool,
    subject_area: broadcast::Sender<()>,
}

impl MockDevice {
    fn new(id: &str, position: DevicePosition, log: OperationLog) -> Self {
        let (subject_area, _) = broadcast::channel(16);
        Self {
            id: id.to_string(),
            position,
            log,
            flash_available: AtomicBool::new(true),
            fail_lock: AtomicBool::new(false),
            locked: AtomicBool::new(false),
            lock_attempts: AtomicUsize::new(0),
            point_of_interest_supported: AtomicBool::new(true),
            focus_mode: Mutex::new(FocusMode::ContinuousAutoFocus),
            focus_point: Mutex::new(DevicePoint::CENTER),
            exposure_mode: Mutex::new(ExposureMode::ContinuousAutoExposure),
            exposure_point: Mutex::new(DevicePoint::CENTER),
            subject_area_monitoring: AtomicBool::new(false),
            subject_area,
        }
    }

    pub fn set_flash_available(&self, available: bool) {
        self.flash_available.store(available, Ordering::SeqCst);
    }

    /// Make every configuration lock attempt fail
    pub fn set_lock_failure(&self, fail: bool) {
        self.fail_lock.store(fail, Ordering::SeqCst);
    }

    pub fn set_point_of_interest_supported(&self, supported: bool) {
        self.point_of_interest_supported
            .store(supported, Ordering::SeqCst);
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub fn lock_attempts(&self) -> usize {
        self.lock_attempts.load(Ordering::SeqCst)
    }

    pub fn focus_mode(&self) -> FocusMode {
        *self.focus_mode.lock()
    }

    pub fn focus_point(&self) -> DevicePoint {
        *self.focus_point.lock()
    }

    pub fn exposure_mode(&self) -> ExposureMode {
        *self.exposure_mode.lock()
    }

    pub fn exposure_point(&self) -> DevicePoint {
        *self.exposure_point.lock()
    }

    pub fn is_subject_area_monitoring_enabled(&self) -> bool {
        self.subject_area_monitoring.load(Ordering::SeqCst)
    }

    /// Fire a subject area change notification
    pub fn trigger_subject_area_change(&self) {
        self.log.push("subject_area_changed");
        let _ = self.subject_area.send(());
    }

    pub fn subject_area_observers(&self) -> usize {
        self.subject_area.receiver_count()
    }
}

impl CaptureDevice for MockDevice {
    fn unique_id(&self) -> String {
        self.id.clone()
    }

    fn position(&self) -> DevicePosition {
        self.position
    }

    fn is_flash_available(&self) -> bool {
        self.flash_available.load(Ordering::SeqCst)
    }

    fn lock_for_configuration(&self) -> Result<()> {
        self.lock_attempts.fetch_add(1, Ordering::SeqCst);
        self.log.push("lock_for_configuration");
        if self.fail_lock.load(Ordering::SeqCst) {
            return Err(CameraError::DeviceLockFailed {
                details: format!("device {} is in use by another client", self.id),
            });
        }
        self.locked.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn unlock_for_configuration(&self) {
        self.log.push("unlock_for_configuration");
        self.locked.store(false, Ordering::SeqCst);
    }

    fn is_focus_point_of_interest_supported(&self) -> bool {
        self.point_of_interest_supported.load(Ordering::SeqCst)
    }

    fn is_focus_mode_supported(&self, _mode: FocusMode) -> bool {
        true
    }

    fn set_focus_point_of_interest(&self, point: DevicePoint) {
        *self.focus_point.lock() = point;
    }

    fn set_focus_mode(&self, mode: FocusMode) {
        self.log.push(format!("set_focus_mode:{:?}", mode));
        *self.focus_mode.lock() = mode;
    }

    fn is_exposure_point_of_interest_supported(&self) -> bool {
        self.point_of_interest_supported.load(Ordering::SeqCst)
    }

    fn is_exposure_mode_supported(&self, mode: ExposureMode) -> bool {
        mode != ExposureMode::Custom
    }

    fn set_exposure_point_of_interest(&self, point: DevicePoint) {
        *self.exposure_point.lock() = point;
    }

    fn set_exposure_mode(&self, mode: ExposureMode) {
        *self.exposure_mode.lock() = mode;
    }

    fn set_subject_area_change_monitoring(&self, enabled: bool) {
        self.subject_area_monitoring.store(enabled, Ordering::SeqCst);
    }

    fn subject_area_changes(&self) -> broadcast::Receiver<()> {
        self.subject_area.subscribe()
    }
}

/// Fixed-size surface that records the preview attached to it
pub struct MockSurface {
    bounds: Size,
    attached: Mutex<Option<PreviewLayer>>,
}

impl MockSurface {
    pub fn new(bounds: Size) -> Self {
        Self {
            bounds,
            attached: Mutex::new(None),
        }
    }

    pub fn attached_preview(&self) -> Option<PreviewLayer> {
        self.attached.lock().clone()
    }
}

impl PreviewSurface for MockSurface {
    fn bounds(&self) -> Size {
        self.bounds
    }

    fn attach_preview(&self, preview: PreviewLayer) {
        *self.attached.lock() = Some(preview);
    }
}
