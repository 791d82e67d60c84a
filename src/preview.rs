use crate::orientation::{DevicePoint, Size, VideoOrientation};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Caller-owned view that hosts the live preview
pub trait PreviewSurface: Send + Sync {
    /// Current bounds of the view; the preview fills them when attached
    fn bounds(&self) -> Size;

    fn attach_preview(&self, preview: PreviewLayer);
}

#[derive(Debug, Default)]
struct PreviewState {
    frame: Size,
    /// `None` until the session has a video input feeding the preview
    connection: Option<VideoOrientation>,
}

/// Rendering handle bound to the session's live video feed.
///
/// Cloning yields another handle onto the same layer.
#[derive(Debug, Clone, Default)]
pub struct PreviewLayer {
    state: Arc<RwLock<PreviewState>>,
}

impl PreviewLayer {
    pub fn new(frame: Size) -> Self {
        Self {
            state: Arc::new(RwLock::new(PreviewState {
                frame,
                connection: None,
            })),
        }
    }

    pub fn frame(&self) -> Size {
        self.state.read().frame
    }

    pub fn set_frame_size(&self, size: Size) {
        self.state.write().frame = size;
    }

    pub fn is_connected(&self) -> bool {
        self.state.read().connection.is_some()
    }

    /// Orientation of the preview connection, if the preview is connected
    pub fn video_orientation(&self) -> Option<VideoOrientation> {
        self.state.read().connection
    }

    /// Update the connection orientation. Ignored while disconnected.
    pub fn set_video_orientation(&self, orientation: VideoOrientation) {
        let mut state = self.state.write();
        if state.connection.is_some() {
            state.connection = Some(orientation);
        }
    }

    pub(crate) fn connect(&self, orientation: VideoOrientation) {
        debug!("Preview connected with orientation {:?}", orientation);
        self.state.write().connection = Some(orientation);
    }

    pub(crate) fn disconnect(&self) {
        self.state.write().connection = None;
    }

    /// Convert a point in layer coordinates to normalized device coordinates.
    ///
    /// Device coordinates are relative to the sensor in its native
    /// landscape-right orientation.
    pub fn device_point_from_layer_point(&self, x: f64, y: f64) -> DevicePoint {
        let state = self.state.read();
        if state.frame.width <= 0.0 || state.frame.height <= 0.0 {
            return DevicePoint::CENTER;
        }

        let nx = (x / state.frame.width).clamp(0.0, 1.0);
        let ny = (y / state.frame.height).clamp(0.0, 1.0);

        match state.connection.unwrap_or_default() {
            VideoOrientation::LandscapeRight => DevicePoint::new(nx, ny),
            VideoOrientation::LandscapeLeft => DevicePoint::new(1.0 - nx, 1.0 - ny),
            VideoOrientation::Portrait => DevicePoint::new(ny, 1.0 - nx),
            VideoOrientation::PortraitUpsideDown => DevicePoint::new(1.0 - ny, nx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_ignored_until_connected() {
        let preview = PreviewLayer::new(Size::new(390.0, 844.0));
        preview.set_video_orientation(VideoOrientation::LandscapeLeft);
        assert_eq!(preview.video_orientation(), None);

        preview.connect(VideoOrientation::Portrait);
        preview.set_video_orientation(VideoOrientation::LandscapeLeft);
        assert_eq!(
            preview.video_orientation(),
            Some(VideoOrientation::LandscapeLeft)
        );

        preview.disconnect();
        assert!(!preview.is_connected());
    }

    #[test]
    fn test_clones_share_state() {
        let preview = PreviewLayer::new(Size::new(100.0, 200.0));
        let other = preview.clone();
        other.set_frame_size(Size::new(200.0, 100.0));
        assert_eq!(preview.frame(), Size::new(200.0, 100.0));
    }

    #[test]
    fn test_device_point_conversion() {
        let preview = PreviewLayer::new(Size::new(200.0, 400.0));
        preview.connect(VideoOrientation::Portrait);

        // Top-right of a portrait preview is the sensor origin
        let point = preview.device_point_from_layer_point(200.0, 0.0);
        assert_eq!(point, DevicePoint::new(0.0, 0.0));

        let center = preview.device_point_from_layer_point(100.0, 200.0);
        assert_eq!(center, DevicePoint::CENTER);

        preview.set_video_orientation(VideoOrientation::LandscapeRight);
        let point = preview.device_point_from_layer_point(50.0, 100.0);
        assert_eq!(point, DevicePoint::new(0.25, 0.25));
    }

    #[test]
    fn test_device_point_for_empty_frame() {
        let preview = PreviewLayer::new(Size::default());
        assert_eq!(
            preview.device_point_from_layer_point(10.0, 10.0),
            DevicePoint::CENTER
        );
    }
}
