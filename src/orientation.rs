use serde::{Deserialize, Serialize};

/// Physical orientation of the device as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceOrientation {
    Unknown,
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
    FaceUp,
    FaceDown,
}

impl DeviceOrientation {
    pub fn is_portrait(&self) -> bool {
        matches!(
            self,
            DeviceOrientation::Portrait | DeviceOrientation::PortraitUpsideDown
        )
    }

    pub fn is_landscape(&self) -> bool {
        matches!(
            self,
            DeviceOrientation::LandscapeLeft | DeviceOrientation::LandscapeRight
        )
    }
}

/// Orientation applied to a video connection (preview or photo output)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeRight,
    LandscapeLeft,
}

impl VideoOrientation {
    /// Map a device orientation onto a video orientation.
    ///
    /// Landscape is mirrored: a device rotated to landscape-left presents its
    /// sensor as landscape-right. Face up, face down and unknown have no video
    /// orientation.
    pub fn from_device(orientation: DeviceOrientation) -> Option<Self> {
        match orientation {
            DeviceOrientation::Portrait => Some(VideoOrientation::Portrait),
            DeviceOrientation::PortraitUpsideDown => Some(VideoOrientation::PortraitUpsideDown),
            DeviceOrientation::LandscapeLeft => Some(VideoOrientation::LandscapeRight),
            DeviceOrientation::LandscapeRight => Some(VideoOrientation::LandscapeLeft),
            DeviceOrientation::Unknown
            | DeviceOrientation::FaceUp
            | DeviceOrientation::FaceDown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Point in normalized device coordinates, (0,0) top-left to (1,1) bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevicePoint {
    pub x: f64,
    pub y: f64,
}

impl DevicePoint {
    pub const CENTER: DevicePoint = DevicePoint { x: 0.5, y: 0.5 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_normalized(&self) -> bool {
        (0.0..=1.0).contains(&self.x) && (0.0..=1.0).contains(&self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landscape_is_mirrored() {
        assert_eq!(
            VideoOrientation::from_device(DeviceOrientation::LandscapeLeft),
            Some(VideoOrientation::LandscapeRight)
        );
        assert_eq!(
            VideoOrientation::from_device(DeviceOrientation::LandscapeRight),
            Some(VideoOrientation::LandscapeLeft)
        );
    }

    #[test]
    fn test_flat_orientations_have_no_video_orientation() {
        for orientation in [
            DeviceOrientation::Unknown,
            DeviceOrientation::FaceUp,
            DeviceOrientation::FaceDown,
        ] {
            assert_eq!(VideoOrientation::from_device(orientation), None);
            assert!(!orientation.is_portrait());
            assert!(!orientation.is_landscape());
        }
    }

    #[test]
    fn test_video_orientation_defaults_to_portrait() {
        assert_eq!(VideoOrientation::default(), VideoOrientation::Portrait);
    }

    #[test]
    fn test_device_point_bounds() {
        assert!(DevicePoint::CENTER.is_normalized());
        assert!(!DevicePoint::new(1.2, 0.5).is_normalized());
    }
}
