use crate::orientation::{DevicePoint, VideoOrientation};
use crate::platform::{DevicePosition, FlashMode, SessionPreset};
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Immutable configuration handed to the session manager at construction
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimpleCameraConfig {
    pub session: SessionConfig,
    pub capture: CaptureConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SessionConfig {
    /// Which camera to open
    #[serde(default = "default_device_position")]
    pub device_position: DevicePosition,

    /// Preferred quality preset, applied only when the session supports it
    #[serde(default = "default_preset")]
    pub preset: SessionPreset,

    /// Let the session pick wide colour formats on its own
    #[serde(default = "default_wide_color")]
    pub automatically_configure_wide_color: bool,

    /// Enable high resolution capture on the photo output
    #[serde(default = "default_high_resolution_capture")]
    pub high_resolution_capture: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CaptureConfig {
    /// Flash mode of the default settings when the device has a flash
    #[serde(default = "default_flash_mode")]
    pub default_flash_mode: FlashMode,

    /// Request high resolution photos in the default settings
    #[serde(default = "default_high_resolution_photo")]
    pub high_resolution_photo: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct PreviewConfig {
    /// Orientation used when the device orientation is not a video orientation
    #[serde(default = "default_initial_orientation")]
    pub initial_orientation: VideoOrientation,

    /// Point refocused on after a subject area change
    #[serde(default = "default_subject_area_focus_point")]
    pub subject_area_focus_point: DevicePoint,
}

impl SimpleCameraConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("simplecam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let focus_point = default_subject_area_focus_point();
        let settings = Config::builder()
            .set_default("session.device_position", "Back")?
            .set_default("session.preset", "Photo")?
            .set_default(
                "session.automatically_configure_wide_color",
                default_wide_color(),
            )?
            .set_default(
                "session.high_resolution_capture",
                default_high_resolution_capture(),
            )?
            .set_default("capture.default_flash_mode", "Auto")?
            .set_default(
                "capture.high_resolution_photo",
                default_high_resolution_photo(),
            )?
            .set_default("preview.initial_orientation", "Portrait")?
            .set_default("preview.subject_area_focus_point.x", focus_point.x)?
            .set_default("preview.subject_area_focus_point.y", focus_point.y)?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Environment overrides, e.g. SIMPLECAM_SESSION__PRESET=High
            .add_source(
                Environment::with_prefix("SIMPLECAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: SimpleCameraConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.preview.subject_area_focus_point.is_normalized() {
            return Err(ConfigError::Message(
                "Subject area focus point must lie within 0.0..=1.0 on both axes".to_string(),
            ));
        }

        if self.session.device_position == DevicePosition::Unspecified {
            return Err(ConfigError::Message(
                "Session device_position must be Back or Front".to_string(),
            ));
        }

        Ok(())
    }

    /// Render the configuration as TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for SimpleCameraConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                device_position: default_device_position(),
                preset: default_preset(),
                automatically_configure_wide_color: default_wide_color(),
                high_resolution_capture: default_high_resolution_capture(),
            },
            capture: CaptureConfig {
                default_flash_mode: default_flash_mode(),
                high_resolution_photo: default_high_resolution_photo(),
            },
            preview: PreviewConfig {
                initial_orientation: default_initial_orientation(),
                subject_area_focus_point: default_subject_area_focus_point(),
            },
        }
    }
}

// Default value functions
fn default_device_position() -> DevicePosition {
    DevicePosition::Back
}
fn default_preset() -> SessionPreset {
    SessionPreset::Photo
}
fn default_wide_color() -> bool {
    true
}
fn default_high_resolution_capture() -> bool {
    true
}

fn default_flash_mode() -> FlashMode {
    FlashMode::Auto
}
fn default_high_resolution_photo() -> bool {
    true
}

fn default_initial_orientation() -> VideoOrientation {
    VideoOrientation::Portrait
}
fn default_subject_area_focus_point() -> DevicePoint {
    DevicePoint::CENTER
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SimpleCameraConfig::default();
        assert_eq!(config.session.device_position, DevicePosition::Back);
        assert_eq!(config.session.preset, SessionPreset::Photo);
        assert!(config.session.high_resolution_capture);
        assert_eq!(config.capture.default_flash_mode, FlashMode::Auto);
        assert_eq!(config.preview.subject_area_focus_point, DevicePoint::CENTER);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = SimpleCameraConfig::load_from_file("/nonexistent/simplecam.toml").unwrap();
        assert_eq!(config, SimpleCameraConfig::default());
    }

    #[test]
    fn test_load_default_sources_is_valid() {
        let config = SimpleCameraConfig::load().unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[session]
device_position = "Front"
preset = "High"

[capture]
default_flash_mode = "Off"

[preview]
initial_orientation = "LandscapeRight"
"#
        )
        .unwrap();

        let config = SimpleCameraConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.session.device_position, DevicePosition::Front);
        assert_eq!(config.session.preset, SessionPreset::High);
        assert!(config.session.automatically_configure_wide_color);
        assert_eq!(config.capture.default_flash_mode, FlashMode::Off);
        assert!(config.capture.high_resolution_photo);
        assert_eq!(
            config.preview.initial_orientation,
            VideoOrientation::LandscapeRight
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimpleCameraConfig::default();
        config.preview.subject_area_focus_point = DevicePoint::new(1.5, 0.5);
        assert!(config.validate().is_err());

        config.preview.subject_area_focus_point = DevicePoint::new(0.25, 0.75);
        assert!(config.validate().is_ok());

        config.session.device_position = DevicePosition::Unspecified;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_output_parses_back() {
        let config = SimpleCameraConfig::default();
        let rendered = config.to_toml().unwrap();
        let parsed: SimpleCameraConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
