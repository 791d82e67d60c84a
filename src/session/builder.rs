use super::manager::SimpleCamera;
use crate::config::SimpleCameraConfig;
use crate::error::{CameraError, Result};
use crate::platform::CameraPlatform;
use std::sync::Arc;

/// Builder for a session manager
pub struct SimpleCameraBuilder {
    platform: Option<Arc<dyn CameraPlatform>>,
    config: Option<SimpleCameraConfig>,
}

impl SimpleCameraBuilder {
    pub fn new() -> Self {
        Self {
            platform: None,
            config: None,
        }
    }

    pub fn platform(mut self, platform: Arc<dyn CameraPlatform>) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn config(mut self, config: SimpleCameraConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Validate the configuration and spawn the manager's session queue
    pub fn build(self) -> Result<SimpleCamera> {
        let platform = self
            .platform
            .ok_or_else(|| CameraError::system("Camera platform must be specified"))?;
        let config = self.config.unwrap_or_default();
        config.validate()?;

        Ok(SimpleCamera::new(platform, config))
    }
}

impl Default for SimpleCameraBuilder {
    fn default() -> Self {
        Self::new()
    }
}
