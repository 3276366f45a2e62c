use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::camera::canon::values::ImageQuality;

/// Default time `shoot` waits for the camera's transfer request.
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 15_000;
/// Default upper bound on each wait between two pumps of the event channel.
pub const DEFAULT_PUMP_INTERVAL_MS: u64 = 10;
pub const DEFAULT_OUTPUT: &str = "image.CR2";

/// Camera session settings. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CameraConfig {
    pub capture_timeout_ms: u64,
    pub pump_interval_ms: u64,
    /// Where `capture` writes until another path is set.
    pub default_output: PathBuf,
    /// Written to the camera when the session opens.
    pub image_quality: ImageQuality,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            capture_timeout_ms: DEFAULT_CAPTURE_TIMEOUT_MS,
            pump_interval_ms: DEFAULT_PUMP_INTERVAL_MS,
            default_output: PathBuf::from(DEFAULT_OUTPUT),
            image_quality: ImageQuality::Raw,
        }
    }
}

impl CameraConfig {
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }

    /// Never zero, so the wait loop always yields between pumps.
    pub fn pump_interval(&self) -> Duration {
        Duration::from_millis(self.pump_interval_ms.max(1))
    }
}
