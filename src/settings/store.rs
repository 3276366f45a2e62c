use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::camera::error::Result;
use crate::settings::types::CameraConfig;

/// Persistent camera configuration backed by a JSON file.
pub struct SettingsStore {
    path: PathBuf,
    data: Mutex<CameraConfig>,
}

impl SettingsStore {
    /// Open a store at `path`, loading the file if it exists.
    ///
    /// A malformed file is reported rather than silently replaced.
    pub fn open(path: PathBuf) -> Result<Self> {
        let data = Self::load(&path)?;
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Load a configuration file, returning defaults on a missing file.
    pub fn load(path: &Path) -> Result<CameraConfig> {
        if !path.exists() {
            return Ok(CameraConfig::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save current settings to disk atomically (write .tmp then rename).
    pub fn save(&self) -> Result<()> {
        let data = self.data.lock().clone();
        let json = serde_json::to_string_pretty(&data)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!("Saved camera settings to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> CameraConfig {
        self.data.lock().clone()
    }

    /// Change the in-memory configuration. Call [`save`](Self::save) to persist.
    pub fn update(&self, change: impl FnOnce(&mut CameraConfig)) {
        change(&mut self.data.lock());
    }
}
