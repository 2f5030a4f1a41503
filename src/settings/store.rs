use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use thiserror::Error;

use crate::settings::types::GrabSettings;

/// Settings persistence errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistent settings store backed by a JSON file.
pub struct SettingsStore {
    path: PathBuf,
    data: Mutex<GrabSettings>,
    is_dirty: AtomicBool,
}

impl SettingsStore {
    /// Create a new store, loading from disk if the file exists.
    ///
    /// An unreadable file falls back to defaults with a warning.
    pub fn new(path: PathBuf) -> Self {
        let data = Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Ignoring settings at {}: {e}", path.display());
            GrabSettings::default()
        });
        Self {
            path,
            data: Mutex::new(data),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Default location: `<config dir>/syncgrab/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("syncgrab").join("settings.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings from a JSON file, returning default on missing file.
    pub fn load(path: &Path) -> Result<GrabSettings, SettingsError> {
        if !path.exists() {
            return Ok(GrabSettings::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save current settings to disk atomically (write .tmp then rename).
    pub fn save(&self) -> Result<(), SettingsError> {
        let data = self.data.lock().clone();
        let json = serde_json::to_string_pretty(&data)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;

        self.is_dirty.store(false, Ordering::Release);
        Ok(())
    }

    /// Save only when something changed since the last save.
    pub fn save_if_dirty(&self) -> Result<bool, SettingsError> {
        if !self.is_dirty.load(Ordering::Acquire) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Snapshot of the current settings.
    pub fn get(&self) -> GrabSettings {
        self.data.lock().clone()
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Acquire)
    }

    /// Remember the camera to select on the next startup.
    pub fn set_preferred_camera(&self, device_id: &str) {
        let mut data = self.data.lock();
        if data.preferred_camera.as_deref() == Some(device_id) {
            return;
        }
        data.preferred_camera = Some(device_id.to_string());
        self.is_dirty.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::types::SimPixelFormat;
    use tempfile::TempDir;

    /// Helper: create a store backed by a temp directory.
    fn temp_store() -> (SettingsStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path);
        (store, dir)
    }

    #[test]
    fn load_returns_default_when_file_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nonexistent.json");
        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result, GrabSettings::default());
    }

    #[test]
    fn load_parses_valid_json_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let json = r#"{"preferredCamera":"DEV_42","simulator":{"pixelFormat":"bgr8"}}"#;
        std::fs::write(&path, json).unwrap();

        let result = SettingsStore::load(&path).unwrap();
        assert_eq!(result.preferred_camera.as_deref(), Some("DEV_42"));
        assert_eq!(result.simulator.pixel_format, SimPixelFormat::Bgr8);
    }

    #[test]
    fn load_returns_error_for_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not json {{{").unwrap();

        let result = SettingsStore::load(&path);
        assert!(matches!(result, Err(SettingsError::Parse(_))));
    }

    #[test]
    fn new_falls_back_to_default_for_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "[1, 2").unwrap();

        let store = SettingsStore::new(path);
        assert_eq!(store.get(), GrabSettings::default());
    }

    #[test]
    fn save_round_trips_through_file() {
        let (store, _dir) = temp_store();
        store.set_preferred_camera("DEV_7");
        store.save().unwrap();

        let reloaded = SettingsStore::new(store.path().to_path_buf());
        assert_eq!(reloaded.get().preferred_camera.as_deref(), Some("DEV_7"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("settings.json");
        let store = SettingsStore::new(path.clone());

        store.save().unwrap();
        assert!(path.exists());
    }

    #[test]
    fn save_leaves_no_tmp_file() {
        let (store, dir) = temp_store();
        store.save().unwrap();

        assert!(dir.path().join("settings.json").exists());
        assert!(!dir.path().join("settings.json.tmp").exists());
    }

    #[test]
    fn set_preferred_camera_marks_dirty_once() {
        let (store, _dir) = temp_store();
        assert!(!store.is_dirty());

        store.set_preferred_camera("DEV_1");
        assert!(store.is_dirty());
        assert!(store.save_if_dirty().unwrap());
        assert!(!store.is_dirty());

        // Same value again is not a change.
        store.set_preferred_camera("DEV_1");
        assert!(!store.save_if_dirty().unwrap());
    }

    #[test]
    fn save_if_dirty_skips_clean_store() {
        let (store, dir) = temp_store();
        assert!(!store.save_if_dirty().unwrap());
        assert!(!dir.path().join("settings.json").exists());
    }
}
