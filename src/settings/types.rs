use serde::{Deserialize, Serialize};

pub const DEFAULT_LOG_CAPACITY: usize = 256;
pub const DEFAULT_HOTPLUG_POLL_MS: u64 = 1000;
/// Smaller `hotplugPollMs` values are raised to this.
pub const MIN_HOTPLUG_POLL_MS: u64 = 50;

/// Pixel format produced by the simulated backend.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SimPixelFormat {
    #[default]
    Mono8,
    Bgr8,
}

/// Simulated backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulatorSettings {
    pub cameras: u32,
    pub width: u32,
    pub height: u32,
    pub pixel_format: SimPixelFormat,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            cameras: 1,
            width: 640,
            height: 480,
            pixel_format: SimPixelFormat::Mono8,
        }
    }
}

/// Top-level settings file structure.
///
/// Every field is optional in the JSON file; missing ones take defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct GrabSettings {
    /// Camera selected after the startup refresh, if connected.
    pub preferred_camera: Option<String>,
    /// Maximum number of log sink lines kept.
    pub log_capacity: usize,
    /// Interval of the polling hot-plug watcher.
    pub hotplug_poll_ms: u64,
    pub simulator: SimulatorSettings,
}

impl Default for GrabSettings {
    fn default() -> Self {
        Self {
            preferred_camera: None,
            log_capacity: DEFAULT_LOG_CAPACITY,
            hotplug_poll_ms: DEFAULT_HOTPLUG_POLL_MS,
            simulator: SimulatorSettings::default(),
        }
    }
}

impl GrabSettings {
    pub fn hotplug_poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.hotplug_poll_ms.max(MIN_HOTPLUG_POLL_MS))
    }
}
