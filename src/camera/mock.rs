//! Mock camera backend for testing without a camera API.
//!
//! Uses a builder pattern to configure cameras, frames, and error
//! injection. Tests can also plug cameras in and out and fire the
//! registered hot-plug callback.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::{CameraHandle, DeviceId, Frame, FrameStatus, HotplugEvent, PixelFormat};
use crate::camera::vimba::types::VmbError;

/// A simulated camera in the mock. `None` fields fail to read.
#[derive(Debug, Clone)]
struct MockCamera {
    name: Option<String>,
    id: Option<String>,
}

/// Configurable error injection for a specific operation.
#[derive(Debug, Clone)]
struct ErrorInjection {
    operation: &'static str,
    error: CameraError,
}

type HotplugCallback = Box<dyn Fn(HotplugEvent) + Send>;

/// Mock camera backend.
///
/// All state is behind a `Mutex` so the mock satisfies `Send + Sync`.
pub struct MockBackend {
    state: Mutex<MockState>,
    hotplug: Mutex<Option<HotplugCallback>>,
}

#[derive(Debug, Default)]
struct MockState {
    cameras: Vec<MockCamera>,
    frames: VecDeque<Frame>,
    error_injections: Vec<ErrorInjection>,
    startup_calls: u32,
    shutdown_calls: u32,
    acquire_calls: u32,
}

impl MockBackend {
    /// Create a new empty mock (no cameras, no frames).
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState::default()),
            hotplug: Mutex::new(None),
        }
    }

    /// Add a camera whose name and ID can both be read.
    pub fn with_camera(self, name: &str, id: &str) -> Self {
        self.with_raw_camera(Some(name), Some(id))
    }

    /// Add a camera where `None` makes the corresponding read fail.
    pub fn with_raw_camera(self, name: Option<&str>, id: Option<&str>) -> Self {
        self.state.lock().cameras.push(MockCamera {
            name: name.map(str::to_string),
            id: id.map(str::to_string),
        });
        self
    }

    /// Queue a frame returned by the next `acquire_single_image`.
    pub fn with_frame(self, frame: Frame) -> Self {
        self.state.lock().frames.push_back(frame);
        self
    }

    /// Queue a complete Mono8 frame of the given size filled with `value`.
    pub fn with_mono_frame(self, width: u32, height: u32, value: u8) -> Self {
        let data = vec![value; width as usize * height as usize];
        self.with_frame(Frame::new(
            data,
            width,
            height,
            PixelFormat::Mono8,
            FrameStatus::Complete,
        ))
    }

    /// Inject an error for a specific operation name.
    ///
    /// Operation names: `"startup"`, `"camera_list"`, `"camera_name"`,
    /// `"camera_id"`, `"acquire_single_image"`, `"watch_hotplug"`.
    pub fn with_error(self, operation: &'static str, error: CameraError) -> Self {
        self.state
            .lock()
            .error_injections
            .push(ErrorInjection { operation, error });
        self
    }

    /// Connect a new camera at runtime and fire `PluggedIn`.
    pub fn plug_in(&self, name: &str, id: &str) {
        self.state.lock().cameras.push(MockCamera {
            name: Some(name.to_string()),
            id: Some(id.to_string()),
        });
        self.fire_hotplug(HotplugEvent::PluggedIn(DeviceId::new(id)));
    }

    /// Disconnect a camera at runtime and fire `PluggedOut`.
    pub fn unplug(&self, id: &str) {
        self.state
            .lock()
            .cameras
            .retain(|cam| cam.id.as_deref() != Some(id));
        self.fire_hotplug(HotplugEvent::PluggedOut(DeviceId::new(id)));
    }

    /// Invoke the registered hot-plug callback, if any.
    pub fn fire_hotplug(&self, event: HotplugEvent) {
        if let Some(callback) = self.hotplug.lock().as_ref() {
            callback(event);
        }
    }

    pub fn has_hotplug_callback(&self) -> bool {
        self.hotplug.lock().is_some()
    }

    pub fn startup_calls(&self) -> u32 {
        self.state.lock().startup_calls
    }

    pub fn shutdown_calls(&self) -> u32 {
        self.state.lock().shutdown_calls
    }

    pub fn acquire_calls(&self) -> u32 {
        self.state.lock().acquire_calls
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockState {
    /// Check for injected errors for the given operation.
    fn check_error(&mut self, operation: &str) -> Result<()> {
        if let Some(pos) = self
            .error_injections
            .iter()
            .position(|e| e.operation == operation)
        {
            let injection = self.error_injections.remove(pos);
            return Err(injection.error);
        }
        Ok(())
    }

    fn get_camera(&self, handle: CameraHandle) -> Result<&MockCamera> {
        self.cameras
            .get(handle.0)
            .ok_or(CameraError::Sdk(VmbError::BAD_HANDLE))
    }
}

impl CameraBackend for MockBackend {
    fn startup(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.startup_calls += 1;
        state.check_error("startup")
    }

    fn shutdown(&self) {
        self.state.lock().shutdown_calls += 1;
        *self.hotplug.lock() = None;
    }

    fn version(&self) -> String {
        "0.0.0-mock".to_string()
    }

    fn camera_list(&self) -> Result<Vec<CameraHandle>> {
        let mut state = self.state.lock();
        state.check_error("camera_list")?;
        Ok((0..state.cameras.len()).map(CameraHandle).collect())
    }

    fn camera_name(&self, camera: CameraHandle) -> Result<String> {
        let mut state = self.state.lock();
        state.check_error("camera_name")?;
        state
            .get_camera(camera)?
            .name
            .clone()
            .ok_or(CameraError::Sdk(VmbError::NOT_FOUND))
    }

    fn camera_id(&self, camera: CameraHandle) -> Result<DeviceId> {
        let mut state = self.state.lock();
        state.check_error("camera_id")?;
        state
            .get_camera(camera)?
            .id
            .clone()
            .map(DeviceId::new)
            .ok_or(CameraError::Sdk(VmbError::NOT_FOUND))
    }

    fn acquire_single_image(&self, id: &DeviceId) -> Result<Frame> {
        let mut state = self.state.lock();
        state.acquire_calls += 1;
        state.check_error("acquire_single_image")?;

        if !state
            .cameras
            .iter()
            .any(|cam| cam.id.as_deref() == Some(id.as_str()))
        {
            return Err(CameraError::DeviceNotFound(id.to_string()));
        }

        state
            .frames
            .pop_front()
            .ok_or(CameraError::Sdk(VmbError::TIMEOUT))
    }

    fn watch_hotplug(&self, callback: Box<dyn Fn(HotplugEvent) + Send>) -> Result<()> {
        self.state.lock().check_error("watch_hotplug")?;
        *self.hotplug.lock() = Some(callback);
        Ok(())
    }
}
