use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::hotplug::HotplugWatcher;
use crate::camera::types::{CameraHandle, DeviceId, Frame, FrameStatus, HotplugEvent, PixelFormat};
use crate::camera::vimba::types::VmbError;
use crate::settings::types::{SimPixelFormat, SimulatorSettings};

const SIM_VERSION: &str = "1.3.0-sim";

/// Static description of a simulated camera.
#[derive(Debug, Clone)]
struct SimCamera {
    id: DeviceId,
    name: String,
}

/// A fake camera backend for running without hardware.
///
/// Exposes `cameras` simulated devices that return a moving gradient test
/// pattern in the configured pixel format. Hot-plug notifications come from
/// a polling watcher over the simulated camera list.
pub struct SimulatedBackend {
    cameras: Arc<Mutex<Vec<SimCamera>>>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    poll_interval: Duration,
    started: AtomicBool,
    frame_counter: AtomicU64,
    watcher: Mutex<Option<HotplugWatcher>>,
}

impl SimulatedBackend {
    /// Create a simulator from settings.
    pub fn new(settings: &SimulatorSettings, poll_interval: Duration) -> Self {
        let cameras = (0..settings.cameras)
            .map(|i| SimCamera {
                id: Self::device_id(i),
                name: format!("Simulated Camera {}", i + 1),
            })
            .collect();

        let pixel_format = match settings.pixel_format {
            SimPixelFormat::Mono8 => PixelFormat::Mono8,
            SimPixelFormat::Bgr8 => PixelFormat::Bgr8,
        };

        Self {
            cameras: Arc::new(Mutex::new(cameras)),
            width: settings.width,
            height: settings.height,
            pixel_format,
            poll_interval,
            started: AtomicBool::new(false),
            frame_counter: AtomicU64::new(0),
            watcher: Mutex::new(None),
        }
    }

    /// The stable device ID of the `index`-th simulated camera.
    pub fn device_id(index: u32) -> DeviceId {
        DeviceId::new(format!("SIM_{:04}", index + 1))
    }

    fn ensure_started(&self) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CameraError::Sdk(VmbError::API_NOT_STARTED))
        }
    }

    fn camera(&self, handle: CameraHandle) -> Result<SimCamera> {
        self.cameras
            .lock()
            .get(handle.0)
            .cloned()
            .ok_or(CameraError::Sdk(VmbError::BAD_HANDLE))
    }

    /// Render one test pattern frame. `phase` shifts the gradient.
    fn render(&self, phase: u64) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let shift = (phase % 256) as usize;
        match self.pixel_format {
            PixelFormat::Bgr8 => {
                let mut data = Vec::with_capacity(w * h * 3);
                for y in 0..h {
                    for x in 0..w {
                        data.push(((x + shift) % 256) as u8);
                        data.push((y % 256) as u8);
                        data.push(((x ^ y) % 256) as u8);
                    }
                }
                data
            }
            _ => {
                let mut data = Vec::with_capacity(w * h);
                for y in 0..h {
                    for x in 0..w {
                        data.push(((x + y + shift) % 256) as u8);
                    }
                }
                data
            }
        }
    }
}

impl CameraBackend for SimulatedBackend {
    fn startup(&self) -> Result<()> {
        self.started.store(true, Ordering::SeqCst);
        tracing::debug!(
            "simulated camera API started with {} camera(s)",
            self.cameras.lock().len()
        );
        Ok(())
    }

    fn shutdown(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
        self.started.store(false, Ordering::SeqCst);
    }

    fn version(&self) -> String {
        SIM_VERSION.to_string()
    }

    fn camera_list(&self) -> Result<Vec<CameraHandle>> {
        self.ensure_started()?;
        Ok((0..self.cameras.lock().len()).map(CameraHandle).collect())
    }

    fn camera_name(&self, camera: CameraHandle) -> Result<String> {
        self.ensure_started()?;
        Ok(self.camera(camera)?.name)
    }

    fn camera_id(&self, camera: CameraHandle) -> Result<DeviceId> {
        self.ensure_started()?;
        Ok(self.camera(camera)?.id)
    }

    fn acquire_single_image(&self, id: &DeviceId) -> Result<Frame> {
        self.ensure_started()?;
        if !self.cameras.lock().iter().any(|cam| &cam.id == id) {
            return Err(CameraError::DeviceNotFound(id.to_string()));
        }

        let phase = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        Ok(Frame::new(
            self.render(phase),
            self.width,
            self.height,
            self.pixel_format,
            FrameStatus::Complete,
        ))
    }

    fn watch_hotplug(&self, callback: Box<dyn Fn(HotplugEvent) + Send>) -> Result<()> {
        self.ensure_started()?;
        let cameras = Arc::clone(&self.cameras);
        let watcher = HotplugWatcher::start(
            move || Ok(cameras.lock().iter().map(|cam| cam.id.clone()).collect()),
            callback,
            self.poll_interval,
        )?;
        // Replacing an older watcher stops it on drop.
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }
}

impl Drop for SimulatedBackend {
    fn drop(&mut self) {
        self.shutdown();
    }
}
