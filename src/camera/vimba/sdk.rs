//! Safe VimbaC wrapper with RAII lifecycle management.
//!
//! Only compiled when the `vimba` feature is enabled and the VimbaC library
//! is available. Tests use `MockBackend` instead.

use std::ffi::{CStr, CString};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::hotplug::HotplugWatcher;
use crate::camera::types::{CameraHandle, DeviceId, Frame, FrameStatus, HotplugEvent, PixelFormat};

use super::ffi::{self, VmbCameraInfo, VmbFrame, VmbHandle, VmbVersionInfo};
use super::types::{read_c_str, VmbError, ACCESS_MODE_FULL, FRAME_WAIT_TIMEOUT_MS};

/// Whether the API has been started (global, since VimbaC is per-process).
static API_STARTED: AtomicBool = AtomicBool::new(false);

/// How often to poll a running command for completion.
const COMMAND_POLL: Duration = Duration::from_millis(10);
const COMMAND_POLL_LIMIT: u32 = 200;

/// One entry of the most recent camera listing.
#[derive(Debug, Clone)]
struct ListedCamera {
    id: Option<String>,
    name: Option<String>,
}

/// Safe wrapper around the VimbaC API.
///
/// `startup()` starts the API; `shutdown()` or drop stops it. Only one
/// started instance may exist per process.
pub struct VimbaSdk {
    listing: Mutex<Vec<ListedCamera>>,
    watcher: Mutex<Option<HotplugWatcher>>,
    poll_interval: Duration,
    owns_api: AtomicBool,
}

impl VimbaSdk {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            listing: Mutex::new(Vec::new()),
            watcher: Mutex::new(None),
            poll_interval,
            owns_api: AtomicBool::new(false),
        }
    }

    fn ensure_started(&self) -> Result<()> {
        if self.owns_api.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(CameraError::Sdk(VmbError::API_NOT_STARTED))
        }
    }

    fn listed(&self, camera: CameraHandle) -> Result<ListedCamera> {
        self.listing
            .lock()
            .get(camera.0)
            .cloned()
            .ok_or(CameraError::Sdk(VmbError::BAD_HANDLE))
    }
}

/// Query the connected cameras.
fn list_cameras() -> Result<Vec<ListedCamera>> {
    let info_size = std::mem::size_of::<VmbCameraInfo>() as u32;
    let mut count: u32 = 0;
    VmbError::check(unsafe {
        ffi::VmbCamerasList(std::ptr::null_mut(), 0, &mut count, info_size)
    })?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let mut infos = vec![VmbCameraInfo::empty(); count as usize];
    let mut found: u32 = 0;
    let err = unsafe { ffi::VmbCamerasList(infos.as_mut_ptr(), count, &mut found, info_size) };
    // MORE_DATA means a camera appeared between the two calls; keep what fits.
    if err != VmbError::SUCCESS.0 && err != VmbError::MORE_DATA.0 {
        return Err(CameraError::Sdk(VmbError(err)));
    }
    infos.truncate(found.min(count) as usize);

    Ok(infos
        .iter()
        .map(|info| unsafe {
            ListedCamera {
                id: read_c_str(info.camera_id_string),
                name: read_c_str(info.camera_name),
            }
        })
        .collect())
}

/// An open camera, closed on drop.
struct OpenCamera {
    handle: VmbHandle,
}

impl OpenCamera {
    fn open(id: &DeviceId) -> Result<Self> {
        let id = CString::new(id.as_str()).map_err(|_| CameraError::Sdk(VmbError::BAD_PARAMETER))?;
        let mut handle: VmbHandle = std::ptr::null_mut();
        VmbError::check(unsafe { ffi::VmbCameraOpen(id.as_ptr(), ACCESS_MODE_FULL, &mut handle) })?;
        Ok(Self { handle })
    }

    fn feature_int(&self, name: &CStr) -> Result<i64> {
        let mut value: i64 = 0;
        VmbError::check(unsafe { ffi::VmbFeatureIntGet(self.handle, name.as_ptr(), &mut value) })?;
        Ok(value)
    }

    fn feature_enum_set(&self, name: &CStr, value: &CStr) -> Result<()> {
        VmbError::check(unsafe {
            ffi::VmbFeatureEnumSet(self.handle, name.as_ptr(), value.as_ptr())
        })?;
        Ok(())
    }

    fn command_run(&self, name: &CStr) -> Result<()> {
        VmbError::check(unsafe { ffi::VmbFeatureCommandRun(self.handle, name.as_ptr()) })?;
        Ok(())
    }

    /// Run a command and poll until the camera reports it done.
    fn command_run_and_wait(&self, name: &CStr) -> Result<()> {
        self.command_run(name)?;
        for _ in 0..COMMAND_POLL_LIMIT {
            let mut done: u8 = 0;
            VmbError::check(unsafe {
                ffi::VmbFeatureCommandIsDone(self.handle, name.as_ptr(), &mut done)
            })?;
            if done != 0 {
                return Ok(());
            }
            std::thread::sleep(COMMAND_POLL);
        }
        Err(CameraError::Sdk(VmbError::TIMEOUT))
    }

    /// Queue `frame`, trigger acquisition and wait for it to be filled.
    fn capture_into(&self, frame: &mut VmbFrame) -> Result<()> {
        let frame_ptr: *const VmbFrame = frame;
        VmbError::check(unsafe { ffi::VmbCaptureStart(self.handle) })?;
        VmbError::check(unsafe { ffi::VmbCaptureFrameQueue(self.handle, frame_ptr, None) })?;
        self.command_run(c"AcquisitionStart")?;
        let waited = VmbError::check(unsafe {
            ffi::VmbCaptureFrameWait(self.handle, frame_ptr, FRAME_WAIT_TIMEOUT_MS)
        });
        if let Err(e) = self.command_run(c"AcquisitionStop") {
            tracing::debug!("AcquisitionStop failed: {e}");
        }
        waited?;
        Ok(())
    }

    /// Undo `capture_into`, whether or not it succeeded.
    fn release_capture(&self) {
        unsafe {
            ffi::VmbCaptureEnd(self.handle);
            ffi::VmbCaptureQueueFlush(self.handle);
            ffi::VmbFrameRevokeAll(self.handle);
        }
    }
}

impl Drop for OpenCamera {
    fn drop(&mut self) {
        let err = unsafe { ffi::VmbCameraClose(self.handle) };
        if err != VmbError::SUCCESS.0 {
            tracing::warn!("VmbCameraClose failed: {}", VmbError(err));
        }
    }
}

impl CameraBackend for VimbaSdk {
    fn startup(&self) -> Result<()> {
        if API_STARTED.swap(true, Ordering::SeqCst) {
            return Err(CameraError::Startup(VmbError::INVALID_CALL));
        }

        let err = unsafe { ffi::VmbStartup() };
        if let Err(code) = VmbError::check(err) {
            API_STARTED.store(false, Ordering::SeqCst);
            return Err(CameraError::Startup(code));
        }

        self.owns_api.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn shutdown(&self) {
        if let Some(mut watcher) = self.watcher.lock().take() {
            watcher.stop();
        }
        if self.owns_api.swap(false, Ordering::SeqCst) {
            unsafe { ffi::VmbShutdown() };
            API_STARTED.store(false, Ordering::SeqCst);
        }
    }

    fn version(&self) -> String {
        let mut info = VmbVersionInfo::default();
        let size = std::mem::size_of::<VmbVersionInfo>() as u32;
        match VmbError::check(unsafe { ffi::VmbVersionQuery(&mut info, size) }) {
            Ok(()) => format!("{}.{}.{}", info.major, info.minor, info.patch),
            Err(e) => {
                tracing::debug!("VmbVersionQuery failed: {e}");
                "unknown".to_string()
            }
        }
    }

    fn camera_list(&self) -> Result<Vec<CameraHandle>> {
        self.ensure_started()?;
        let cameras = list_cameras()?;
        let handles = (0..cameras.len()).map(CameraHandle).collect();
        *self.listing.lock() = cameras;
        Ok(handles)
    }

    fn camera_name(&self, camera: CameraHandle) -> Result<String> {
        self.listed(camera)?
            .name
            .ok_or(CameraError::Sdk(VmbError::NOT_FOUND))
    }

    fn camera_id(&self, camera: CameraHandle) -> Result<DeviceId> {
        self.listed(camera)?
            .id
            .map(DeviceId::new)
            .ok_or(CameraError::Sdk(VmbError::NOT_FOUND))
    }

    fn acquire_single_image(&self, id: &DeviceId) -> Result<Frame> {
        self.ensure_started()?;
        let camera = OpenCamera::open(id)?;

        // GigE cameras negotiate their packet size; other transports lack the command.
        if let Err(e) = camera.command_run_and_wait(c"GVSPAdjustPacketSize") {
            tracing::debug!("GVSPAdjustPacketSize not applied: {e}");
        }

        if camera
            .feature_enum_set(c"PixelFormat", c"BGR8Packed")
            .is_err()
        {
            camera.feature_enum_set(c"PixelFormat", c"Mono8")?;
        }

        let payload = camera.feature_int(c"PayloadSize")?;
        let payload =
            usize::try_from(payload).map_err(|_| CameraError::Sdk(VmbError::INVALID_VALUE))?;
        let mut buffer = vec![0u8; payload];
        let mut frame = Box::new(VmbFrame::for_buffer(&mut buffer));

        VmbError::check(unsafe {
            ffi::VmbFrameAnnounce(
                camera.handle,
                &*frame,
                std::mem::size_of::<VmbFrame>() as u32,
            )
        })?;
        let captured = camera.capture_into(&mut frame);
        camera.release_capture();
        captured?;

        buffer.truncate((frame.image_size as usize).min(payload));
        Ok(Frame::new(
            buffer,
            frame.width,
            frame.height,
            PixelFormat::from_raw(frame.pixel_format),
            FrameStatus::from_raw(frame.receive_status),
        ))
    }

    fn watch_hotplug(&self, callback: Box<dyn Fn(HotplugEvent) + Send>) -> Result<()> {
        self.ensure_started()?;
        let watcher = HotplugWatcher::start(
            || {
                Ok(list_cameras()?
                    .into_iter()
                    .filter_map(|cam| cam.id.map(DeviceId::new))
                    .collect())
            },
            callback,
            self.poll_interval,
        )?;
        *self.watcher.lock() = Some(watcher);
        Ok(())
    }
}

impl Drop for VimbaSdk {
    fn drop(&mut self) {
        self.shutdown();
    }
}
