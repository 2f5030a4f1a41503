use std::sync::Arc;

use crate::camera::error::Result;
use crate::camera::types::{CameraHandle, DeviceId, Frame, HotplugEvent};
use crate::camera::vimba::types::{error_description, VmbError};

/// Camera API abstraction.
///
/// Implemented by the VimbaC wrapper, the simulated camera and the test
/// mock. Provides API lifecycle, camera enumeration, single-frame
/// acquisition and hot-plug notifications.
pub trait CameraBackend: Send + Sync {
    /// Start the camera API. Must succeed before any other call.
    fn startup(&self) -> Result<()>;

    /// Shut the camera API down, releasing all cameras.
    fn shutdown(&self);

    /// Camera API version string.
    fn version(&self) -> String;

    /// List all currently connected cameras.
    fn camera_list(&self) -> Result<Vec<CameraHandle>>;

    /// Human-readable camera name.
    fn camera_name(&self, camera: CameraHandle) -> Result<String>;

    /// Unique camera identifier.
    fn camera_id(&self, camera: CameraHandle) -> Result<DeviceId>;

    /// Open the camera, acquire exactly one frame and close it again.
    ///
    /// Blocks until the frame arrives or the API gives up.
    fn acquire_single_image(&self, id: &DeviceId) -> Result<Frame>;

    /// Register for hot-plug notifications.
    ///
    /// The callback fires on the backend's internal thread when a camera is
    /// plugged in or out.
    fn watch_hotplug(&self, callback: Box<dyn Fn(HotplugEvent) + Send>) -> Result<()>;

    /// Translate an error code into a log message.
    fn error_to_message(&self, code: VmbError) -> String {
        error_description(code).to_string()
    }
}

macro_rules! forward_backend {
    ($ptr:ident) => {
        impl<T: CameraBackend + ?Sized> CameraBackend for $ptr<T> {
            fn startup(&self) -> Result<()> {
                (**self).startup()
            }
            fn shutdown(&self) {
                (**self).shutdown()
            }
            fn version(&self) -> String {
                (**self).version()
            }
            fn camera_list(&self) -> Result<Vec<CameraHandle>> {
                (**self).camera_list()
            }
            fn camera_name(&self, camera: CameraHandle) -> Result<String> {
                (**self).camera_name(camera)
            }
            fn camera_id(&self, camera: CameraHandle) -> Result<DeviceId> {
                (**self).camera_id(camera)
            }
            fn acquire_single_image(&self, id: &DeviceId) -> Result<Frame> {
                (**self).acquire_single_image(id)
            }
            fn watch_hotplug(&self, callback: Box<dyn Fn(HotplugEvent) + Send>) -> Result<()> {
                (**self).watch_hotplug(callback)
            }
            fn error_to_message(&self, code: VmbError) -> String {
                (**self).error_to_message(code)
            }
        }
    };
}

forward_backend!(Box);
forward_backend!(Arc);
