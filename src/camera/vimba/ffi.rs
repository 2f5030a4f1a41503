//! Raw VimbaC 1.x FFI declarations.
//!
//! Only compiled when the `vimba` feature is enabled AND the VimbaC shared
//! library is available for linking. All access goes through the safe
//! `VimbaSdk` wrapper.

#![allow(non_snake_case)]

use std::os::raw::{c_char, c_void};

/// Opaque handle to a camera or other VimbaC module.
pub type VmbHandle = *mut c_void;

/// `VmbVersionInfo_t`.
#[derive(Debug, Clone, Copy, Default)]
#[repr(C)]
pub struct VmbVersionInfo {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// `VmbCameraInfo_t`. Strings are owned by the library.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct VmbCameraInfo {
    pub camera_id_string: *const c_char,
    pub camera_name: *const c_char,
    pub model_name: *const c_char,
    pub serial_string: *const c_char,
    pub permitted_access: u32,
    pub interface_id_string: *const c_char,
}

impl VmbCameraInfo {
    pub const fn empty() -> Self {
        Self {
            camera_id_string: std::ptr::null(),
            camera_name: std::ptr::null(),
            model_name: std::ptr::null(),
            serial_string: std::ptr::null(),
            permitted_access: 0,
            interface_id_string: std::ptr::null(),
        }
    }
}

/// `VmbFrame_t`. The library writes the `receive_status` .. `timestamp`
/// fields while the frame is queued, so its address must stay fixed.
#[derive(Debug)]
#[repr(C)]
pub struct VmbFrame {
    pub buffer: *mut c_void,
    pub buffer_size: u32,
    pub context: [*mut c_void; 4],
    pub receive_status: i32,
    pub receive_flags: u32,
    pub image_size: u32,
    pub ancillary_size: u32,
    pub pixel_format: u32,
    pub width: u32,
    pub height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
    pub frame_id: u64,
    pub timestamp: u64,
}

impl VmbFrame {
    /// A frame descriptor pointing at `buffer`.
    pub fn for_buffer(buffer: &mut [u8]) -> Self {
        Self {
            buffer: buffer.as_mut_ptr().cast(),
            buffer_size: buffer.len() as u32,
            context: [std::ptr::null_mut(); 4],
            receive_status: 0,
            receive_flags: 0,
            image_size: 0,
            ancillary_size: 0,
            pixel_format: 0,
            width: 0,
            height: 0,
            offset_x: 0,
            offset_y: 0,
            frame_id: 0,
            timestamp: 0,
        }
    }
}

/// Frame completion callback type.
pub type VmbFrameCallback = Option<unsafe extern "C" fn(camera: VmbHandle, frame: *mut VmbFrame)>;

#[link(name = "VimbaC")]
extern "C" {
    /// Query the library version.
    pub fn VmbVersionQuery(version_info: *mut VmbVersionInfo, sizeof_version_info: u32) -> i32;

    /// Start the API. Must be called before any other function.
    pub fn VmbStartup() -> i32;

    /// Shut the API down and release all resources.
    pub fn VmbShutdown();

    /// List connected cameras. With a null list only `num_found` is written.
    pub fn VmbCamerasList(
        camera_info: *mut VmbCameraInfo,
        list_length: u32,
        num_found: *mut u32,
        sizeof_camera_info: u32,
    ) -> i32;

    /// Open a camera by ID string.
    pub fn VmbCameraOpen(id_string: *const c_char, access_mode: u32, camera: *mut VmbHandle)
        -> i32;

    /// Close a camera.
    pub fn VmbCameraClose(camera: VmbHandle) -> i32;

    /// Read an integer feature.
    pub fn VmbFeatureIntGet(handle: VmbHandle, name: *const c_char, value: *mut i64) -> i32;

    /// Set an enumeration feature by entry name.
    pub fn VmbFeatureEnumSet(handle: VmbHandle, name: *const c_char, value: *const c_char)
        -> i32;

    /// Run a command feature.
    pub fn VmbFeatureCommandRun(handle: VmbHandle, name: *const c_char) -> i32;

    /// Check whether a command feature has finished.
    pub fn VmbFeatureCommandIsDone(handle: VmbHandle, name: *const c_char, is_done: *mut u8)
        -> i32;

    /// Announce a frame buffer to the capture engine.
    pub fn VmbFrameAnnounce(camera: VmbHandle, frame: *const VmbFrame, sizeof_frame: u32) -> i32;

    /// Revoke all announced frames.
    pub fn VmbFrameRevokeAll(camera: VmbHandle) -> i32;

    /// Prepare the capture engine.
    pub fn VmbCaptureStart(camera: VmbHandle) -> i32;

    /// Stop the capture engine.
    pub fn VmbCaptureEnd(camera: VmbHandle) -> i32;

    /// Queue an announced frame.
    pub fn VmbCaptureFrameQueue(
        camera: VmbHandle,
        frame: *const VmbFrame,
        callback: VmbFrameCallback,
    ) -> i32;

    /// Block until a queued frame is filled or the timeout expires.
    pub fn VmbCaptureFrameWait(camera: VmbHandle, frame: *const VmbFrame, timeout_ms: u32) -> i32;

    /// Drop all queued frames.
    pub fn VmbCaptureQueueFlush(camera: VmbHandle) -> i32;
}
