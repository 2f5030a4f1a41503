//! VimbaC 1.x type definitions, error codes, pixel formats and frame status codes.
//!
//! Values sourced from the VimbaC header files (VmbCommonTypes.h, VimbaC.h).

use std::fmt;

use serde::Serialize;

/// VimbaC error code (`VmbError_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VmbError(pub i32);

impl VmbError {
    pub const SUCCESS: Self = Self(0);
    pub const INTERNAL_FAULT: Self = Self(-1);
    pub const API_NOT_STARTED: Self = Self(-2);
    pub const NOT_FOUND: Self = Self(-3);
    pub const BAD_HANDLE: Self = Self(-4);
    pub const DEVICE_NOT_OPEN: Self = Self(-5);
    pub const INVALID_ACCESS: Self = Self(-6);
    pub const BAD_PARAMETER: Self = Self(-7);
    pub const STRUCT_SIZE: Self = Self(-8);
    pub const MORE_DATA: Self = Self(-9);
    pub const WRONG_TYPE: Self = Self(-10);
    pub const INVALID_VALUE: Self = Self(-11);
    pub const TIMEOUT: Self = Self(-12);
    pub const OTHER: Self = Self(-13);
    pub const RESOURCES: Self = Self(-14);
    pub const INVALID_CALL: Self = Self(-15);
    pub const NO_TL: Self = Self(-16);
    pub const NOT_IMPLEMENTED: Self = Self(-17);
    pub const NOT_SUPPORTED: Self = Self(-18);
    pub const INCOMPLETE: Self = Self(-19);

    /// Convert a raw return code into `Ok(())` or the error it names.
    pub fn check(code: i32) -> Result<(), Self> {
        if code == Self::SUCCESS.0 {
            Ok(())
        } else {
            Err(Self(code))
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::SUCCESS
    }
}

impl fmt::Display for VmbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", error_description(*self), self.0)
    }
}

/// Map a VimbaC error code to a human-readable description.
pub fn error_description(code: VmbError) -> &'static str {
    match code {
        VmbError::SUCCESS => "Success.",
        VmbError::INTERNAL_FAULT => "Unexpected fault in the API or driver.",
        VmbError::API_NOT_STARTED => "API not started.",
        VmbError::NOT_FOUND => "Not found.",
        VmbError::BAD_HANDLE => "Invalid handle.",
        VmbError::DEVICE_NOT_OPEN => "Device not open.",
        VmbError::INVALID_ACCESS => "Invalid access.",
        VmbError::BAD_PARAMETER => "Bad parameter.",
        VmbError::STRUCT_SIZE => "Wrong library version.",
        VmbError::MORE_DATA => "More data returned than memory provided.",
        VmbError::WRONG_TYPE => "Wrong type.",
        VmbError::INVALID_VALUE => "Invalid value.",
        VmbError::TIMEOUT => "Timeout.",
        VmbError::OTHER => "Unspecified error.",
        VmbError::RESOURCES => "Resource not available.",
        VmbError::INVALID_CALL => "Invalid call.",
        VmbError::NO_TL => "Transport layer not loaded.",
        VmbError::NOT_IMPLEMENTED => "Not implemented.",
        VmbError::NOT_SUPPORTED => "Not supported.",
        VmbError::INCOMPLETE => "Operation is not complete.",
        _ => "Undefined error code.",
    }
}

// --- Pixel formats (VmbPixelFormatType) ---

/// Monochrome, 8 bits per pixel.
pub const PIXEL_FORMAT_MONO8: u32 = 0x0108_0001;
/// RGB, 8 bits per channel.
pub const PIXEL_FORMAT_RGB8: u32 = 0x0218_0014;
/// BGR, 8 bits per channel.
pub const PIXEL_FORMAT_BGR8: u32 = 0x0218_0015;

// --- Frame receive status (VmbFrameStatusType) ---

pub const FRAME_STATUS_COMPLETE: i32 = 0;
pub const FRAME_STATUS_INCOMPLETE: i32 = -1;
pub const FRAME_STATUS_TOO_SMALL: i32 = -2;
pub const FRAME_STATUS_INVALID: i32 = -3;

// --- Access modes (VmbAccessModeType) ---

pub const ACCESS_MODE_FULL: u32 = 0x1;

/// Timeout for a single frame wait, in milliseconds.
pub const FRAME_WAIT_TIMEOUT_MS: u32 = 2000;

/// Read a null-terminated C string from a raw pointer.
///
/// Returns `None` for null pointers.
///
/// # Safety
///
/// `ptr` must be null or point to a valid null-terminated string that
/// outlives the call.
pub unsafe fn read_c_str(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(
        std::ffi::CStr::from_ptr(ptr)
            .to_string_lossy()
            .into_owned(),
    )
}
