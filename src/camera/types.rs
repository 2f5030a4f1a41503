use serde::Serialize;
use std::fmt;

use crate::camera::vimba::types::{
    FRAME_STATUS_COMPLETE, FRAME_STATUS_INCOMPLETE, FRAME_STATUS_INVALID, FRAME_STATUS_TOO_SMALL,
    PIXEL_FORMAT_BGR8, PIXEL_FORMAT_MONO8,
};

/// Opaque camera identifier as reported by the camera API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DeviceId(String);

impl DeviceId {
    /// Create a new `DeviceId` from a raw string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the inner string representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque camera handle used across the backend boundary.
///
/// Indexes into the backend's most recent `camera_list()` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CameraHandle(pub usize);

/// Pixel encoding of an acquired frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PixelFormat {
    /// Single 8-bit luminance channel.
    Mono8,
    /// Three 8-bit channels, blue first.
    Bgr8,
    /// Any other vendor pixel format code.
    Other(u32),
}

impl PixelFormat {
    /// Map a vendor pixel format code.
    pub fn from_raw(code: u32) -> Self {
        match code {
            PIXEL_FORMAT_MONO8 => Self::Mono8,
            PIXEL_FORMAT_BGR8 => Self::Bgr8,
            other => Self::Other(other),
        }
    }

    /// The vendor pixel format code.
    pub fn raw(self) -> u32 {
        match self {
            Self::Mono8 => PIXEL_FORMAT_MONO8,
            Self::Bgr8 => PIXEL_FORMAT_BGR8,
            Self::Other(code) => code,
        }
    }

    /// Bytes per pixel for the displayable formats.
    pub fn bytes_per_pixel(self) -> Option<usize> {
        match self {
            Self::Mono8 => Some(1),
            Self::Bgr8 => Some(3),
            Self::Other(_) => None,
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mono8 => write!(f, "Mono8"),
            Self::Bgr8 => write!(f, "BGR8"),
            Self::Other(code) => write!(f, "0x{code:08X}"),
        }
    }
}

/// Receive status of an acquired frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameStatus {
    Complete,
    Incomplete,
    TooSmall,
    Invalid,
    Other(i32),
}

impl FrameStatus {
    /// Map a vendor receive status code.
    pub fn from_raw(code: i32) -> Self {
        match code {
            FRAME_STATUS_COMPLETE => Self::Complete,
            FRAME_STATUS_INCOMPLETE => Self::Incomplete,
            FRAME_STATUS_TOO_SMALL => Self::TooSmall,
            FRAME_STATUS_INVALID => Self::Invalid,
            other => Self::Other(other),
        }
    }
}

/// A single acquired frame.
///
/// Owned by whoever called `acquire_single_image`; dropping it releases it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    status: FrameStatus,
}

impl Frame {
    /// Create a frame from raw pixel bytes and metadata.
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        pixel_format: PixelFormat,
        status: FrameStatus,
    ) -> Self {
        Self {
            data,
            width,
            height,
            pixel_format,
            status,
        }
    }

    pub fn status(&self) -> FrameStatus {
        self.status
    }

    /// Pixel bytes, `size()` long.
    pub fn buffer(&self) -> &[u8] {
        &self.data
    }

    /// Image size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.pixel_format
    }
}

/// Camera connection change reported by the camera API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "id", rename_all = "camelCase")]
pub enum HotplugEvent {
    PluggedIn(DeviceId),
    PluggedOut(DeviceId),
    /// Another process opened or closed the camera. Does not change the list.
    OpenStateChanged(DeviceId),
}
