use thiserror::Error;

use crate::camera::types::{FrameStatus, PixelFormat};
use crate::camera::vimba::types::VmbError;

/// Camera subsystem errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraError {
    #[error("API startup failed: {0}")]
    Startup(VmbError),

    #[error("camera API call failed: {0}")]
    Sdk(VmbError),

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("frame not complete: {0:?}")]
    IncompleteFrame(FrameStatus),

    #[error("unsupported pixel format: {0}")]
    UnsupportedPixelFormat(PixelFormat),

    #[error("frame buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("hotplug registration failed: {0}")]
    Hotplug(String),
}

impl CameraError {
    /// Vendor error code used when translating this error for the log sink.
    ///
    /// Incomplete frames collapse to the generic `OTHER` code.
    pub fn code(&self) -> VmbError {
        match self {
            Self::Startup(code) | Self::Sdk(code) => *code,
            Self::DeviceNotFound(_) => VmbError::NOT_FOUND,
            Self::IncompleteFrame(_) | Self::Hotplug(_) => VmbError::OTHER,
            Self::UnsupportedPixelFormat(_) => VmbError::NOT_SUPPORTED,
            Self::BufferSize { .. } => VmbError::INVALID_VALUE,
        }
    }
}

impl From<VmbError> for CameraError {
    fn from(code: VmbError) -> Self {
        Self::Sdk(code)
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, CameraError>;
