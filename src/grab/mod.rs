// Single-frame grab pipeline: list, acquire, convert, display, log.

pub mod camera_list;
pub mod convert;
pub mod handler;
pub mod image;
pub mod log;
pub mod session;
