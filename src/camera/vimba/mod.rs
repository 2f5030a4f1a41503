// VimbaC bindings. Types are always available; the FFI needs the `vimba` feature.

#[cfg(feature = "vimba")]
pub mod ffi;
#[cfg(feature = "vimba")]
pub mod sdk;
pub mod types;

#[cfg(feature = "vimba")]
pub use sdk::VimbaSdk;
