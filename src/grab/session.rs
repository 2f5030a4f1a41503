use crate::camera::backend::CameraBackend;
use crate::camera::error::Result;

/// Exclusive owner of a camera backend.
///
/// The backend is shut down exactly once when the session is dropped,
/// whatever path leads there.
pub struct ApiSession<B: CameraBackend> {
    backend: B,
}

impl<B: CameraBackend> ApiSession<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Start the camera API.
    pub fn startup(&self) -> Result<()> {
        self.backend.startup()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: CameraBackend> Drop for ApiSession<B> {
    fn drop(&mut self) {
        tracing::debug!("Shutting down camera API");
        self.backend.shutdown();
    }
}
