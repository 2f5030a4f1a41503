use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};

use crate::camera::backend::CameraBackend;
use crate::camera::error::Result;
use crate::camera::types::HotplugEvent;

/// Hands hot-plug events from the backend's notification thread to the
/// thread that owns the camera list.
///
/// The backend callback only enqueues; the owner drains with `drain()` on
/// its own schedule.
pub struct HotplugQueue {
    tx: UnboundedSender<HotplugEvent>,
    rx: UnboundedReceiver<HotplugEvent>,
}

impl HotplugQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A callback suitable for `CameraBackend::watch_hotplug`.
    pub fn callback(&self) -> Box<dyn Fn(HotplugEvent) + Send> {
        let tx = self.tx.clone();
        Box::new(move |event: HotplugEvent| {
            if let Err(e) = tx.send(event) {
                tracing::warn!("Dropped hotplug event, receiver gone: {:?}", e.0);
            }
        })
    }

    /// Take every event queued so far, oldest first. Never blocks.
    pub fn drain(&mut self) -> Vec<HotplugEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

impl Default for HotplugQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Subscribe `queue` to the backend's hot-plug notifications.
pub fn start_hotplug_watcher<B: CameraBackend + ?Sized>(
    backend: &B,
    queue: &HotplugQueue,
) -> Result<()> {
    backend.watch_hotplug(queue.callback())
}
