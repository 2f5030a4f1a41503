//! Hot-plug detection via periodic re-enumeration.
//!
//! For camera APIs without a usable push notification we poll the camera
//! list at a fixed interval and diff the identifiers. The poll thread waits
//! on a condition variable, so `stop()` returns without waiting out the
//! interval.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::camera::error::{CameraError, Result};
use crate::camera::types::{DeviceId, HotplugEvent};

/// Shortest interval between two re-enumerations.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Stop flag shared with the poll thread.
#[derive(Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    fn raise(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }

    fn is_raised(&self) -> bool {
        *self.stopped.lock()
    }

    /// Sleep for `interval` unless stopped first. Returns true when stopped.
    fn wait(&self, interval: Duration) -> bool {
        let mut stopped = self.stopped.lock();
        if !*stopped {
            self.wake.wait_for(&mut stopped, interval);
        }
        *stopped
    }
}

/// Polling hot-plug watcher. Stops on `stop()` or when dropped.
pub struct HotplugWatcher {
    signal: Arc<StopSignal>,
    thread: Option<JoinHandle<()>>,
}

impl HotplugWatcher {
    /// Start polling `enumerate` every `interval`, at least `MIN_POLL_INTERVAL`.
    ///
    /// Cameras present at start are treated as known and fire no events.
    pub fn start<F>(
        enumerate: F,
        callback: Box<dyn Fn(HotplugEvent) + Send>,
        interval: Duration,
    ) -> Result<Self>
    where
        F: Fn() -> Result<Vec<DeviceId>> + Send + 'static,
    {
        let interval = interval.max(MIN_POLL_INTERVAL);
        let signal = Arc::new(StopSignal::default());
        let thread_signal = Arc::clone(&signal);

        let thread = std::thread::Builder::new()
            .name("camera-hotplug".to_string())
            .spawn(move || {
                let mut known = enumerate().unwrap_or_default();
                while !thread_signal.wait(interval) {
                    match enumerate() {
                        Ok(current) => {
                            for event in diff(&known, &current) {
                                callback(event);
                            }
                            known = current;
                        }
                        Err(e) => tracing::debug!("hotplug re-enumeration failed: {e}"),
                    }
                }
            })
            .map_err(|e| CameraError::Hotplug(format!("failed to spawn hotplug thread: {e}")))?;

        Ok(Self {
            signal,
            thread: Some(thread),
        })
    }

    pub fn is_running(&self) -> bool {
        !self.signal.is_raised()
    }

    /// Stop the watcher and wait for its thread.
    pub fn stop(&mut self) {
        self.signal.raise();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                tracing::warn!("hotplug thread panicked");
            }
        }
    }
}

impl Drop for HotplugWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Events turning `known` into `current`: arrivals first, then departures.
fn diff(known: &[DeviceId], current: &[DeviceId]) -> Vec<HotplugEvent> {
    let known_set: HashSet<&DeviceId> = known.iter().collect();
    let current_set: HashSet<&DeviceId> = current.iter().collect();

    let arrived = current
        .iter()
        .filter(|id| !known_set.contains(id))
        .inspect(|id| tracing::info!("camera plugged in: {id}"))
        .map(|id| HotplugEvent::PluggedIn(id.clone()));
    let departed = known
        .iter()
        .filter(|id| !current_set.contains(id))
        .inspect(|id| tracing::info!("camera plugged out: {id}"))
        .map(|id| HotplugEvent::PluggedOut(id.clone()));

    arrived.chain(departed).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn ids(raw: &[&str]) -> Vec<DeviceId> {
        raw.iter().map(|id| DeviceId::new(*id)).collect()
    }

    #[test]
    fn diff_reports_arrivals_then_departures() {
        let events = diff(&ids(&["a", "b"]), &ids(&["b", "c", "d"]));
        assert_eq!(
            events,
            vec![
                HotplugEvent::PluggedIn(DeviceId::new("c")),
                HotplugEvent::PluggedIn(DeviceId::new("d")),
                HotplugEvent::PluggedOut(DeviceId::new("a")),
            ]
        );
    }

    #[test]
    fn diff_of_equal_lists_is_empty() {
        assert!(diff(&ids(&["a", "b"]), &ids(&["b", "a"])).is_empty());
    }

    type Recorded = Arc<Mutex<Vec<HotplugEvent>>>;

    fn recorder() -> (Recorded, Box<dyn Fn(HotplugEvent) + Send>) {
        let events: Recorded = Arc::default();
        let sink = Arc::clone(&events);
        (events, Box::new(move |event| sink.lock().push(event)))
    }

    #[test]
    fn watcher_reports_changes_but_not_initial_cameras() {
        let connected = Arc::new(Mutex::new(ids(&["cam-1"])));
        let source = Arc::clone(&connected);
        let (events, callback) = recorder();

        let mut watcher = HotplugWatcher::start(
            move || Ok(source.lock().clone()),
            callback,
            MIN_POLL_INTERVAL,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(150));
        assert!(events.lock().is_empty());

        connected.lock().push(DeviceId::new("cam-2"));
        std::thread::sleep(Duration::from_millis(150));
        connected.lock().retain(|id| id.as_str() != "cam-1");
        std::thread::sleep(Duration::from_millis(150));
        watcher.stop();

        assert_eq!(
            *events.lock(),
            vec![
                HotplugEvent::PluggedIn(DeviceId::new("cam-2")),
                HotplugEvent::PluggedOut(DeviceId::new("cam-1")),
            ]
        );
    }

    #[test]
    fn watcher_keeps_polling_after_enumeration_errors() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);
        let (events, callback) = recorder();

        let mut watcher = HotplugWatcher::start(
            move || {
                *counter.lock() += 1;
                Err(CameraError::Sdk(crate::camera::vimba::types::VmbError::OTHER))
            },
            callback,
            MIN_POLL_INTERVAL,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        watcher.stop();

        assert!(*calls.lock() > 1);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn zero_interval_is_clamped() {
        let calls = Arc::new(Mutex::new(0u32));
        let counter = Arc::clone(&calls);

        let mut watcher = HotplugWatcher::start(
            move || {
                *counter.lock() += 1;
                Ok(Vec::new())
            },
            Box::new(|_| {}),
            Duration::ZERO,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(200));
        watcher.stop();

        // One initial enumeration plus at most one per elapsed minimum interval.
        let calls = *calls.lock();
        assert!(calls >= 1);
        assert!(calls <= 6, "polled {calls} times in 200ms");
    }

    #[test]
    fn stop_does_not_wait_for_the_interval() {
        let mut watcher = HotplugWatcher::start(
            || Ok(Vec::new()),
            Box::new(|_| {}),
            Duration::from_secs(60),
        )
        .unwrap();
        assert!(watcher.is_running());

        let started = Instant::now();
        watcher.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!watcher.is_running());
    }

    #[test]
    fn drop_stops_the_watcher() {
        let watcher = HotplugWatcher::start(
            || Ok(Vec::new()),
            Box::new(|_| {}),
            Duration::from_millis(10),
        )
        .unwrap();
        drop(watcher);
    }
}
