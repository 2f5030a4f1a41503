//! Synchronous single-frame acquisition.
//!
//! `SyncGrab` owns everything the user sees: the camera list, the log and
//! the last displayed image. It runs on one thread; the only cross-thread
//! input is the hot-plug queue, which it drains on request.

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::hotplug_bridge::{start_hotplug_watcher, HotplugQueue};
use crate::camera::types::{DeviceId, Frame, FrameStatus, HotplugEvent, PixelFormat};
use crate::camera::vimba::types::VmbError;
use crate::grab::camera_list::{CameraList, RefreshReport};
use crate::grab::convert::mono_to_bgr;
use crate::grab::image::{copy_to_image, DisplayImage};
use crate::grab::log::LogSink;
use crate::grab::session::ApiSession;

pub const OP_STARTUP: &str = "Starting Vimba";
pub const OP_ACQUIRE: &str = "Acquire single image";
pub const MSG_SELECT_CAMERA: &str = "Please select a camera.";
pub const MSG_PLUGGED_IN: &str = "Camera list changed. A new camera was discovered by Vimba.";
pub const MSG_PLUGGED_OUT: &str = "Camera list changed. A camera was disconnected from Vimba.";

/// Acquisition state. Always `Idle` between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Idle,
    Acquiring,
}

/// What an acquire request ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// A new image is on display.
    Displayed { width: u32, height: u32 },
    /// No camera was selected; nothing was attempted.
    NoSelection,
    /// The acquisition failed; the display is unchanged.
    Failed(CameraError),
}

pub struct SyncGrab<B: CameraBackend> {
    session: ApiSession<B>,
    cameras: CameraList,
    log: LogSink,
    image: Option<DisplayImage>,
    hotplug: HotplugQueue,
    state: AcquisitionState,
    preferred: Option<DeviceId>,
}

impl<B: CameraBackend> SyncGrab<B> {
    pub fn new(backend: B, log_capacity: usize) -> Self {
        Self {
            session: ApiSession::new(backend),
            cameras: CameraList::new(),
            log: LogSink::new(log_capacity),
            image: None,
            hotplug: HotplugQueue::new(),
            state: AcquisitionState::Idle,
            preferred: None,
        }
    }

    /// Camera to select after the startup refresh, if it is connected.
    pub fn with_preferred_camera(mut self, id: Option<DeviceId>) -> Self {
        self.preferred = id;
        self
    }

    /// Start the camera API, list cameras and subscribe to hot-plug events.
    ///
    /// A startup failure is logged and returned; nothing else is attempted.
    pub fn start_up(&mut self) -> Result<()> {
        let started = self.session.startup();
        self.log_result(OP_STARTUP, started.as_ref().err());
        started?;

        tracing::info!("Camera API version {}", self.session.backend().version());

        self.refresh_cameras();
        self.log.info(format!("Cameras found...{}", self.cameras.len()));

        if let Some(id) = self.preferred.take() {
            if !self.cameras.select_id(&id) {
                tracing::info!("Preferred camera {id} is not connected");
            }
        }

        if let Err(e) = start_hotplug_watcher(self.session.backend(), &self.hotplug) {
            self.log_result("Registering camera observer", Some(&e));
        }
        Ok(())
    }

    /// Acquire one frame from the selected camera and display it.
    pub fn acquire(&mut self) -> AcquireOutcome {
        let Some(id) = self.cameras.selected_id().cloned() else {
            self.log.info(MSG_SELECT_CAMERA);
            return AcquireOutcome::NoSelection;
        };

        self.state = AcquisitionState::Acquiring;
        let result = self
            .session
            .backend()
            .acquire_single_image(&id)
            .and_then(|frame| self.display(&frame));
        self.state = AcquisitionState::Idle;

        self.log_result(OP_ACQUIRE, result.as_ref().err());
        match result {
            Ok((width, height)) => AcquireOutcome::Displayed { width, height },
            Err(e) => AcquireOutcome::Failed(e),
        }
    }

    /// Check, convert and copy a frame into a fresh display image.
    fn display(&mut self, frame: &Frame) -> Result<(u32, u32)> {
        if frame.status() != FrameStatus::Complete {
            return Err(CameraError::IncompleteFrame(frame.status()));
        }

        let format = frame.pixel_format();
        let bytes_per_pixel = format
            .bytes_per_pixel()
            .ok_or(CameraError::UnsupportedPixelFormat(format))?;
        let (width, height) = (frame.width(), frame.height());
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
            .ok_or(CameraError::BufferSize {
                expected: usize::MAX,
                actual: frame.size(),
            })?;
        if frame.size() < expected {
            return Err(CameraError::BufferSize {
                expected,
                actual: frame.size(),
            });
        }

        let pixels = &frame.buffer()[..expected];
        let expanded;
        let bgr = match format {
            PixelFormat::Mono8 => {
                expanded = mono_to_bgr(pixels);
                &expanded[..]
            }
            _ => pixels,
        };

        // Drop the previous image before allocating the new one.
        self.image = None;
        let mut image = DisplayImage::new(width, height);
        copy_to_image(bgr, Some(&mut image));
        self.image = Some(image);
        Ok((width, height))
    }

    /// Handle every hot-plug event queued since the last call.
    ///
    /// Returns whether the camera list was rebuilt.
    pub fn process_hotplug_events(&mut self) -> bool {
        let mut changed = false;
        for event in self.hotplug.drain() {
            match event {
                HotplugEvent::PluggedIn(_) => {
                    self.log.info(MSG_PLUGGED_IN);
                    changed = true;
                }
                HotplugEvent::PluggedOut(_) => {
                    self.log.info(MSG_PLUGGED_OUT);
                    changed = true;
                }
                HotplugEvent::OpenStateChanged(id) => {
                    tracing::debug!("Ignoring open state change of {id}");
                }
            }
        }
        if changed {
            self.refresh_cameras();
        }
        changed
    }

    /// Rebuild the camera list, logging skipped cameras and failures.
    pub fn refresh_cameras(&mut self) -> Option<RefreshReport> {
        match self.cameras.refresh(self.session.backend()) {
            Ok(report) => {
                for error in &report.skipped {
                    let message = self.session.backend().error_to_message(error.code());
                    self.log.warn(format!("Skipping camera without ID...{message}"));
                }
                Some(report)
            }
            Err(e) => {
                self.log_result("Listing cameras", Some(&e));
                None
            }
        }
    }

    /// Log `"<operation>...<message>"` for a result.
    fn log_result(&mut self, operation: &str, error: Option<&CameraError>) {
        let code = error.map_or(VmbError::SUCCESS, CameraError::code);
        let message = self.session.backend().error_to_message(code);
        match error {
            None => self.log.result(operation, &message, true),
            Some(e) => {
                tracing::debug!("{operation} failed: {e}");
                self.log.result(operation, &message, false);
            }
        }
    }

    pub fn cameras(&self) -> &CameraList {
        &self.cameras
    }

    pub fn cameras_mut(&mut self) -> &mut CameraList {
        &mut self.cameras
    }

    pub fn log(&self) -> &LogSink {
        &self.log
    }

    pub fn image(&self) -> Option<&DisplayImage> {
        self.image.as_ref()
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn backend(&self) -> &B {
        self.session.backend()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::mock::MockBackend;
    use std::sync::Arc;

    fn grab_with(backend: MockBackend) -> (SyncGrab<Arc<MockBackend>>, Arc<MockBackend>) {
        let backend = Arc::new(backend);
        let grab = SyncGrab::new(Arc::clone(&backend), 64);
        (grab, backend)
    }

    fn started(backend: MockBackend) -> (SyncGrab<Arc<MockBackend>>, Arc<MockBackend>) {
        let (mut grab, backend) = grab_with(backend);
        grab.start_up().unwrap();
        (grab, backend)
    }

    fn lines(grab: &SyncGrab<Arc<MockBackend>>) -> Vec<String> {
        grab.log().entries().map(str::to_string).collect()
    }

    #[test]
    fn start_up_logs_startup_and_camera_count() {
        let (grab, backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_camera("B", "DEV_B"),
        );

        assert_eq!(
            lines(&grab),
            vec!["Cameras found...2", "Starting Vimba...Success."]
        );
        assert_eq!(grab.cameras().selected_index(), Some(0));
        assert!(backend.has_hotplug_callback());
    }

    #[test]
    fn failed_start_up_logs_and_stops() {
        let (mut grab, backend) = grab_with(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_error("startup", CameraError::Startup(VmbError::NO_TL)),
        );

        assert_eq!(grab.start_up(), Err(CameraError::Startup(VmbError::NO_TL)));
        assert_eq!(lines(&grab), vec!["Starting Vimba...Transport layer not loaded."]);
        assert!(grab.cameras().is_empty());
        assert!(!backend.has_hotplug_callback());
    }

    #[test]
    fn hotplug_registration_failure_is_logged_not_fatal() {
        let (mut grab, _backend) = grab_with(
            MockBackend::new()
                .with_error("watch_hotplug", CameraError::Hotplug("no thread".into())),
        );

        assert!(grab.start_up().is_ok());
        assert_eq!(
            grab.log().latest(),
            Some("Registering camera observer...Unspecified error.")
        );
    }

    #[test]
    fn preferred_camera_is_selected_at_start_up() {
        let backend = Arc::new(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_camera("B", "DEV_B"),
        );
        let mut grab = SyncGrab::new(Arc::clone(&backend), 16)
            .with_preferred_camera(Some(DeviceId::new("DEV_B")));
        grab.start_up().unwrap();

        assert_eq!(grab.cameras().selected_id(), Some(&DeviceId::new("DEV_B")));
    }

    #[test]
    fn skipped_camera_is_logged() {
        let (grab, _backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_raw_camera(Some("B"), None),
        );

        assert!(lines(&grab).contains(&"Skipping camera without ID...Not found.".to_string()));
        assert_eq!(grab.cameras().len(), 1);
    }

    #[test]
    fn no_selection_logs_one_guidance_line() {
        let (mut grab, backend) = started(MockBackend::new());
        let before = grab.log().len();

        assert_eq!(grab.acquire(), AcquireOutcome::NoSelection);

        assert_eq!(grab.log().len(), before + 1);
        assert_eq!(grab.log().latest(), Some(MSG_SELECT_CAMERA));
        assert_eq!(grab.state(), AcquisitionState::Idle);
        assert_eq!(backend.acquire_calls(), 0);
    }

    #[test]
    fn mono_frame_is_expanded_and_displayed() {
        let (mut grab, _backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_mono_frame(2, 2, 7),
        );

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Displayed {
                width: 2,
                height: 2
            }
        );
        assert_eq!(grab.log().latest(), Some("Acquire single image...Success."));

        let image = grab.image().unwrap();
        assert_eq!((image.width(), image.height()), (2, 2));
        assert_eq!(image.row(0), Some(&[7u8; 6][..]));
        assert_eq!(image.row(1), Some(&[7u8; 6][..]));
        assert_eq!(grab.state(), AcquisitionState::Idle);
    }

    #[test]
    fn bgr_frame_is_copied_as_is() {
        let data: Vec<u8> = (0..6).collect();
        let frame = Frame::new(data, 2, 1, PixelFormat::Bgr8, FrameStatus::Complete);
        let (mut grab, _backend) =
            started(MockBackend::new().with_camera("A", "DEV_A").with_frame(frame));

        assert!(matches!(grab.acquire(), AcquireOutcome::Displayed { .. }));
        assert_eq!(grab.image().unwrap().row(0), Some(&[0u8, 1, 2, 3, 4, 5][..]));
    }

    #[test]
    fn incomplete_frame_fails_without_display_update() {
        let frame = Frame::new(vec![0; 4], 2, 2, PixelFormat::Mono8, FrameStatus::Incomplete);
        let (mut grab, _backend) =
            started(MockBackend::new().with_camera("A", "DEV_A").with_frame(frame));

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Failed(CameraError::IncompleteFrame(FrameStatus::Incomplete))
        );
        assert!(grab.image().is_none());
        assert_eq!(
            grab.log().latest(),
            Some("Acquire single image...Unspecified error.")
        );
        assert_eq!(grab.state(), AcquisitionState::Idle);
    }

    #[test]
    fn failure_keeps_previous_image() {
        let bad = Frame::new(vec![0; 4], 2, 2, PixelFormat::Mono8, FrameStatus::Invalid);
        let (mut grab, _backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_mono_frame(1, 1, 5)
                .with_frame(bad),
        );

        grab.acquire();
        let before = grab.image().cloned();
        assert!(matches!(grab.acquire(), AcquireOutcome::Failed(_)));
        assert_eq!(grab.image().cloned(), before);
    }

    #[test]
    fn unsupported_format_fails() {
        let format = PixelFormat::Other(0x0218_0014);
        let frame = Frame::new(vec![0; 6], 2, 1, format, FrameStatus::Complete);
        let (mut grab, _backend) =
            started(MockBackend::new().with_camera("A", "DEV_A").with_frame(frame));

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Failed(CameraError::UnsupportedPixelFormat(format))
        );
        assert!(grab.image().is_none());
        assert_eq!(grab.log().latest(), Some("Acquire single image...Not supported."));
    }

    #[test]
    fn short_buffer_fails() {
        let frame = Frame::new(vec![0; 3], 2, 2, PixelFormat::Mono8, FrameStatus::Complete);
        let (mut grab, _backend) =
            started(MockBackend::new().with_camera("A", "DEV_A").with_frame(frame));

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Failed(CameraError::BufferSize {
                expected: 4,
                actual: 3
            })
        );
        assert!(grab.image().is_none());
    }

    #[test]
    fn oversized_dimensions_fail_without_panic() {
        let frame = Frame::new(
            vec![0; 16],
            u32::MAX,
            u32::MAX,
            PixelFormat::Bgr8,
            FrameStatus::Complete,
        );
        let (mut grab, _backend) =
            started(MockBackend::new().with_camera("A", "DEV_A").with_frame(frame));

        assert!(matches!(
            grab.acquire(),
            AcquireOutcome::Failed(CameraError::BufferSize { actual: 16, .. })
        ));
        assert!(grab.image().is_none());
        assert_eq!(grab.state(), AcquisitionState::Idle);
    }

    #[test]
    fn second_acquisition_resizes_the_image() {
        let (mut grab, _backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_mono_frame(2, 2, 1)
                .with_mono_frame(3, 1, 9),
        );

        grab.acquire();
        assert_eq!(grab.image().map(|i| (i.width(), i.height())), Some((2, 2)));

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Displayed {
                width: 3,
                height: 1
            }
        );
        let image = grab.image().unwrap();
        assert_eq!((image.width(), image.height()), (3, 1));
        assert_eq!(image.row(0), Some(&[9u8; 9][..]));
        assert_eq!(image.row(1), None);
    }

    #[test]
    fn hotplug_messages_name_the_camera_api() {
        assert_eq!(
            MSG_PLUGGED_IN,
            "Camera list changed. A new camera was discovered by Vimba."
        );
        assert_eq!(
            MSG_PLUGGED_OUT,
            "Camera list changed. A camera was disconnected from Vimba."
        );
    }

    #[test]
    fn backend_error_is_logged_and_returned() {
        let (mut grab, _backend) = started(MockBackend::new().with_camera("A", "DEV_A"));

        assert_eq!(
            grab.acquire(),
            AcquireOutcome::Failed(CameraError::Sdk(VmbError::TIMEOUT))
        );
        assert_eq!(grab.log().latest(), Some("Acquire single image...Timeout."));
    }

    #[test]
    fn hotplug_events_refresh_list_once() {
        let (mut grab, backend) = started(MockBackend::new());
        assert!(grab.cameras().is_empty());

        backend.plug_in("A", "DEV_A");
        backend.plug_in("B", "DEV_B");
        assert!(grab.process_hotplug_events());

        assert_eq!(grab.cameras().len(), 2);
        assert_eq!(grab.cameras().selected_index(), Some(0));
        let entries = lines(&grab);
        assert_eq!(&entries[..2], &[MSG_PLUGGED_IN, MSG_PLUGGED_IN]);

        backend.unplug("DEV_A");
        assert!(grab.process_hotplug_events());
        assert_eq!(grab.log().latest(), Some(MSG_PLUGGED_OUT));
        assert_eq!(grab.cameras().len(), 1);
    }

    #[test]
    fn open_state_change_is_ignored() {
        let (mut grab, backend) = started(MockBackend::new().with_camera("A", "DEV_A"));
        let before = grab.log().len();

        backend.fire_hotplug(HotplugEvent::OpenStateChanged(DeviceId::new("DEV_A")));

        assert!(!grab.process_hotplug_events());
        assert_eq!(grab.log().len(), before);
    }

    #[test]
    fn enumeration_failure_during_refresh_is_logged() {
        let (mut grab, _backend) = started(
            MockBackend::new()
                .with_camera("A", "DEV_A")
                .with_error("camera_list", CameraError::Sdk(VmbError::INTERNAL_FAULT)),
        );

        assert!(grab.cameras().is_empty());
        assert_eq!(
            lines(&grab)[..2],
            ["Cameras found...0", "Listing cameras...Unexpected fault in the API or driver."]
        );
        assert!(grab.refresh_cameras().is_some());
        assert_eq!(grab.cameras().len(), 1);
    }

    #[test]
    fn drop_shuts_backend_down() {
        let (grab, backend) = started(MockBackend::new());
        drop(grab);
        assert_eq!(backend.shutdown_calls(), 1);
    }
}
