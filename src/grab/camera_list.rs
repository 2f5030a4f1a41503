use serde::Serialize;

use crate::camera::backend::CameraBackend;
use crate::camera::error::{CameraError, Result};
use crate::camera::types::DeviceId;

/// Label used when a camera's name cannot be read.
pub const NO_NAME: &str = "[NoName]";

/// One listed camera.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CameraEntry {
    pub id: DeviceId,
    /// `"<name> <id>"`, shown to the user.
    pub label: String,
}

/// Result of a successful refresh.
#[derive(Debug, Default)]
pub struct RefreshReport {
    /// Cameras reported by the backend, including skipped ones.
    pub enumerated: usize,
    /// Why each skipped camera was left out.
    pub skipped: Vec<CameraError>,
}

/// Ordered list of connected cameras plus the user's selection.
#[derive(Debug, Default)]
pub struct CameraList {
    entries: Vec<CameraEntry>,
    selected: Option<usize>,
}

impl CameraList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the list from the backend.
    ///
    /// Cameras whose ID cannot be read are skipped; a missing name becomes
    /// `[NoName]`. The selection follows its camera if it is still listed,
    /// otherwise the first camera is selected. If enumeration itself fails
    /// the list is left empty.
    pub fn refresh<B: CameraBackend + ?Sized>(&mut self, backend: &B) -> Result<RefreshReport> {
        let previous = self.selected_id().cloned();
        self.entries.clear();
        self.selected = None;

        let handles = backend.camera_list()?;
        let mut report = RefreshReport {
            enumerated: handles.len(),
            skipped: Vec::new(),
        };

        for handle in handles {
            let id = match backend.camera_id(handle) {
                Ok(id) => id,
                Err(e) => {
                    report.skipped.push(e);
                    continue;
                }
            };
            let name = backend.camera_name(handle).unwrap_or_else(|e| {
                tracing::debug!("No name for camera {id}: {e}");
                NO_NAME.to_string()
            });
            self.entries.push(CameraEntry {
                label: format!("{name} {id}"),
                id,
            });
        }

        self.selected = previous
            .and_then(|id| self.position(&id))
            .or_else(|| (!self.entries.is_empty()).then_some(0));

        Ok(report)
    }

    fn position(&self, id: &DeviceId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.id == id)
    }

    /// Select by list index. Returns false if out of range.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.entries.len() {
            self.selected = Some(index);
            true
        } else {
            false
        }
    }

    /// Select by camera ID. Returns false if not listed.
    pub fn select_id(&mut self, id: &DeviceId) -> bool {
        match self.position(id) {
            Some(index) => {
                self.selected = Some(index);
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&CameraEntry> {
        self.selected.and_then(|i| self.entries.get(i))
    }

    pub fn selected_id(&self) -> Option<&DeviceId> {
        self.selected().map(|entry| &entry.id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn entries(&self) -> &[CameraEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
