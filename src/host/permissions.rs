//! Persistent access rights.
//!
//! Granted device ids and volume handles are kept in a small JSON file in the
//! settings directory so that they survive restarts.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::volume::{DeviceId, VolumeHandle};

const PERMISSIONS_VERSION: u32 = 1;

/// On-disk layout of the permission file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PermissionRecord {
    /// Version of the file format
    version: u32,
    /// Devices the user allowed access to
    #[serde(default)]
    granted_devices: BTreeSet<DeviceId>,
    /// Persisted volume handles, most recent last
    #[serde(default)]
    handles: Vec<VolumeHandle>,
}

impl Default for PermissionRecord {
    fn default() -> Self {
        Self {
            version: PERMISSIONS_VERSION,
            granted_devices: BTreeSet::new(),
            handles: Vec::new(),
        }
    }
}

/// Permission store backed by a JSON file.
#[derive(Debug)]
pub struct PermissionFile {
    path: PathBuf,
    record: PermissionRecord,
}

impl PermissionFile {
    /// Load the file at `path`. A missing, unreadable or outdated file starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let record = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<PermissionRecord>(&content) {
                Ok(record) if record.version == PERMISSIONS_VERSION => record,
                Ok(record) => {
                    warn!(version = record.version, "ignoring permission file of another version");
                    PermissionRecord::default()
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "corrupt permission file, starting empty");
                    PermissionRecord::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => PermissionRecord::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read permission file");
                PermissionRecord::default()
            }
        };

        Self { path, record }
    }

    pub fn is_granted(&self, device: &DeviceId) -> bool {
        self.record.granted_devices.contains(device)
    }

    pub fn set_granted(&mut self, device: &DeviceId, granted: bool) -> io::Result<()> {
        let changed = if granted {
            self.record.granted_devices.insert(device.clone())
        } else {
            self.record.granted_devices.remove(device)
        };
        if changed {
            self.save()?;
        }
        Ok(())
    }

    /// Remember `handle`, moving it to the most recent position.
    pub fn take(&mut self, handle: &VolumeHandle) -> io::Result<()> {
        self.record.handles.retain(|h| h != handle);
        self.record.handles.push(handle.clone());
        self.save()
    }

    pub fn release(&mut self, handle: &VolumeHandle) -> io::Result<()> {
        let before = self.record.handles.len();
        self.record.handles.retain(|h| h != handle);
        if self.record.handles.len() != before {
            self.save()?;
        }
        Ok(())
    }

    pub fn handles(&self) -> &[VolumeHandle] {
        &self.record.handles
    }

    fn save(&self) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.record)?;
        fs::write(&self.path, content)
    }
}
