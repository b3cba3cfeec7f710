//! In-memory host used by the session and controller tests.
//!
//! Directory operations go to the real filesystem (tests point handles at a
//! `TempDir`); everything else is scripted and counted.

use std::cell::Cell;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{
    DeviceAccess, DeviceId, DirectoryProvider, PermissionStore, PlatformError, RemovableVolume,
    VolumeHandle, VolumeManager,
};
use crate::storage::{BlockStats, StatProvider};

pub struct FakeHost {
    pub devices: Vec<DeviceId>,
    pub granted: HashSet<DeviceId>,
    pub volumes: Vec<RemovableVolume>,
    pub persisted: Vec<VolumeHandle>,
    pub stats: BlockStats,
    pub fail_stat: bool,
    pub fail_unmount: bool,

    pub permission_requests: usize,
    pub create_calls: usize,
    pub unmount_calls: usize,
    pub unmounted: Vec<RemovableVolume>,
    pub stat_calls: Cell<usize>,
    pub find_calls: Cell<usize>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            granted: HashSet::new(),
            volumes: Vec::new(),
            persisted: Vec::new(),
            stats: BlockStats {
                total_blocks: 1000,
                available_blocks: 400,
                block_size: 4096,
            },
            fail_stat: false,
            fail_unmount: false,
            permission_requests: 0,
            create_calls: 0,
            unmount_calls: 0,
            unmounted: Vec::new(),
            stat_calls: Cell::new(0),
            find_calls: Cell::new(0),
        }
    }

    pub fn attach(&mut self, device: &str) {
        self.devices.push(DeviceId::new(device));
    }

    /// Attach `device` and report it mounted at `mount_point`.
    pub fn mount(&mut self, device: &str, mount_point: &Path) {
        self.attach(device);
        self.volumes.push(RemovableVolume {
            device: DeviceId::new(device),
            name: device.to_string(),
            mount_point: mount_point.to_path_buf(),
        });
    }
}

impl StatProvider for FakeHost {
    fn stat(&self, _path: &Path) -> io::Result<BlockStats> {
        self.stat_calls.set(self.stat_calls.get() + 1);
        if self.fail_stat {
            Err(io::Error::new(io::ErrorKind::Other, "stat failed"))
        } else {
            Ok(self.stats)
        }
    }
}

impl DirectoryProvider for FakeHost {
    fn find_child(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        self.find_calls.set(self.find_calls.get() + 1);
        let child = dir.join(name);
        child.exists().then_some(child)
    }

    fn create_child(&mut self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        self.create_calls += 1;
        let child = dir.join(name);
        fs::create_dir(&child)?;
        Ok(child)
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

impl DeviceAccess for FakeHost {
    fn attached_devices(&self) -> Vec<DeviceId> {
        self.devices.clone()
    }

    fn has_permission(&self, device: &DeviceId) -> bool {
        self.granted.contains(device)
    }

    fn request_permission(&mut self, _device: &DeviceId) {
        self.permission_requests += 1;
    }

    fn record_permission(&mut self, device: &DeviceId, granted: bool) {
        if granted {
            self.granted.insert(device.clone());
        } else {
            self.granted.remove(device);
        }
    }
}

impl PermissionStore for FakeHost {
    fn take_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError> {
        self.persisted.retain(|h| h != handle);
        self.persisted.push(handle.clone());
        Ok(())
    }

    fn release_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError> {
        self.persisted.retain(|h| h != handle);
        Ok(())
    }

    fn persisted_handles(&self) -> Vec<VolumeHandle> {
        self.persisted.clone()
    }
}

impl VolumeManager for FakeHost {
    fn removable_volumes(&self) -> Vec<RemovableVolume> {
        self.volumes.clone()
    }

    fn unmount(&mut self, volume: &RemovableVolume) -> Result<(), PlatformError> {
        self.unmount_calls += 1;
        if self.fail_unmount {
            return Err(PlatformError::CommandFailed {
                command: "unmount".to_string(),
                message: "target is busy".to_string(),
            });
        }
        self.unmounted.push(volume.clone());
        Ok(())
    }
}
