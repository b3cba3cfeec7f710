//! Host platform binding.
//!
//! `LocalHost` implements every collaborator the session needs on top of the
//! local machine: statvfs for space, `std::fs` for folders, sysinfo for
//! removable devices, the OS unmount tool for eject, and a JSON file for
//! persisted permissions.

mod devices;
mod permissions;

pub use devices::{removable_devices, DeviceEvent, DeviceMonitor};
pub use permissions::PermissionFile;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::storage::{BlockStats, FsStatProvider, StatProvider};
use crate::volume::{
    DeviceAccess, DeviceId, DirectoryProvider, PermissionStore, PlatformError, RemovableVolume,
    VolumeHandle, VolumeManager,
};

pub struct LocalHost {
    stats: FsStatProvider,
    permissions: PermissionFile,
}

impl LocalHost {
    pub fn new(permissions: PermissionFile) -> Self {
        Self {
            stats: FsStatProvider,
            permissions,
        }
    }
}

impl StatProvider for LocalHost {
    fn stat(&self, path: &Path) -> io::Result<BlockStats> {
        self.stats.stat(path)
    }
}

impl DirectoryProvider for LocalHost {
    fn find_child(&self, dir: &Path, name: &str) -> Option<PathBuf> {
        let child = dir.join(name);
        fs::symlink_metadata(&child).ok().map(|_| child)
    }

    fn create_child(&mut self, dir: &Path, name: &str) -> io::Result<PathBuf> {
        let child = dir.join(name);
        fs::create_dir(&child)?;
        Ok(child)
    }

    fn is_directory(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

impl DeviceAccess for LocalHost {
    fn attached_devices(&self) -> Vec<DeviceId> {
        removable_devices()
    }

    fn has_permission(&self, device: &DeviceId) -> bool {
        self.permissions.is_granted(device)
    }

    /// The prompt itself is drawn by the front-end while the session is
    /// waiting for an answer.
    fn request_permission(&mut self, device: &DeviceId) {
        info!(%device, "permission prompt raised");
    }

    fn record_permission(&mut self, device: &DeviceId, granted: bool) {
        if let Err(e) = self.permissions.set_granted(device, granted) {
            warn!(%device, error = %e, "could not store device permission");
        }
    }
}

impl PermissionStore for LocalHost {
    fn take_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError> {
        self.permissions.take(handle)?;
        Ok(())
    }

    fn release_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError> {
        self.permissions.release(handle)?;
        Ok(())
    }

    fn persisted_handles(&self) -> Vec<VolumeHandle> {
        self.permissions.handles().to_vec()
    }
}

impl VolumeManager for LocalHost {
    fn removable_volumes(&self) -> Vec<RemovableVolume> {
        devices::removable_volumes()
    }

    fn unmount(&mut self, volume: &RemovableVolume) -> Result<(), PlatformError> {
        devices::unmount(volume)
    }
}
