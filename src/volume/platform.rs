//! Interfaces the session needs from the host platform.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{DeviceId, RemovableVolume, VolumeHandle};
use crate::storage::StatProvider;

/// Errors raised by the host binding.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// An external helper exited unsuccessfully
    #[error("{command} failed: {message}")]
    CommandFailed { command: String, message: String },

    #[error("unmounting is not supported on this platform")]
    Unsupported,
}

/// Removable device discovery and the device permission prompt.
pub trait DeviceAccess {
    /// Currently attached removable devices, in host order.
    fn attached_devices(&self) -> Vec<DeviceId>;

    fn has_permission(&self, device: &DeviceId) -> bool;

    /// Ask the user for access. The answer arrives later as a permission
    /// result event.
    fn request_permission(&mut self, device: &DeviceId);

    /// Remember the user's answer for `device`.
    fn record_permission(&mut self, device: &DeviceId, granted: bool);
}

/// Directory queries on a granted volume.
pub trait DirectoryProvider {
    fn find_child(&self, dir: &Path, name: &str) -> Option<PathBuf>;

    fn create_child(&mut self, dir: &Path, name: &str) -> io::Result<PathBuf>;

    fn is_directory(&self, path: &Path) -> bool;
}

/// Access rights that outlive the process.
pub trait PermissionStore {
    fn take_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError>;

    fn release_persistent_access(&mut self, handle: &VolumeHandle) -> Result<(), PlatformError>;

    /// Handles granted in earlier runs, most recent last.
    fn persisted_handles(&self) -> Vec<VolumeHandle>;
}

/// Mounted removable volumes and the typed unmount call.
pub trait VolumeManager {
    fn removable_volumes(&self) -> Vec<RemovableVolume>;

    fn unmount(&mut self, volume: &RemovableVolume) -> Result<(), PlatformError>;
}

/// Everything the session talks to, bundled.
pub trait Host: StatProvider + DirectoryProvider + DeviceAccess + PermissionStore + VolumeManager {}

impl<T> Host for T where
    T: StatProvider + DirectoryProvider + DeviceAccess + PermissionStore + VolumeManager
{
}
