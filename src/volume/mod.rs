//! Removable volume lifecycle.
//!
//! Tracks the single user-granted removable volume: its handle, the device
//! permission state, and the managed folder layout created on it.

mod platform;
mod session;
#[cfg(test)]
pub mod testing;

pub use platform::{
    DeviceAccess, DirectoryProvider, Host, PermissionStore, PlatformError, VolumeManager,
};
pub use session::{Session, SessionState};

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Default name of the application-owned folder on a granted volume.
pub const DEFAULT_ROOT_FOLDER: &str = "DaSifA";

/// Subfolders created inside the managed root, in creation order.
pub const MANAGED_SUBFOLDERS: [&str; 3] = ["Images", "Videos", "Downloads"];

/// Identifier of a removable block device as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-granted storage location.
///
/// Only the session owns one; everything derived from it (folders,
/// readings) is dropped together with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VolumeHandle {
    root: PathBuf,
}

impl VolumeHandle {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl fmt::Display for VolumeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.display())
    }
}

/// One mounted removable filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovableVolume {
    pub device: DeviceId,
    pub name: String,
    pub mount_point: PathBuf,
}

impl RemovableVolume {
    /// Whether `handle` points somewhere on this volume.
    pub fn contains(&self, handle: &VolumeHandle) -> bool {
        handle.root().starts_with(&self.mount_point)
    }
}

/// Name of the managed root folder and its fixed children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderLayout {
    pub root_name: String,
}

impl FolderLayout {
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            root_name: root_name.into(),
        }
    }

    pub fn subfolders(&self) -> &'static [&'static str] {
        &MANAGED_SUBFOLDERS
    }
}

impl Default for FolderLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT_FOLDER)
    }
}

/// The managed folder tree that exists on the current volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagedFolderSet {
    root: PathBuf,
}

impl ManagedFolderSet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Recoverable failures of the removable volume lifecycle.
///
/// None of these is fatal; each turns into a notice and a safe default.
#[derive(Error, Debug)]
pub enum SessionError {
    /// Querying the volume's filesystem failed
    #[error(transparent)]
    StatFailure(#[from] StorageError),

    /// The user or the system refused device access
    #[error("access to {device} was denied")]
    PermissionDenied { device: String },

    /// The user closed the folder picker without choosing
    #[error("no storage selected")]
    SelectionCancelled,

    /// The volume root is not a usable directory
    #[error("could not create folders in {path}: {reason}")]
    FolderCreationFailed { path: PathBuf, reason: String },

    /// The platform unmount failed or no volume matched
    #[error("eject failed: {reason}")]
    EjectFailed { reason: String },
}

/// How loudly a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// User-visible, non-blocking notification produced by session events.
#[derive(Debug)]
pub enum Notice {
    DeviceAttached(DeviceId),
    DeviceDetached,
    PermissionRequested(DeviceId),
    VolumeSelected(VolumeHandle),
    FoldersCreated(PathBuf),
    FoldersPresent(PathBuf),
    Ejected,
    Failed(SessionError),
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Failed(SessionError::EjectFailed { .. }) => Severity::Warning,
            Notice::Failed(SessionError::SelectionCancelled) => Severity::Warning,
            Notice::Failed(_) => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::DeviceAttached(device) => write!(f, "USB device connected ({})", device),
            Notice::DeviceDetached => f.write_str("USB device disconnected"),
            Notice::PermissionRequested(device) => {
                write!(f, "Waiting for permission to access {}", device)
            }
            Notice::VolumeSelected(handle) => write!(f, "USB storage selected: {}", handle),
            Notice::FoldersCreated(path) => write!(f, "Folders created in {}", path.display()),
            Notice::FoldersPresent(path) => {
                write!(f, "Folders already present in {}", path.display())
            }
            Notice::Ejected => f.write_str("USB storage ejected, safe to remove"),
            Notice::Failed(err) => write!(f, "{}", err),
        }
    }
}
