//! Removable volume session state machine.
//!
//! All handlers run on the UI thread, one event at a time, and report what
//! the user should see by pushing [`Notice`]s into the caller's buffer.
//! Nothing in here is fatal: every failure ends in a notice and a safe state.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{
    DeviceId, FolderLayout, Host, ManagedFolderSet, Notice, SessionError, VolumeHandle,
};
use crate::storage::{snapshot, Reading, StatProvider};

/// Lifecycle of the removable volume.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No usable volume
    #[default]
    Empty,
    /// A permission prompt for `device` is on screen
    PermissionPending { device: DeviceId },
    /// Access granted; folders not (yet) provisioned
    Granted,
    /// Access granted and the managed folders exist
    FolderReady,
}

/// Result of a folder provisioning attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderOutcome {
    Created,
    AlreadyPresent,
    Failed,
}

/// The single removable volume session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    layout: FolderLayout,
    state: SessionState,
    handle: Option<VolumeHandle>,
    folders: Option<ManagedFolderSet>,
    removable: Reading,
}

impl Session {
    pub fn new(layout: FolderLayout) -> Self {
        Self {
            layout,
            state: SessionState::Empty,
            handle: None,
            folders: None,
            removable: Reading::no_data(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn handle(&self) -> Option<&VolumeHandle> {
        self.handle.as_ref()
    }

    pub fn folders(&self) -> Option<&ManagedFolderSet> {
        self.folders.as_ref()
    }

    /// Latest removable storage reading.
    pub fn removable(&self) -> &Reading {
        &self.removable
    }

    /// Device whose permission prompt is outstanding, if any.
    pub fn pending_device(&self) -> Option<&DeviceId> {
        match &self.state {
            SessionState::PermissionPending { device } => Some(device),
            _ => None,
        }
    }

    /// A removable device showed up (or the app started with one attached).
    pub fn on_attach_detected<H: Host>(&mut self, host: &mut H, notices: &mut Vec<Notice>) {
        let Some(device) = host.attached_devices().into_iter().next() else {
            debug!("attach check found no removable device");
            return;
        };

        if host.has_permission(&device) {
            debug!(%device, "device permission already on record");
            self.grant(host, notices);
            return;
        }

        if self.pending_device() == Some(&device) {
            debug!(%device, "permission prompt already outstanding");
            return;
        }

        info!(%device, "requesting device permission");
        host.request_permission(&device);
        notices.push(Notice::PermissionRequested(device.clone()));
        self.state = SessionState::PermissionPending { device };
    }

    /// The permission prompt was answered.
    pub fn on_permission_result<H: Host>(
        &mut self,
        host: &mut H,
        granted: bool,
        notices: &mut Vec<Notice>,
    ) {
        // A queued detach or pick may have settled the prompt already
        let Some(device) = self.pending_device().cloned() else {
            debug!(granted, "permission answer without an open prompt");
            return;
        };
        host.record_permission(&device, granted);

        if granted {
            info!(%device, "device permission granted");
            self.grant(host, notices);
        } else {
            info!(%device, "device permission denied");
            self.clear();
            notices.push(Notice::Failed(SessionError::PermissionDenied {
                device: device.to_string(),
            }));
        }
    }

    /// The folder picker closed; `None` means the user cancelled.
    pub fn on_user_pick<H: Host>(
        &mut self,
        host: &mut H,
        pick: Option<VolumeHandle>,
        notices: &mut Vec<Notice>,
    ) {
        let Some(handle) = pick else {
            debug!("folder picker cancelled");
            notices.push(Notice::Failed(SessionError::SelectionCancelled));
            return;
        };

        if let Err(e) = host.take_persistent_access(&handle) {
            warn!(%handle, error = %e, "could not persist volume access");
        }

        info!(%handle, "volume selected");
        self.adopt(handle.clone());
        notices.push(Notice::VolumeSelected(handle));
        self.refresh(&*host, notices);
        self.ensure_folders(host, notices);
    }

    /// Bring back the most recent handle from an earlier run, if it is still there.
    pub fn restore<H: Host>(&mut self, host: &mut H, notices: &mut Vec<Notice>) -> bool {
        if self.handle.is_some() {
            return false;
        }

        let Some(handle) = host
            .persisted_handles()
            .into_iter()
            .rev()
            .find(|h| host.is_directory(h.root()))
        else {
            return false;
        };

        info!(%handle, "restored persisted volume");
        self.adopt(handle);
        self.refresh(&*host, notices);
        self.ensure_folders(host, notices);
        true
    }

    /// Re-read the removable volume. Without a handle there is nothing to show.
    ///
    /// A stat failure is announced once, when the reading turns failed.
    pub fn refresh<S: StatProvider + ?Sized>(
        &mut self,
        stats: &S,
        notices: &mut Vec<Notice>,
    ) -> &Reading {
        let was_failed = self.removable.is_failed();
        self.removable = match &self.handle {
            Some(handle) => {
                let result = snapshot(stats, handle.root());
                let reading = Reading::from_result(&result);
                if let Err(e) = result {
                    if was_failed {
                        debug!(%handle, error = %e, "removable stat still failing");
                    } else {
                        warn!(%handle, error = %e, "removable stat failed");
                        notices.push(Notice::Failed(SessionError::StatFailure(e)));
                    }
                }
                reading
            }
            None => Reading::no_data(),
        };
        &self.removable
    }

    /// Make sure the managed folder tree exists under the current handle.
    pub fn ensure_folders<H: Host>(
        &mut self,
        host: &mut H,
        notices: &mut Vec<Notice>,
    ) -> Option<FolderOutcome> {
        let handle = self.handle.clone()?;
        let root = handle.root();

        if !host.is_directory(root) {
            return Some(self.folder_failure(root, "not a directory".to_string(), notices));
        }

        if let Some(existing) = host.find_child(root, &self.layout.root_name) {
            if !host.is_directory(&existing) {
                return Some(self.folder_failure(
                    &existing,
                    "exists but is not a directory".to_string(),
                    notices,
                ));
            }

            for name in self.layout.subfolders() {
                if host.find_child(&existing, name).is_none() {
                    if let Err(e) = host.create_child(&existing, name) {
                        warn!(folder = name, error = %e, "could not recreate managed subfolder");
                    }
                }
            }

            debug!(path = %existing.display(), "managed folders already present");
            self.folders_ready(existing.clone());
            notices.push(Notice::FoldersPresent(existing));
            return Some(FolderOutcome::AlreadyPresent);
        }

        match self.create_layout(host, root) {
            Ok(created) => {
                info!(path = %created.display(), "managed folders created");
                self.folders_ready(created.clone());
                notices.push(Notice::FoldersCreated(created));
                Some(FolderOutcome::Created)
            }
            Err(e) => Some(self.folder_failure(root, e.to_string(), notices)),
        }
    }

    /// Release access, unmount the volume holding the handle, then forget it.
    ///
    /// The session is cleared even if the unmount fails.
    pub fn eject<H: Host>(&mut self, host: &mut H, notices: &mut Vec<Notice>) {
        match self.handle.clone() {
            Some(handle) => {
                if let Err(e) = host.release_persistent_access(&handle) {
                    warn!(%handle, error = %e, "could not release volume access");
                }

                // Nested mounts: the deepest mount point owns the handle
                let target = host
                    .removable_volumes()
                    .into_iter()
                    .filter(|volume| volume.contains(&handle))
                    .max_by_key(|volume| volume.mount_point.components().count());

                match target {
                    Some(volume) => match host.unmount(&volume) {
                        Ok(()) => {
                            info!(device = %volume.device, "volume ejected");
                            notices.push(Notice::Ejected);
                        }
                        Err(e) => {
                            warn!(device = %volume.device, error = %e, "unmount failed");
                            notices.push(Notice::Failed(SessionError::EjectFailed {
                                reason: e.to_string(),
                            }));
                        }
                    },
                    None => {
                        warn!(%handle, "no removable volume holds the selected storage");
                        notices.push(Notice::Failed(SessionError::EjectFailed {
                            reason: format!("no removable volume holds {}", handle),
                        }));
                    }
                }
            }
            None => {
                notices.push(Notice::Failed(SessionError::EjectFailed {
                    reason: "no storage selected".to_string(),
                }));
            }
        }

        self.clear();
    }

    /// The device is physically gone; drop everything without unmounting.
    pub fn on_detach_detected(&mut self) {
        if let Some(handle) = &self.handle {
            info!(%handle, "volume detached");
        }
        self.clear();
    }

    fn adopt(&mut self, handle: VolumeHandle) {
        self.handle = Some(handle);
        self.folders = None;
        self.removable = Reading::no_data();
        self.state = SessionState::Granted;
    }

    fn grant<H: Host>(&mut self, host: &mut H, notices: &mut Vec<Notice>) {
        self.state = if self.folders.is_some() {
            SessionState::FolderReady
        } else {
            SessionState::Granted
        };
        self.refresh(&*host, notices);
        self.ensure_folders(host, notices);
    }

    fn folders_ready(&mut self, root: PathBuf) {
        self.folders = Some(ManagedFolderSet::new(root));
        if self.state == SessionState::Granted {
            self.state = SessionState::FolderReady;
        }
    }

    fn folder_failure(
        &mut self,
        path: &Path,
        reason: String,
        notices: &mut Vec<Notice>,
    ) -> FolderOutcome {
        warn!(path = %path.display(), %reason, "managed folder creation failed");
        self.folders = None;
        if self.state == SessionState::FolderReady {
            self.state = SessionState::Granted;
        }
        notices.push(Notice::Failed(SessionError::FolderCreationFailed {
            path: path.to_path_buf(),
            reason,
        }));
        FolderOutcome::Failed
    }

    fn create_layout<H: Host>(&self, host: &mut H, root: &Path) -> io::Result<PathBuf> {
        let managed = host.create_child(root, &self.layout.root_name)?;
        for name in self.layout.subfolders() {
            host.create_child(&managed, name)?;
        }
        Ok(managed)
    }

    fn clear(&mut self) {
        self.state = SessionState::Empty;
        self.handle = None;
        self.folders = None;
        self.removable = Reading::no_data();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(FolderLayout::default())
    }
}
