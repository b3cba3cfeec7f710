//! Removable device discovery, unmounting and hot-plug notifications.

use std::collections::BTreeSet;
use std::process::Command;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use sysinfo::Disks;
use tracing::{debug, info};

use crate::volume::{DeviceId, PlatformError, RemovableVolume};

/// Signals delivered to the UI thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Attached(DeviceId),
    Detached(DeviceId),
    /// Answer to the outstanding permission prompt
    PermissionResult { granted: bool },
}

/// Mounted removable filesystems, in the order the OS lists them.
pub fn removable_volumes() -> Vec<RemovableVolume> {
    let disks = Disks::new_with_refreshed_list();

    disks
        .iter()
        .filter(|disk| disk.is_removable())
        .map(|disk| RemovableVolume {
            device: DeviceId::new(disk.name().to_string_lossy()),
            name: disk
                .mount_point()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| disk.name().to_string_lossy().into_owned()),
            mount_point: disk.mount_point().to_path_buf(),
        })
        .collect()
}

/// Ids of attached removable devices, without duplicates.
pub fn removable_devices() -> Vec<DeviceId> {
    let mut seen = BTreeSet::new();
    removable_volumes()
        .into_iter()
        .map(|volume| volume.device)
        .filter(|device| seen.insert(device.clone()))
        .collect()
}

/// Unmount `volume` with the platform's own tool.
pub fn unmount(volume: &RemovableVolume) -> Result<(), PlatformError> {
    info!(device = %volume.device, mount_point = %volume.mount_point.display(), "unmounting");
    unmount_impl(volume)
}

#[cfg(target_os = "linux")]
fn unmount_impl(volume: &RemovableVolume) -> Result<(), PlatformError> {
    match run("udisksctl", &["unmount", "-b", volume.device.as_str()]) {
        Err(PlatformError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("udisksctl not installed, falling back to umount");
            run_path("umount", &volume.mount_point)
        }
        result => result,
    }
}

#[cfg(target_os = "macos")]
fn unmount_impl(volume: &RemovableVolume) -> Result<(), PlatformError> {
    let mount_point = volume.mount_point.to_string_lossy();
    run("diskutil", &["eject", mount_point.as_ref()])
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn unmount_impl(_volume: &RemovableVolume) -> Result<(), PlatformError> {
    Err(PlatformError::Unsupported)
}

fn run(command: &str, args: &[&str]) -> Result<(), PlatformError> {
    let output = Command::new(command).args(args).output()?;
    check(command, output)
}

#[cfg(target_os = "linux")]
fn run_path(command: &str, path: &std::path::Path) -> Result<(), PlatformError> {
    let output = Command::new(command).arg(path).output()?;
    check(command, output)
}

fn check(command: &str, output: std::process::Output) -> Result<(), PlatformError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(PlatformError::CommandFailed {
        command: command.to_string(),
        message: if stderr.is_empty() {
            output.status.to_string()
        } else {
            stderr
        },
    })
}

/// Background poller that turns changes in the removable device list into
/// [`DeviceEvent`]s.
///
/// `unregister` may be called any number of times, including on a monitor
/// that was never registered.
pub struct DeviceMonitor {
    stop: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl DeviceMonitor {
    /// A monitor that is not listening to anything.
    pub fn inactive() -> Self {
        Self {
            stop: None,
            worker: None,
        }
    }

    /// Start polling `probe` every `interval`, sending differences to `events`.
    ///
    /// The device list at registration time is the baseline and produces no events.
    pub fn register<P>(events: Sender<DeviceEvent>, interval: Duration, mut probe: P) -> Self
    where
        P: FnMut() -> Vec<DeviceId> + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let mut known: BTreeSet<DeviceId> = probe().into_iter().collect();
        debug!(devices = known.len(), "device monitor registered");

        let worker = thread::spawn(move || loop {
            match stop_rx.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let current: BTreeSet<DeviceId> = probe().into_iter().collect();
            let attached = current.difference(&known).cloned().map(DeviceEvent::Attached);
            let detached = known.difference(&current).cloned().map(DeviceEvent::Detached);
            for event in detached.chain(attached) {
                debug!(?event, "device change");
                if events.send(event).is_err() {
                    // UI side is gone
                    return;
                }
            }
            known = current;
        });

        Self {
            stop: Some(stop_tx),
            worker: Some(worker),
        }
    }

    #[cfg(test)]
    pub fn is_registered(&self) -> bool {
        self.worker.is_some()
    }

    /// Stop the poller and wait for it to exit.
    pub fn unregister(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
            debug!("device monitor unregistered");
        }
    }
}

impl Drop for DeviceMonitor {
    fn drop(&mut self) {
        self.unregister();
    }
}
