use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use tracing::{debug, info, warn};

use crate::config::{AppConfig, Settings, Theme};
use crate::host::{DeviceEvent, DeviceMonitor};
use crate::storage::{snapshot, Reading};
use crate::volume::{
    DeviceId, Host, ManagedFolderSet, Notice, Session, SessionState, Severity, VolumeHandle,
};

/// How long a notice stays on screen.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);

/// Older notices are dropped beyond this many.
const NOTICE_CAPACITY: usize = 16;

/// A notice as shown to the user.
#[derive(Debug, Clone)]
pub struct NoticeEntry {
    pub severity: Severity,
    pub message: String,
    pub raised: Instant,
    pub at: DateTime<Local>,
}

/// Transient notification queue shared by both front-ends.
#[derive(Debug, Default)]
pub struct NoticeLog {
    entries: VecDeque<NoticeEntry>,
}

impl NoticeLog {
    pub fn push(&mut self, notice: &Notice) {
        self.push_message(notice.severity(), notice.to_string());
    }

    pub fn push_message(&mut self, severity: Severity, message: impl Into<String>) {
        if self.entries.len() == NOTICE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(NoticeEntry {
            severity,
            message: message.into(),
            raised: Instant::now(),
            at: Local::now(),
        });
    }

    /// Drop notices older than `ttl`.
    pub fn expire(&mut self, ttl: Duration) {
        self.entries.retain(|entry| entry.raised.elapsed() < ttl);
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &NoticeEntry> {
        self.entries.iter()
    }

    #[cfg(test)]
    pub fn latest(&self) -> Option<&NoticeEntry> {
        self.entries.back()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Application state shared by the window and the terminal front-end.
pub struct App<H: Host> {
    pub config: AppConfig,
    host: H,
    session: Session,
    internal: Reading,
    settings: Settings,
    theme: Theme,
    pub notices: NoticeLog,

    // Device events
    events_tx: Sender<DeviceEvent>,
    events_rx: Receiver<DeviceEvent>,
    monitor: DeviceMonitor,

    last_refresh: Instant,
    shut_down: bool,
    pub should_quit: bool,
}

impl<H: Host> App<H> {
    pub fn new(config: AppConfig, host: H) -> Self {
        let settings = Settings::load(&config.settings_path());
        let theme = config.theme_override.unwrap_or(settings.theme);
        let (events_tx, events_rx) = mpsc::channel();

        Self {
            session: Session::new(config.layout.clone()),
            config,
            host,
            internal: Reading::no_data(),
            settings,
            theme,
            notices: NoticeLog::default(),
            events_tx,
            events_rx,
            monitor: DeviceMonitor::inactive(),
            last_refresh: Instant::now(),
            shut_down: false,
            should_quit: false,
        }
    }

    /// Bring the screen up: read internal storage, restore the last volume,
    /// pre-select the configured one and check for an attached device.
    pub fn start(&mut self) {
        self.refresh_internal();

        let mut notices = Vec::new();
        self.session.restore(&mut self.host, &mut notices);
        if let Some(volume) = self.config.initial_volume.clone() {
            self.session
                .on_user_pick(&mut self.host, Some(VolumeHandle::new(volume)), &mut notices);
        }
        self.session.on_attach_detected(&mut self.host, &mut notices);
        self.publish(notices);
        self.last_refresh = Instant::now();
    }

    /// Subscribe to device changes reported by `probe`.
    pub fn register_monitor<P>(&mut self, probe: P)
    where
        P: FnMut() -> Vec<DeviceId> + Send + 'static,
    {
        self.monitor.unregister();
        self.monitor =
            DeviceMonitor::register(self.events_tx.clone(), self.config.poll_interval, probe);
    }

    #[cfg(test)]
    pub fn event_sender(&self) -> Sender<DeviceEvent> {
        self.events_tx.clone()
    }

    /// Drain queued device events (non-blocking) and refresh readings when due.
    pub fn update(&mut self) {
        loop {
            match self.events_rx.try_recv() {
                Ok(event) => self.handle_event(event),
                Err(TryRecvError::Empty) => break,
                // We hold a sender ourselves
                Err(TryRecvError::Disconnected) => break,
            }
        }

        if self.last_refresh.elapsed() >= self.config.poll_interval {
            self.refresh();
        }
        self.notices.expire(NOTICE_TTL);
    }

    pub fn handle_event(&mut self, event: DeviceEvent) {
        debug!(?event, "device event");
        let mut notices = Vec::new();

        match event {
            DeviceEvent::Attached(device) => {
                notices.push(Notice::DeviceAttached(device));
                self.session.on_attach_detected(&mut self.host, &mut notices);
            }
            DeviceEvent::Detached(_) => {
                // After an eject the unmounted device drops out of the next poll
                if *self.session.state() != SessionState::Empty {
                    notices.push(Notice::DeviceDetached);
                }
                self.session.on_detach_detected();
            }
            DeviceEvent::PermissionResult { granted } => {
                self.session
                    .on_permission_result(&mut self.host, granted, &mut notices);
            }
        }

        self.publish(notices);
    }

    /// Answer the outstanding permission prompt.
    pub fn answer_permission(&mut self, granted: bool) {
        if self.pending_permission().is_none() {
            return;
        }
        // Goes through the queue like any other device signal.
        let _ = self
            .events_tx
            .send(DeviceEvent::PermissionResult { granted });
    }

    /// The folder picker closed; `None` means cancelled.
    pub fn pick_volume(&mut self, pick: Option<PathBuf>) {
        let mut notices = Vec::new();
        self.session
            .on_user_pick(&mut self.host, pick.map(VolumeHandle::new), &mut notices);
        self.publish(notices);
    }

    pub fn eject(&mut self) {
        let mut notices = Vec::new();
        self.session.eject(&mut self.host, &mut notices);
        self.publish(notices);
    }

    /// Re-read both storages.
    pub fn refresh(&mut self) {
        self.refresh_internal();
        let mut notices = Vec::new();
        self.session.refresh(&self.host, &mut notices);
        self.publish(notices);
        self.last_refresh = Instant::now();
    }

    pub fn refresh_internal(&mut self) {
        let result = snapshot(&self.host, &self.config.internal_root);
        if let Err(e) = &result {
            warn!(error = %e, "internal stat failed");
        }
        self.internal = Reading::from_result(&result);
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.settings.theme = self.theme;
        self.save_settings();
    }

    /// Open the managed folder in the system file manager.
    pub fn open_managed_folder(&mut self) {
        let Some(root) = self.session.folders().map(|f| f.root().to_path_buf()) else {
            self.notices
                .push_message(Severity::Warning, "No managed folder on the selected storage");
            return;
        };

        if let Err(e) = open::that(&root) {
            warn!(path = %root.display(), error = %e, "could not open folder");
            self.notices
                .push_message(Severity::Error, format!("Could not open {}: {}", root.display(), e));
        }
    }

    /// Stop listening for devices and persist settings. Safe to call twice.
    pub fn shutdown(&mut self) {
        self.monitor.unregister();
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.save_settings();
        info!("shut down");
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn internal(&self) -> &Reading {
        &self.internal
    }

    pub fn removable(&self) -> &Reading {
        self.session.removable()
    }

    pub fn folders(&self) -> Option<&ManagedFolderSet> {
        self.session.folders()
    }

    pub fn pending_permission(&self) -> Option<&DeviceId> {
        self.session.pending_device()
    }

    /// Eject is offered only while the removable reading shows a volume.
    pub fn can_eject(&self) -> bool {
        self.session.removable().has_data()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    #[cfg(test)]
    pub fn is_monitoring(&self) -> bool {
        self.monitor.is_registered()
    }

    fn publish(&mut self, notices: Vec<Notice>) {
        for notice in &notices {
            self.notices.push(notice);
        }
    }

    fn save_settings(&self) {
        let path = self.config.settings_path();
        if let Err(e) = self.settings.save(&path) {
            warn!(path = %path.display(), error = %e, "could not save settings");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::testing::FakeHost;
    use crate::volume::DeviceAccess;
    use tempfile::TempDir;

    fn test_app(config_dir: &TempDir) -> App<FakeHost> {
        let config = AppConfig {
            internal_root: config_dir.path().to_path_buf(),
            config_dir: config_dir.path().join("config"),
            poll_interval: Duration::from_secs(3600),
            ..AppConfig::default()
        };
        App::new(config, FakeHost::new())
    }

    #[test]
    fn test_start_reads_internal_storage() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.start();

        assert!(app.internal().has_data());
        assert_eq!(app.internal().snapshot.used_bytes(), 2_457_600);
        assert!(!app.removable().has_data());
        assert!(!app.can_eject());
    }

    #[test]
    fn test_start_with_initial_volume() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.config.initial_volume = Some(usb.path().to_path_buf());

        app.start();

        assert_eq!(app.session().state(), &SessionState::FolderReady);
        assert!(app.can_eject());
        assert!(usb.path().join("DaSifA").join("Images").is_dir());
    }

    #[test]
    fn test_attach_then_permission_answer() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.host.attach("/dev/sdb1");

        app.handle_event(DeviceEvent::Attached(DeviceId::new("/dev/sdb1")));
        assert_eq!(app.pending_permission(), Some(&DeviceId::new("/dev/sdb1")));

        app.answer_permission(true);
        app.update();

        assert_eq!(app.pending_permission(), None);
        assert_eq!(app.session().state(), &SessionState::Granted);
        assert!(app.host().has_permission(&DeviceId::new("/dev/sdb1")));
    }

    #[test]
    fn test_answer_without_prompt_is_ignored() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.answer_permission(false);
        app.update();

        assert_eq!(app.session().state(), &SessionState::Empty);
        assert!(app.notices.is_empty());
    }

    #[test]
    fn test_detach_event_clears_session() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.pick_volume(Some(usb.path().to_path_buf()));
        assert!(app.can_eject());

        app.event_sender()
            .send(DeviceEvent::Detached(DeviceId::new("/dev/sdb1")))
            .unwrap();
        app.update();

        assert_eq!(app.session().handle(), None);
        assert!(!app.can_eject());
        assert_eq!(app.host().unmount_calls, 0);
        assert_eq!(
            app.notices.latest().map(|n| n.message.as_str()),
            Some("USB device disconnected")
        );
    }

    #[test]
    fn test_detach_after_eject_is_quiet() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.host.mount("/dev/sdb1", usb.path());
        app.pick_volume(Some(usb.path().to_path_buf()));
        app.eject();
        let before = app.notices.len();

        app.handle_event(DeviceEvent::Detached(DeviceId::new("/dev/sdb1")));

        assert_eq!(app.notices.len(), before);
        assert_eq!(
            app.notices.latest().map(|n| n.message.as_str()),
            Some("USB storage ejected, safe to remove")
        );
    }

    #[test]
    fn test_failing_volume_does_not_flood_notices() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.pick_volume(Some(usb.path().to_path_buf()));
        app.host.fail_stat = true;

        for _ in 0..20 {
            app.refresh();
        }

        let errors = app
            .notices
            .iter()
            .filter(|n| n.severity == Severity::Error)
            .count();
        assert_eq!(errors, 1);
        assert!(app.notices.iter().any(|n| n.message.starts_with("USB storage selected")));
    }

    #[test]
    fn test_cancelled_pick_is_a_warning() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.pick_volume(None);

        let latest = app.notices.latest().unwrap();
        assert_eq!(latest.severity, Severity::Warning);
        assert_eq!(latest.message, "no storage selected");
    }

    #[test]
    fn test_eject_clears_and_reports() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.host.mount("/dev/sdb1", usb.path());
        app.pick_volume(Some(usb.path().to_path_buf()));

        app.eject();

        assert!(!app.can_eject());
        assert_eq!(app.host().unmount_calls, 1);
        assert_eq!(
            app.notices.latest().map(|n| n.message.as_str()),
            Some("USB storage ejected, safe to remove")
        );
    }

    #[test]
    fn test_theme_toggle_is_persisted() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        assert_eq!(app.theme(), Theme::Light);

        app.toggle_theme();
        assert_eq!(app.theme(), Theme::Dark);

        let reopened = test_app(&dir);
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn test_theme_override_wins() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig {
            config_dir: dir.path().to_path_buf(),
            theme_override: Some(Theme::Dark),
            ..AppConfig::default()
        };
        let app = App::new(config, FakeHost::new());
        assert_eq!(app.theme(), Theme::Dark);
    }

    #[test]
    fn test_open_folder_without_volume_warns() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);

        app.open_managed_folder();

        assert_eq!(app.notices.latest().unwrap().severity, Severity::Warning);
    }

    #[test]
    fn test_monitor_events_reach_session() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir);
        app.config.poll_interval = Duration::from_millis(10);
        app.host.attach("/dev/sdb1");

        let mut calls = 0;
        app.register_monitor(move || {
            calls += 1;
            if calls > 1 {
                vec![DeviceId::new("/dev/sdb1")]
            } else {
                Vec::new()
            }
        });
        assert!(app.is_monitoring());

        let deadline = Instant::now() + Duration::from_secs(2);
        while app.pending_permission().is_none() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
            app.update();
        }
        assert_eq!(app.pending_permission(), Some(&DeviceId::new("/dev/sdb1")));

        app.shutdown();
        app.shutdown();
        assert!(!app.is_monitoring());
    }

    #[test]
    fn test_notice_log_expiry_and_capacity() {
        let mut log = NoticeLog::default();
        for i in 0..NOTICE_CAPACITY + 4 {
            log.push_message(Severity::Info, format!("notice {}", i));
        }
        assert_eq!(log.len(), NOTICE_CAPACITY);
        assert_eq!(
            log.iter().next().map(|n| n.message.as_str()),
            Some("notice 4")
        );

        log.expire(Duration::ZERO);
        assert!(log.is_empty());
    }
}
