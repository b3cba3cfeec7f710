use std::path::PathBuf;

use tracing::debug;

use crate::app::App;
use crate::ui::input::{Command, InputMode};
use crate::volume::{Host, Severity};

/// Terminal-only view state layered over the shared [`App`].
#[derive(Debug, Default)]
pub struct TuiState {
    pub input_mode: InputMode,
    pub path_input: String,
}

impl TuiState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow the session: the permission prompt takes over the keyboard while
    /// it is pending and gives it back once answered.
    pub fn sync<H: Host>(&mut self, app: &App<H>) {
        let pending = app.pending_permission().is_some();
        match self.input_mode {
            InputMode::Normal if pending => self.input_mode = InputMode::Confirm,
            InputMode::Confirm if !pending => self.input_mode = InputMode::Normal,
            _ => {}
        }
    }

    /// Handle a command from input
    pub fn handle_command<H: Host>(&mut self, app: &mut App<H>, cmd: Command) {
        debug!(?cmd, mode = ?self.input_mode, "command");
        match cmd {
            Command::Quit => {
                if self.input_mode == InputMode::Normal {
                    app.should_quit = true;
                }
            }
            Command::PickVolume => {
                self.path_input.clear();
                self.input_mode = InputMode::PathInput;
            }
            Command::PathInput(c) => self.path_input.push(c),
            Command::PathBackspace => {
                self.path_input.pop();
            }
            Command::ConfirmPath => {
                let typed = self.path_input.trim();
                let pick = if typed.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(typed))
                };
                app.pick_volume(pick);
                self.path_input.clear();
                self.input_mode = InputMode::Normal;
            }
            Command::CancelPath => {
                app.pick_volume(None);
                self.path_input.clear();
                self.input_mode = InputMode::Normal;
            }
            Command::Eject => {
                if app.can_eject() {
                    app.eject();
                } else {
                    app.notices
                        .push_message(Severity::Warning, "No USB storage to eject");
                }
            }
            Command::ToggleTheme => app.toggle_theme(),
            Command::Refresh => app.refresh(),
            Command::OpenFolder => app.open_managed_folder(),
            Command::ShowHelp => self.input_mode = InputMode::Help,
            Command::HideHelp => self.input_mode = InputMode::Normal,
            Command::Confirm => {
                app.answer_permission(true);
                self.input_mode = InputMode::Normal;
            }
            Command::Cancel => {
                app.answer_permission(false);
                self.input_mode = InputMode::Normal;
            }
            Command::Noop => {}
        }
    }
}
