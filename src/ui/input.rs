//! Input handling for the DaSifA terminal front-end.
//!
//! Key events map to commands depending on the input mode: normal keys,
//! typing a volume path, answering the permission prompt, or the help overlay.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// The current input mode of the terminal front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Single-key actions.
    #[default]
    Normal,
    /// Typing the path of a removable volume (stands in for the folder picker).
    PathInput,
    /// Answering the device permission prompt.
    Confirm,
    /// Help overlay showing all keyboard shortcuts.
    Help,
}

/// Commands produced by key events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start typing a volume path.
    PickVolume,
    /// Add a character to the path input.
    PathInput(char),
    /// Remove the last character from the path input.
    PathBackspace,
    /// Select the typed path.
    ConfirmPath,
    /// Close the path input without choosing.
    CancelPath,
    /// Eject the selected volume.
    Eject,
    /// Switch between light and dark.
    ToggleTheme,
    /// Re-read both storages.
    Refresh,
    /// Open the managed folder in the file manager.
    OpenFolder,
    /// Show help screen.
    ShowHelp,
    /// Hide help screen.
    HideHelp,
    /// Grant the pending permission.
    Confirm,
    /// Deny the pending permission.
    Cancel,
    /// Quit the application.
    Quit,
    /// No operation - key was not recognized or not applicable.
    Noop,
}

/// Handle a key event and return the corresponding command.
pub fn handle_key(key: KeyEvent, mode: &InputMode) -> Command {
    match mode {
        InputMode::Normal => handle_normal_mode(key),
        InputMode::PathInput => handle_path_input_mode(key),
        InputMode::Confirm => handle_confirm_mode(key),
        InputMode::Help => handle_help_mode(key),
    }
}

fn handle_normal_mode(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char('p') => Command::PickVolume,
        KeyCode::Char('e') => Command::Eject,
        KeyCode::Char('t') => Command::ToggleTheme,
        KeyCode::Char('r') | KeyCode::F(5) => Command::Refresh,
        KeyCode::Char('o') => Command::OpenFolder,
        KeyCode::Char('?') => Command::ShowHelp,
        _ => Command::Noop,
    }
}

fn handle_help_mode(_key: KeyEvent) -> Command {
    // Any key closes help
    Command::HideHelp
}

fn handle_path_input_mode(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Esc => Command::CancelPath,
        KeyCode::Enter => Command::ConfirmPath,
        KeyCode::Backspace => Command::PathBackspace,
        KeyCode::Char(c) if !c.is_control() => Command::PathInput(c),
        _ => Command::Noop,
    }
}

fn handle_confirm_mode(key: KeyEvent) -> Command {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Command::Confirm,
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Command::Cancel,
        _ => Command::Noop,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    #[test]
    fn test_normal_mode_actions() {
        let mode = InputMode::Normal;

        assert_eq!(handle_key(key_event(KeyCode::Char('q')), &mode), Command::Quit);
        assert_eq!(handle_key(key_event(KeyCode::Char('p')), &mode), Command::PickVolume);
        assert_eq!(handle_key(key_event(KeyCode::Char('e')), &mode), Command::Eject);
        assert_eq!(handle_key(key_event(KeyCode::Char('t')), &mode), Command::ToggleTheme);
        assert_eq!(handle_key(key_event(KeyCode::Char('r')), &mode), Command::Refresh);
        assert_eq!(handle_key(key_event(KeyCode::Char('o')), &mode), Command::OpenFolder);
        assert_eq!(handle_key(key_event(KeyCode::Char('?')), &mode), Command::ShowHelp);
        assert_eq!(handle_key(key_event(KeyCode::F(1)), &mode), Command::Noop);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(handle_key(key, &InputMode::Normal), Command::Quit);
    }

    #[test]
    fn test_path_input_mode() {
        let mode = InputMode::PathInput;

        assert_eq!(handle_key(key_event(KeyCode::Esc), &mode), Command::CancelPath);
        assert_eq!(handle_key(key_event(KeyCode::Enter), &mode), Command::ConfirmPath);
        assert_eq!(handle_key(key_event(KeyCode::Backspace), &mode), Command::PathBackspace);
        // Letters that are actions in normal mode are plain input here.
        assert_eq!(handle_key(key_event(KeyCode::Char('q')), &mode), Command::PathInput('q'));
        assert_eq!(handle_key(key_event(KeyCode::Char('/')), &mode), Command::PathInput('/'));
        assert_eq!(handle_key(key_event(KeyCode::Char(' ')), &mode), Command::PathInput(' '));
    }

    #[test]
    fn test_confirm_mode() {
        let mode = InputMode::Confirm;

        assert_eq!(handle_key(key_event(KeyCode::Char('y')), &mode), Command::Confirm);
        assert_eq!(handle_key(key_event(KeyCode::Char('Y')), &mode), Command::Confirm);
        assert_eq!(handle_key(key_event(KeyCode::Enter), &mode), Command::Confirm);

        assert_eq!(handle_key(key_event(KeyCode::Char('n')), &mode), Command::Cancel);
        assert_eq!(handle_key(key_event(KeyCode::Esc), &mode), Command::Cancel);

        assert_eq!(handle_key(key_event(KeyCode::Char('q')), &mode), Command::Noop);
    }

    #[test]
    fn test_help_mode_any_key_closes() {
        let mode = InputMode::Help;
        assert_eq!(handle_key(key_event(KeyCode::Char('x')), &mode), Command::HideHelp);
        assert_eq!(handle_key(key_event(KeyCode::Esc), &mode), Command::HideHelp);
    }
}
