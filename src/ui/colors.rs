//! Color schemes for the terminal front-end.
//!
//! The chart colors are shared by both themes so that used and free space
//! look the same as in the window.

use ratatui::style::Color;

use crate::config::Theme;
use crate::volume::Severity;

/// Used space on every chart (#FF5722)
pub const USED_COLOR: Color = Color::Rgb(0xFF, 0x57, 0x22);
/// Free space on every chart (#4CAF50)
pub const FREE_COLOR: Color = Color::Rgb(0x4C, 0xAF, 0x50);

/// Color scheme for the DaSifA TUI.
#[derive(Debug, Clone)]
pub struct ColorScheme {
    // Chart colors
    /// Used portion of a gauge
    pub used: Color,
    /// Free portion of a gauge
    pub free: Color,

    // Text colors
    /// Primary text color
    pub text: Color,
    /// Dimmed/secondary text color
    pub text_dim: Color,
    /// Border color for panels/frames
    pub border: Color,

    // Header colors
    pub header_fg: Color,
    pub header_bg: Color,
    /// Accent color for titles
    pub accent: Color,
    /// Path display color
    pub path_fg: Color,
    /// Hint text color
    pub hint_fg: Color,

    // Status bar colors
    pub status_fg: Color,
    pub status_bg: Color,
    /// Key shortcut color
    pub key_fg: Color,
    /// Path input color
    pub input_fg: Color,
    pub info_fg: Color,
    pub warning_fg: Color,
    pub error_fg: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::light()
    }
}

impl ColorScheme {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    /// Dark theme for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            used: USED_COLOR,
            free: FREE_COLOR,

            // Text
            text: Color::Rgb(248, 248, 242), // Off-white
            text_dim: Color::Rgb(136, 136, 136), // Medium gray
            border: Color::Rgb(98, 114, 164), // Muted purple-blue

            // Header
            header_fg: Color::Rgb(248, 248, 242),
            header_bg: Color::Rgb(40, 42, 54), // Dark background
            accent: Color::Rgb(255, 138, 101), // Light deep orange
            path_fg: Color::Rgb(139, 233, 253), // Cyan for paths
            hint_fg: Color::Rgb(98, 114, 164),

            // Status bar
            status_fg: Color::Rgb(248, 248, 242),
            status_bg: Color::Rgb(68, 71, 90),
            key_fg: Color::Rgb(255, 184, 108), // Orange for keys
            input_fg: Color::Rgb(139, 233, 253),
            info_fg: Color::Rgb(80, 250, 123),
            warning_fg: Color::Rgb(255, 184, 108),
            error_fg: Color::Rgb(255, 85, 85),
        }
    }

    /// Light theme, the default.
    pub fn light() -> Self {
        Self {
            used: USED_COLOR,
            free: FREE_COLOR,

            // Text
            text: Color::Rgb(30, 30, 30), // Near black
            text_dim: Color::Rgb(100, 100, 100), // Dark gray
            border: Color::Rgb(80, 80, 120), // Muted blue-gray

            // Header
            header_fg: Color::Rgb(30, 30, 30),
            header_bg: Color::Rgb(230, 230, 235), // Light gray background
            accent: Color::Rgb(191, 54, 12), // Dark deep orange
            path_fg: Color::Rgb(0, 100, 150), // Dark cyan for paths
            hint_fg: Color::Rgb(120, 120, 140),

            // Status bar
            status_fg: Color::Rgb(30, 30, 30),
            status_bg: Color::Rgb(210, 210, 220),
            key_fg: Color::Rgb(180, 100, 50), // Brown for keys
            input_fg: Color::Rgb(0, 100, 150),
            info_fg: Color::Rgb(22, 130, 80),
            warning_fg: Color::Rgb(180, 100, 50),
            error_fg: Color::Rgb(180, 30, 30),
        }
    }

    pub fn severity_color(&self, severity: Severity) -> Color {
        match severity {
            Severity::Info => self.info_fg,
            Severity::Warning => self.warning_fg,
            Severity::Error => self.error_fg,
        }
    }
}
