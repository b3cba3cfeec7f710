mod app;
mod config;
mod export;
#[cfg(feature = "gui")]
mod gui;
mod host;
mod storage;
mod ui;
mod volume;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, Level};

use app::App;
use config::{AppConfig, Theme, DEFAULT_POLL_MS};
use export::{export_json, StorageReport, TargetReport};
use host::{removable_devices, LocalHost, PermissionFile};
use storage::{snapshot, FsStatProvider, Reading};
use ui::{handle_key, TuiState};
use volume::{FolderLayout, DEFAULT_ROOT_FOLDER};

#[derive(Parser, Debug)]
#[command(name = "dasifa")]
#[command(version)]
#[command(about = "Internal and USB storage usage with a managed USB folder", long_about = None)]
struct Args {
    /// Root whose filesystem counts as internal storage (default: $HOME)
    #[arg(long)]
    internal: Option<PathBuf>,

    /// USB volume to select at startup
    #[arg(long)]
    volume: Option<PathBuf>,

    /// Name of the managed folder created on the USB volume
    #[arg(long, default_value = DEFAULT_ROOT_FOLDER)]
    folder_name: String,

    /// Device polling interval in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_MS)]
    poll_ms: u64,

    /// Color theme (default: the last one used)
    #[arg(long, value_enum)]
    theme: Option<Theme>,

    /// Force TUI mode (default is GUI when gui feature is enabled)
    #[arg(long)]
    tui: bool,

    /// Print a JSON report of both storages and exit
    #[arg(long)]
    json: bool,

    /// More log output (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Settings directory (default: $XDG_CONFIG_HOME/dasifa)
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

impl Args {
    fn to_config(&self) -> AppConfig {
        let defaults = AppConfig::default();
        AppConfig {
            internal_root: self.internal.clone().unwrap_or(defaults.internal_root),
            initial_volume: self.volume.clone(),
            layout: FolderLayout::new(self.folder_name.clone()),
            poll_interval: Duration::from_millis(self.poll_ms),
            config_dir: self.config_dir.clone().unwrap_or(defaults.config_dir),
            theme_override: self.theme,
        }
    }

    fn log_level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.to_config();
    config.validate()?;

    // Determine if we should use GUI mode
    // GUI is default when gui feature is enabled, unless --tui flag is passed
    #[cfg(feature = "gui")]
    let use_gui = !args.tui && !args.json;
    #[cfg(not(feature = "gui"))]
    let use_gui = false;

    let use_tui = !use_gui && !args.json;
    init_logging(args.log_level(), use_tui.then(|| config.log_path()))?;

    // JSON mode - no TUI/GUI
    if args.json {
        return run_json_mode(&config);
    }

    let host = LocalHost::new(PermissionFile::load(config.permissions_path()));
    let mut app = App::new(config, host);
    app.start();
    app.register_monitor(removable_devices);
    info!("started");

    // GUI mode (default when gui feature enabled and --tui not passed)
    if use_gui {
        #[cfg(feature = "gui")]
        {
            let options = eframe::NativeOptions {
                viewport: egui::ViewportBuilder::default()
                    .with_inner_size([720.0, 520.0])
                    .with_title("DaSifA"),
                ..Default::default()
            };
            return eframe::run_native(
                "DaSifA",
                options,
                Box::new(|cc| Ok(Box::new(gui::DasifaApp::new(cc, app)))),
            )
            .map_err(|e| anyhow::anyhow!("GUI error: {}", e));
        }
    }

    run_tui_mode(app)
}

/// Log to stderr, or to `file` when the terminal belongs to the TUI.
fn init_logging(level: Level, file: Option<PathBuf>) -> Result<()> {
    let builder = tracing_subscriber::fmt().with_max_level(level);

    let result = match file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let log = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            builder.with_writer(Mutex::new(log)).with_ansi(false).try_init()
        }
        None => builder.with_writer(io::stderr).try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("could not initialise logging: {}", e))
}

fn run_json_mode(config: &AppConfig) -> Result<()> {
    let stats = FsStatProvider;
    let read = |root: &PathBuf| Reading::from_result(&snapshot(&stats, root));

    let internal = TargetReport::new(&config.internal_root, &read(&config.internal_root));
    // Without --volume, report the volume the last session kept access to
    let persisted = PermissionFile::load(config.permissions_path());
    let volume = config.initial_volume.clone().or_else(|| {
        persisted
            .handles()
            .iter()
            .rev()
            .map(|handle| handle.root().to_path_buf())
            .find(|root| root.is_dir())
    });
    let removable = volume
        .as_ref()
        .map(|volume| TargetReport::new(volume, &read(volume)));

    let report = StorageReport::new(internal, removable);
    let mut stdout = io::stdout();
    export_json(&report, &mut stdout)?;

    Ok(())
}

fn run_tui_mode(mut app: App<LocalHost>) -> Result<()> {
    // Set up panic handler to restore terminal on crash
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);

        // Call the original panic handler
        original_hook(panic_info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Clear screen to ensure clean state
    terminal.clear()?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    app.shutdown();

    // Restore terminal
    let cleanup_result = cleanup_terminal(&mut terminal);

    // Return the first error if any
    result.and(cleanup_result)
}

/// Clean up terminal state.
fn cleanup_terminal<B: ratatui::backend::Backend + Write>(terminal: &mut Terminal<B>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<LocalHost>,
) -> Result<()> {
    let mut state = TuiState::new();

    loop {
        // Drain device events, then let the prompt claim the keyboard
        app.update();
        state.sync(app);

        terminal.draw(|frame| {
            ui::render_ui(frame, app, &state);
        })?;

        // Handle input with timeout so device events still get drawn
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                // Only handle key press, not release
                if key.kind == KeyEventKind::Press {
                    let command = handle_key(key, &state.input_mode);
                    state.handle_command(app, command);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
