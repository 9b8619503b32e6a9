mod app;
mod canvas;
mod keycap;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use directories::ProjectDirs;
use keycast_core::{event_channel, keyboard_hook, Settings};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use winit::event_loop::EventLoop;

#[derive(Parser, Debug)]
#[command(name = "keycast", version, about = "Shows your keystrokes as keycaps on screen")]
struct Cli {
    /// Settings file (JSON). Defaults to the per-user config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective settings and exit
    #[arg(long)]
    print_config: bool,

    /// -v for debug output, -vv for trace
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = load_settings(cli.config.as_deref(), default_settings_path())?;
    if cli.print_config {
        println!("{}", settings.to_json_pretty()?);
        return Ok(());
    }

    let compositor =
        keycap::KeycapCompositor::new(&settings).context("failed to prepare keycap tiles")?;

    let (sink, events) = event_channel(settings.event_queue_capacity);
    let capture = keyboard_hook::start_capture(sink).context("failed to start keyboard capture")?;

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let mut app = app::App::new(settings, compositor, events, capture);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    app.finish()?;
    info!("Bye.");
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

fn default_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "keycast").map(|dirs| dirs.config_dir().join("settings.json"))
}

/// `explicit` wins and must load; otherwise `default_path` is used when the
/// file exists; otherwise built-in defaults.
fn load_settings(explicit: Option<&Path>, default_path: Option<PathBuf>) -> Result<Settings> {
    if let Some(path) = explicit {
        return load_settings_file(path);
    }
    match default_path {
        Some(path) if path.exists() => load_settings_file(&path),
        _ => {
            info!("No settings file, using defaults");
            Ok(Settings::default())
        }
    }
}

fn load_settings_file(path: &Path) -> Result<Settings> {
    info!("Loading settings from {}", path.display());
    Settings::load(path).with_context(|| format!("failed to load settings from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn explicit_file_wins_over_default_path() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("explicit.json");
        let default = dir.path().join("settings.json");
        fs::write(&explicit, r#"{ "max_strokes": 7 }"#).unwrap();
        fs::write(&default, r#"{ "max_strokes": 2 }"#).unwrap();

        let settings = load_settings(Some(&explicit), Some(default)).unwrap();
        assert_eq!(settings.max_strokes, 7);
    }

    #[test]
    fn missing_explicit_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("nope.json");
        let default = dir.path().join("settings.json");
        fs::write(&default, "{}").unwrap();

        let err = load_settings(Some(&explicit), Some(default)).unwrap_err();
        assert!(format!("{err:#}").contains("nope.json"));
    }

    #[test]
    fn invalid_explicit_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("bad.json");
        fs::write(&explicit, r#"{ "fps": 0 }"#).unwrap();

        assert!(load_settings(Some(&explicit), None).is_err());
    }

    #[test]
    fn existing_default_path_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("settings.json");
        fs::write(&default, r#"{ "fps": 30 }"#).unwrap();

        let settings = load_settings(None, Some(default)).unwrap();
        assert_eq!(settings.fps, 30);
    }

    #[test]
    fn missing_default_path_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join("settings.json");

        assert_eq!(load_settings(None, Some(default)).unwrap(), Settings::default());
        assert_eq!(load_settings(None, None).unwrap(), Settings::default());
    }
}
