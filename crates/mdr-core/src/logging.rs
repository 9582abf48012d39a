//! Logging init: file under the XDG state dir, stderr fallback.

use std::fs;
use std::io;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,mdr=debug";

/// Initialize structured logging to `~/.local/state/mdr/mdr.log`.
/// Returns Err when the log location is unwritable so the caller can fall
/// back to `init_stderr`.
pub fn init() -> Result<()> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("mdr")?;
    let log_dir = xdg_dirs.get_state_home();
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("create log dir: {}", log_dir.display()))?;
    let log_path = log_dir.join("mdr.log");

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("open log file: {}", log_path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("mdr logging initialized at {}", log_path.display());
    Ok(())
}

/// Stderr-only logging, for when the log file cannot be opened.
pub fn init_stderr() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}
