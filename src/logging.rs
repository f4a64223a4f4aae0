//! Logging setup
//!
//! Installs a `tracing` subscriber that writes to `cardshelf.log` next to the
//! executable, truncated on every run. Falls back to stderr when the file
//! cannot be opened. Filter with `CARDSHELF_LOG` (defaults to `cardshelf=info`).

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILTER_ENV: &str = "CARDSHELF_LOG";
const DEFAULT_FILTER: &str = "cardshelf=info";

/// Log file path (same directory as executable)
pub fn log_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cardshelf.log")
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the global subscriber; returns the log file when one is used.
/// Calling it again is harmless.
pub fn init() -> Option<PathBuf> {
    let path = log_path();
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true) // Start fresh each run
        .open(&path);

    match file {
        Ok(file) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init();
            Some(path)
        }
        Err(_) => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .try_init();
            None
        }
    }
}
