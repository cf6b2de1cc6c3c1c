//! tracing subscriber setup.
//!
//! The terminal UI owns stdout, so it logs to a file. One-shot commands log
//! to stderr, and only when `--verbose` is given.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::CliError;

pub const DEFAULT_LOG_FILE: &str = "citelens.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stderr,
    File(PathBuf),
}

pub fn default_log_file() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_LOG_FILE)
}

/// Filter directive: the configured level wins over `RUST_LOG`, `info`
/// otherwise.
pub fn filter_directive(configured: Option<&str>, rust_log: Option<&str>) -> String {
    configured
        .or(rust_log)
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or("info")
        .to_string()
}

fn open_log_file(path: &Path) -> Result<std::fs::File, CliError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

pub fn init_logging(target: &LogTarget, configured_level: Option<&str>) -> Result<(), CliError> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::new(filter_directive(configured_level, rust_log.as_deref()));
    let result = match target {
        LogTarget::Off => return Ok(()),
        LogTarget::Stderr => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            fmt()
                .with_env_filter(filter)
                .with_target(true)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    result.map_err(|e| CliError::Logging(e.to_string()))
}
