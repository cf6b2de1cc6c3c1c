//! citelens configuration
//!
//! Loaded from a YAML file, then overridden by `CITELENS_*` environment
//! variables. Command line flags are applied last by the interface crate.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::reply::MAX_RESULTS;

/// Config file looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "citelens.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CiteLensConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub ui: UiConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Retrieval backend connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL; `/query` and `/health` are appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout (seconds). Local models answer slowly.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Rows requested per retrieval path
    #[serde(default = "default_limit_results")]
    pub limit_results: usize,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_limit_results() -> usize {
    MAX_RESULTS
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            limit_results: default_limit_results(),
        }
    }
}

/// Terminal UI preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Show the deduplicated sources sidebar
    #[serde(default = "default_true")]
    pub show_sources_panel: bool,

    /// Show result tables under assistant answers
    #[serde(default = "default_true")]
    pub show_tables: bool,

    /// Input history entries kept for ↑/↓ recall
    #[serde(default = "default_history_size")]
    pub history_size: usize,
}

fn default_true() -> bool {
    true
}

fn default_history_size() -> usize {
    100
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_sources_panel: true,
            show_tables: true,
            history_size: default_history_size(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log file used while the terminal UI owns the screen.
    pub file: Option<PathBuf>,

    /// Default filter directive, e.g. `info` or `citelens_tui=debug`.
    pub level: Option<String>,
}

impl CiteLensConfig {
    /// Load from `path`, or from `./citelens.yaml` when it exists, or fall
    /// back to defaults; environment overrides are applied in every case.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(url) = env_string("CITELENS_BASE_URL") {
            self.backend.base_url = url;
        }
        if let Some(timeout) = env_parse::<u64>("CITELENS_TIMEOUT_SECS")? {
            self.backend.timeout_secs = timeout;
        }
        if let Some(limit) = env_parse::<usize>("CITELENS_LIMIT_RESULTS")? {
            self.backend.limit_results = limit;
        }
        if let Some(show) = env_flag("CITELENS_SHOW_SOURCES")? {
            self.ui.show_sources_panel = show;
        }
        if let Some(show) = env_flag("CITELENS_SHOW_TABLES")? {
            self.ui.show_tables = show;
        }
        if let Some(file) = env_string("CITELENS_LOG_FILE") {
            self.log.file = Some(PathBuf::from(file));
        }
        if let Some(level) = env_string("CITELENS_LOG") {
            self.log.level = Some(level);
        }
        Ok(())
    }

    /// `base_url` without a trailing slash.
    pub fn backend_url(&self) -> &str {
        self.backend.base_url.trim_end_matches('/')
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match env_string(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value: raw,
            }),
    }
}

fn env_flag(key: &str) -> Result<Option<bool>, ConfigError> {
    let Some(raw) = env_string(key) else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "CITELENS_BASE_URL",
        "CITELENS_TIMEOUT_SECS",
        "CITELENS_LIMIT_RESULTS",
        "CITELENS_SHOW_SOURCES",
        "CITELENS_SHOW_TABLES",
        "CITELENS_LOG_FILE",
        "CITELENS_LOG",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn test_defaults() {
        let config = CiteLensConfig::default();
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout_secs, 120);
        assert_eq!(config.backend.limit_results, 6);
        assert!(config.ui.show_sources_panel);
        assert!(config.ui.show_tables);
        assert_eq!(config.ui.history_size, 100);
        assert!(config.log.file.is_none());
    }

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let config = CiteLensConfig::from_yaml(
            "backend:\n  base_url: http://rag.local:9000/\nui:\n  show_sources_panel: false\n",
        )
        .unwrap();
        assert_eq!(config.backend_url(), "http://rag.local:9000");
        assert_eq!(config.backend.timeout_secs, 120);
        assert!(!config.ui.show_sources_panel);
        assert_eq!(config.ui.history_size, 100);
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(
            CiteLensConfig::from_yaml("  \n").unwrap(),
            CiteLensConfig::default()
        );
    }

    #[test]
    fn test_load_from_file_with_env_override() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend:\n  timeout_secs: 30\nlog:\n  level: debug").unwrap();

        unsafe { std::env::set_var("CITELENS_BASE_URL", "http://override:1234") };
        unsafe { std::env::set_var("CITELENS_SHOW_SOURCES", "off") };
        let config = CiteLensConfig::load(Some(file.path())).unwrap();
        clear_env();

        assert_eq!(config.backend.base_url, "http://override:1234");
        assert_eq!(config.backend.timeout_secs, 30);
        assert!(!config.ui.show_sources_panel);
        assert_eq!(config.log.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_env_value_is_reported() {
        let _guard = ENV_LOCK.lock().expect("env lock poisoned");
        clear_env();

        unsafe { std::env::set_var("CITELENS_TIMEOUT_SECS", "soon") };
        let mut config = CiteLensConfig::default();
        let err = config.apply_env_overrides().unwrap_err();
        clear_env();

        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CITELENS_TIMEOUT_SECS"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = CiteLensConfig::from_file(Path::new("/nonexistent/citelens.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "backend: [not, a, map]").unwrap();
        let err = CiteLensConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
