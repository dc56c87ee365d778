//! Sentinel Scan - AI-assisted URL and file risk scanner
//!
//! Submits a URL or a small file to a generative-AI oracle, validates the
//! structured risk report it returns, and keeps a short local history of
//! past scans. All risk judgment is delegated to the oracle.

pub mod cli;
pub mod database;
pub mod engine;
pub mod logging;
pub mod oracle;
pub mod terminal;

#[cfg(test)]
pub mod test_utils;

/// Re-export commonly used types
pub use database::{Database, HistoryStore, KeyValueStore, MemoryStore};
pub use engine::{RiskLevel, ScanError, ScanOrchestrator, ScanResult, ScanTarget};
pub use oracle::{GeminiOracle, Oracle};
pub use terminal::TerminalServer;

use std::path::PathBuf;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub database_path: PathBuf,
    pub request_timeout_secs: u64,
    pub max_file_bytes: u64,
    pub history_limit: usize,
    pub terminal_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base_url: oracle::gemini::DEFAULT_API_BASE.to_string(),
            model: oracle::gemini::DEFAULT_MODEL.to_string(),
            database_path: data_directory().join("sentinel.db"),
            request_timeout_secs: 60,
            max_file_bytes: engine::payload::DEFAULT_MAX_FILE_BYTES,
            history_limit: database::HISTORY_LIMIT,
            terminal_port: 8080,
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        config.api_key = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY"));
        if let Some(base) = lookup("SENTINEL_API_BASE") {
            config.api_base_url = base;
        }
        if let Some(model) = lookup("SENTINEL_MODEL") {
            config.model = model;
        }
        if let Some(path) = lookup("SENTINEL_DATABASE") {
            config.database_path = PathBuf::from(path);
        }
        if let Some(port) = lookup("SENTINEL_PORT").and_then(|p| p.parse().ok()) {
            config.terminal_port = port;
        }
        config
    }
}

/// Per-user data directory holding the history database
pub fn data_directory() -> PathBuf {
    #[cfg(windows)]
    {
        std::env::var("LOCALAPPDATA")
            .map(|p| PathBuf::from(p).join("Sentinel"))
            .unwrap_or_else(|_| PathBuf::from("Sentinel"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("XDG_DATA_HOME")
            .map(PathBuf::from)
            .or_else(|_| {
                std::env::var("HOME").map(|h| PathBuf::from(h).join(".local").join("share"))
            })
            .map(|p| p.join("sentinel-scan"))
            .unwrap_or_else(|_| PathBuf::from(".sentinel-scan"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert_eq!(config.max_file_bytes, 5 * 1024 * 1024);
        assert_eq!(config.history_limit, 10);
        assert!(config.database_path.ends_with("sentinel.db"));
    }

    #[test]
    fn test_environment_overrides() {
        let config = config_from(&[
            ("API_KEY", "fallback"),
            ("SENTINEL_MODEL", "gemini-2.5-pro"),
            ("SENTINEL_DATABASE", "/tmp/s.db"),
            ("SENTINEL_PORT", "9090"),
        ]);
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.database_path, PathBuf::from("/tmp/s.db"));
        assert_eq!(config.terminal_port, 9090);
    }

    #[test]
    fn test_gemini_key_wins_and_blank_is_ignored() {
        let config = config_from(&[("GEMINI_API_KEY", "primary"), ("API_KEY", "fallback")]);
        assert_eq!(config.api_key.as_deref(), Some("primary"));

        let config = config_from(&[("GEMINI_API_KEY", "  "), ("SENTINEL_PORT", "not-a-port")]);
        assert_eq!(config.api_key, None);
        assert_eq!(config.terminal_port, 8080);
    }
}
