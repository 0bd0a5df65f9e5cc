use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{HearthError, HearthResult};

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_STATE_PATH: &str = ".hearth/state.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = HearthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(HearthError::Config(format!(
                "unknown log format '{other}' (expected text or json)"
            ))),
        }
    }
}

/// Runtime configuration. Values come from the environment first, then the
/// optional TOML file, then built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding `events.json`, `communities.json` and `locations.json`.
    pub data_dir: PathBuf,
    /// File backing the persisted filter state.
    pub state_path: PathBuf,
    pub page_size: usize,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            page_size: DEFAULT_PAGE_SIZE,
            log_format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from environment variables only.
    pub fn from_env() -> HearthResult<Self> {
        Self::resolve(None, |key| env::var(key).ok())
    }

    /// Layer environment variables over a parsed config file.
    pub fn from_env_with_file(file: FileConfig) -> HearthResult<Self> {
        Self::resolve(Some(file), |key| env::var(key).ok())
    }

    pub fn resolve(
        file: Option<FileConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> HearthResult<Self> {
        let file = file.unwrap_or_default();
        let defaults = Config::default();

        let data_dir = lookup("HEARTH_DATA_DIR")
            .map(PathBuf::from)
            .or(file.data.dir)
            .unwrap_or(defaults.data_dir);

        let state_path = lookup("HEARTH_STATE_PATH")
            .map(PathBuf::from)
            .or(file.state.path)
            .unwrap_or(defaults.state_path);

        let page_size = match lookup("HEARTH_PAGE_SIZE") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|_| {
                HearthError::Config(format!("HEARTH_PAGE_SIZE must be a number, got '{raw}'"))
            })?,
            None => file.paging.page_size.unwrap_or(defaults.page_size),
        };
        if page_size == 0 {
            return Err(HearthError::Config(
                "page size must be greater than zero".to_string(),
            ));
        }

        let log_format = match lookup("HEARTH_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => file.logging.format.unwrap_or(defaults.log_format),
        };

        Ok(Self {
            data_dir,
            state_path,
            page_size,
            log_format,
        })
    }
}

/// TOML-backed configuration loaded from disk. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub paging: PagingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> anyhow::Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = Config::resolve(None, lookup_from(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.page_size, 20);
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = toml::from_str(
            r#"
            [data]
            dir = "/srv/directory"

            [paging]
            page_size = 50
            "#,
        )
        .unwrap();

        let config =
            Config::resolve(Some(file), lookup_from(&[("HEARTH_PAGE_SIZE", "10")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/directory"));
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn malformed_page_size_is_config_error() {
        let err = Config::resolve(None, lookup_from(&[("HEARTH_PAGE_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, HearthError::Config(_)));

        let err = Config::resolve(None, lookup_from(&[("HEARTH_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, HearthError::Config(_)));
    }

    #[test]
    fn log_format_parses_case_insensitively() {
        let config =
            Config::resolve(None, lookup_from(&[("HEARTH_LOG_FORMAT", "JSON")])).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let parsed: Result<FileConfig, _> = toml::from_str("[paging]\nper_page = 5\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn load_config_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hearth.toml");
        std::fs::write(&path, "[logging]\nformat = \"json\"\n[state]\npath = \"s.json\"\n").unwrap();

        let file = load_config(&path).unwrap();
        assert_eq!(file.logging.format, Some(LogFormat::Json));
        assert_eq!(file.state.path, Some(PathBuf::from("s.json")));

        assert!(load_config(&dir.path().join("missing.toml")).is_err());
    }
}
