use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::design::Strategy;

fn default_socket_path() -> PathBuf {
    PathBuf::from("conjointd.sock")
}

fn default_total_rounds() -> u32 {
    5
}

fn default_strategy() -> Strategy {
    Strategy::Balanced
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/conjointd")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_logging_rotation() -> LoggingRotation {
    LoggingRotation::Daily
}

fn default_logging_retention_days() -> usize {
    14
}

fn default_enabled_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LoggingRotation {
    Daily,
    Hourly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_logging_rotation")]
    pub rotation: LoggingRotation,
    #[serde(default = "default_logging_retention_days")]
    pub retention_days: usize,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            rotation: default_logging_rotation(),
            retention_days: default_logging_retention_days(),
            stderr_warn_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,
    #[serde(default = "default_total_rounds")]
    pub total_rounds: u32,
    #[serde(default = "default_strategy")]
    pub strategy: Strategy,
    /// JSON file with the attribute definitions; the built-in job catalog
    /// is used when absent.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            total_rounds: default_total_rounds(),
            strategy: default_strategy(),
            catalog_path: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("failed to read {}", config_path.display()))?;
        let mut config: Config = json5::from_str(&content)
            .with_context(|| format!("failed to parse {}", config_path.display()))?;

        if config.total_rounds == 0 {
            return Err(anyhow!("total_rounds must be at least 1"));
        }

        let config_base = config_path.parent().unwrap_or_else(|| Path::new("."));
        if !config.socket_path.is_absolute() {
            config.socket_path = config_base.join(&config.socket_path);
        }
        if let Some(catalog_path) = &config.catalog_path {
            if !catalog_path.is_absolute() {
                config.catalog_path = Some(config_base.join(catalog_path));
            }
        }
        if !config.logging.dir.is_absolute() {
            config.logging.dir = config_base.join(&config.logging.dir);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::Config;
    use crate::design::Strategy;

    #[test]
    fn defaults_choose_balanced_strategy_and_five_rounds() {
        let config = Config::default();
        assert_eq!(config.strategy, Strategy::Balanced);
        assert_eq!(config.total_rounds, 5);
    }

    #[test]
    fn strategy_names_parse_in_kebab_case() {
        let parsed: Strategy =
            serde_json::from_str("\"full-factorial\"").expect("strategy should parse");
        assert_eq!(parsed, Strategy::FullFactorial);
        let parsed: Strategy =
            serde_json::from_str("\"d-optimal\"").expect("strategy should parse");
        assert_eq!(parsed, Strategy::DOptimal);
    }
}
