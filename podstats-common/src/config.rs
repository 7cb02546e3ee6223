//! Bootstrap configuration and settings resolution
//!
//! Settings are resolved per field in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unparsable TOML file never stops the program. It is
//! reported with a warning and the remaining tiers are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Environment variable overriding the store location
pub const ENV_DATABASE: &str = "PODSTATS_DATABASE";
/// Environment variable overriding the audit ledger directory
pub const ENV_LOG_DIR: &str = "PODSTATS_LOG_DIR";
/// Environment variable overriding the dedup policy
pub const ENV_DEDUP_POLICY: &str = "PODSTATS_DEDUP_POLICY";
/// Environment variable pointing at a TOML config file
pub const ENV_CONFIG: &str = "PODSTATS_CONFIG";

pub const DEFAULT_DATABASE_PATH: &str = "data/podcasts.db";
pub const DEFAULT_LOG_DIR: &str = "logs";
/// Path fragment every legitimate download-log URL contains
pub const DEFAULT_UPLOAD_MARKER: &str = "/wp-content/uploads";

/// How records sharing a `(url, sheet)` key are collapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DedupPolicy {
    /// First record seen is persisted, later ones are logged verbatim
    #[default]
    KeepFirst,
    /// Counts and total bandwidth are summed, average bandwidth averaged
    Aggregate,
}

impl DedupPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DedupPolicy::KeepFirst => "keep-first",
            DedupPolicy::Aggregate => "aggregate",
        }
    }
}

impl fmt::Display for DedupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DedupPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "keep-first" | "first" => Ok(DedupPolicy::KeepFirst),
            "aggregate" | "sum" => Ok(DedupPolicy::Aggregate),
            other => Err(Error::Config(format!(
                "Unknown dedup policy '{}' (expected 'keep-first' or 'aggregate')",
                other
            ))),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Path to the SQLite store
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory receiving duplicate/skip ledgers
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    #[serde(default)]
    pub import: ImportConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// `[import]` table
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub dedup_policy: Option<DedupPolicy>,

    #[serde(default)]
    pub upload_marker: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Read and parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }

    /// Load the config file if one can be found, otherwise defaults
    ///
    /// An explicitly named file that cannot be read is warned about rather
    /// than treated as fatal.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = config_file_path(explicit) else {
            debug!("No config file found, using defaults");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded config file");
                config
            }
            Err(e) => {
                warn!("Ignoring config file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Locate the config file: explicit path, then `PODSTATS_CONFIG`, then the
/// platform config directory (`~/.config/podstats/config.toml` on Linux)
pub fn config_file_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(ENV_CONFIG) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir()
        .map(|d| d.join("podstats").join("config.toml"))
        .filter(|p| p.exists())
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub database: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub dedup_policy: Option<DedupPolicy>,
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    pub dedup_policy: DedupPolicy,
    pub upload_marker: String,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            dedup_policy: DedupPolicy::default(),
            upload_marker: DEFAULT_UPLOAD_MARKER.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Resolve settings from all tiers
///
/// Fails only when an environment variable carries an invalid value.
pub fn resolve_settings(cli: &CliOverrides, toml_config: &TomlConfig) -> Result<Settings> {
    let defaults = Settings::default();

    let database_path = cli
        .database
        .clone()
        .or_else(|| env_path(ENV_DATABASE))
        .or_else(|| toml_config.database_path.clone())
        .unwrap_or(defaults.database_path);

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| env_path(ENV_LOG_DIR))
        .or_else(|| toml_config.log_dir.clone())
        .unwrap_or(defaults.log_dir);

    let env_policy = match std::env::var(ENV_DEDUP_POLICY) {
        Ok(value) if !value.trim().is_empty() => Some(value.parse::<DedupPolicy>()?),
        _ => None,
    };

    let dedup_policy = cli
        .dedup_policy
        .or(env_policy)
        .or(toml_config.import.dedup_policy)
        .unwrap_or(defaults.dedup_policy);

    let upload_marker = toml_config
        .import
        .upload_marker
        .clone()
        .filter(|m| !m.trim().is_empty())
        .unwrap_or(defaults.upload_marker);

    Ok(Settings {
        database_path,
        log_dir,
        dedup_policy,
        upload_marker,
        logging: toml_config.logging.clone(),
    })
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_parse_accepts_spellings() {
        assert_eq!("keep-first".parse::<DedupPolicy>().unwrap(), DedupPolicy::KeepFirst);
        assert_eq!("Keep_First".parse::<DedupPolicy>().unwrap(), DedupPolicy::KeepFirst);
        assert_eq!(" aggregate ".parse::<DedupPolicy>().unwrap(), DedupPolicy::Aggregate);
        assert!("newest".parse::<DedupPolicy>().is_err());
    }

    #[test]
    fn test_policy_display_round_trips() {
        for policy in [DedupPolicy::KeepFirst, DedupPolicy::Aggregate] {
            assert_eq!(policy.to_string().parse::<DedupPolicy>().unwrap(), policy);
        }
    }

    #[test]
    fn test_toml_sections_parse() {
        let config: TomlConfig = toml::from_str(
            r#"
            database_path = "/srv/podcasts.db"

            [import]
            dedup_policy = "aggregate"

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/srv/podcasts.db")));
        assert_eq!(config.import.dedup_policy, Some(DedupPolicy::Aggregate));
        assert_eq!(config.import.upload_marker, None);
        assert_eq!(config.logging.level, "debug");
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn test_empty_toml_uses_logging_default() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
    }
}
