//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::core::errors::{FsnError, Result};
use crate::notify::NotificationConfig;

/// Full Folder Sentinel configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
#[derive(Default)]
pub struct Config {
    pub scanner: ScannerConfig,
    pub schedule: ScheduleConfig,
    pub paths: PathsConfig,
    pub notifications: NotificationConfig,
}

/// Walker behavior knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScannerConfig {
    /// Maximum recursion depth before the walker truncates a subtree.
    pub max_depth: usize,
}

/// Daily scheduled-check behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Whether the daemon runs the daily silent check at all.
    pub enabled: bool,
    /// Wall-clock time of the daily check, "HH:MM" in local time.
    pub check_time: String,
    /// Daemon loop poll interval in seconds (signal + tick granularity).
    pub poll_interval_secs: u64,
}

/// Filesystem paths used by fsn.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub state_file: PathBuf,
    pub jsonl_log: PathBuf,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self { max_depth: 5 }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_time: "16:10".to_string(),
            poll_interval_secs: 30,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[FSN-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir.join(".config").join("fsn").join("config.toml");
        let data = home_dir.join(".local").join("share").join("fsn");
        Self {
            config_file: cfg,
            state_file: data.join("state.json"),
            jsonl_log: data.join("activity.jsonl"),
        }
    }
}

impl ScheduleConfig {
    /// Parse the configured check time. Errors on anything that is not "HH:MM".
    pub fn parsed_check_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.check_time, "%H:%M").map_err(|e| FsnError::InvalidConfig {
            details: format!("schedule.check_time {:?} is not HH:MM: {e}", self.check_time),
        })
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| FsnError::StoreIo {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(FsnError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_usize("FSN_SCANNER_MAX_DEPTH", &mut self.scanner.max_depth)?;

        set_env_bool("FSN_SCHEDULE_ENABLED", &mut self.schedule.enabled)?;
        set_env_string("FSN_SCHEDULE_CHECK_TIME", &mut self.schedule.check_time);
        set_env_u64(
            "FSN_SCHEDULE_POLL_INTERVAL_SECS",
            &mut self.schedule.poll_interval_secs,
        )?;

        if let Some(path) = env::var_os("FSN_STATE_FILE") {
            self.paths.state_file = PathBuf::from(path);
        }
        if let Some(path) = env::var_os("FSN_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(path);
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        self.schedule.parsed_check_time()?;

        if self.schedule.poll_interval_secs == 0 {
            return Err(FsnError::InvalidConfig {
                details: "schedule.poll_interval_secs must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

// ──────────────────── env override helpers ────────────────────

fn set_env_string(key: &str, target: &mut String) {
    if let Ok(value) = env::var(key) {
        *target = value;
    }
}

fn set_env_u64(key: &str, target: &mut u64) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = value.parse().map_err(|_| FsnError::InvalidConfig {
            details: format!("{key}={value} is not a valid integer"),
        })?;
    }
    Ok(())
}

fn set_env_usize(key: &str, target: &mut usize) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = value.parse().map_err(|_| FsnError::InvalidConfig {
            details: format!("{key}={value} is not a valid integer"),
        })?;
    }
    Ok(())
}

fn set_env_bool(key: &str, target: &mut bool) -> Result<()> {
    if let Ok(value) = env::var(key) {
        *target = match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => {
                return Err(FsnError::InvalidConfig {
                    details: format!("{key}={value} is not a valid boolean"),
                });
            }
        };
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.scanner.max_depth, 5);
        assert_eq!(cfg.schedule.check_time, "16:10");
    }

    #[test]
    fn default_check_time_parses() {
        let cfg = Config::default();
        let time = cfg.schedule.parsed_check_time().unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(16, 10, 0).unwrap());
    }

    #[test]
    fn invalid_check_time_rejected() {
        let cfg = Config {
            schedule: ScheduleConfig {
                check_time: "25:99".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.code(), "FSN-1001");
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let cfg = Config {
            schedule: ScheduleConfig {
                poll_interval_secs: 0,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn load_missing_explicit_path_fails() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(err.code(), "FSN-1002");
    }

    #[test]
    fn load_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[scanner]\nmax_depth = 3\n\n[schedule]\ncheck_time = \"09:30\"\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.scanner.max_depth, 3);
        assert_eq!(
            cfg.schedule.parsed_check_time().unwrap(),
            NaiveTime::from_hms_opt(9, 30, 0).unwrap()
        );
        assert_eq!(cfg.paths.config_file, path);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = Config::default();
        let serialized = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn malformed_toml_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "= broken").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert_eq!(err.code(), "FSN-1003");
    }
}
