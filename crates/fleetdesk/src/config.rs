//! Configuration management for fleetdesk.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "fleetdesk";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "fleet.db";

/// Valid range for `notices.utc_offset_hours`.
const UTC_OFFSET_RANGE: std::ops::RangeInclusive<i32> = -12..=14;

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FLEETDESK_`)
/// 2. TOML config file at `~/.config/fleetdesk/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Rental lifecycle configuration.
    pub rentals: RentalConfig,
    /// Notice derivation configuration.
    pub notices: NoticeConfig,
    /// Backup hook configuration.
    pub backup: BackupConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/fleetdesk/fleet.db`
    pub database_path: Option<PathBuf>,
}

/// Rental lifecycle switches. Both default to off, which keeps the lenient
/// behavior operators are used to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RentalConfig {
    /// Reject new rentals for cars that are not available.
    pub require_available_car: bool,
    /// Report unknown rental ids on status change and delete instead of
    /// treating them as no-ops.
    pub strict_not_found: bool,
}

/// Notice-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticeConfig {
    /// Offset from UTC, in hours, of the agency's calendar day.
    pub utc_offset_hours: i32,
}

/// Backup hook configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupConfig {
    /// Emit a JSON snapshot of every saved rental and client as a debug event.
    pub log_snapshots: bool,
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `FLEETDESK_`)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("FLEETDESK_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if !UTC_OFFSET_RANGE.contains(&self.notices.utc_offset_hours) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "utc_offset_hours ({}) must be between {} and {}",
                    self.notices.utc_offset_hours,
                    UTC_OFFSET_RANGE.start(),
                    UTC_OFFSET_RANGE.end()
                ),
            });
        }

        if let Some(path) = &self.storage.database_path {
            if path.as_os_str().is_empty() {
                return Err(Error::ConfigValidation {
                    message: "database_path must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// The agency's current calendar day.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        (Utc::now() + Duration::hours(i64::from(self.notices.utc_offset_hours))).date_naive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert!(!config.rentals.require_available_car);
        assert!(!config.rentals.strict_not_found);
        assert_eq!(config.notices.utc_offset_hours, 0);
        assert!(!config.backup.log_snapshots);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_offset_out_of_range() {
        let mut config = Config::default();
        config.notices.utc_offset_hours = 15;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("utc_offset_hours"));

        config.notices.utc_offset_hours = -12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::new());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("database_path"));
    }

    #[test]
    fn test_database_path_default() {
        let config = Config::default();
        assert!(config.database_path().to_string_lossy().contains("fleet.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_today_applies_offset() {
        let mut config = Config::default();
        let utc_today = Utc::now().date_naive();
        assert!((config.today() - utc_today).num_days().abs() <= 1);

        config.notices.utc_offset_hours = 14;
        assert!(config.today() >= utc_today);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("fleetdesk"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "fleetdesk_config_test_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[rentals]\nrequire_available_car = true\n\n[notices]\nutc_offset_hours = 1\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert!(config.rentals.require_available_car);
        assert!(!config.rentals.strict_not_found);
        assert_eq!(config.notices.utc_offset_hours, 1);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_every_section_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "fleetdesk_config_sections_{}.toml",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "[storage]\ndatabase_path = \"/srv/fleet/fleet.db\"\n\n\
             [rentals]\nstrict_not_found = true\n\n\
             [notices]\nutc_offset_hours = 3\n\n\
             [backup]\nlog_snapshots = true\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(config.database_path(), PathBuf::from("/srv/fleet/fleet.db"));
        assert!(config.rentals.strict_not_found);
        assert!(!config.rentals.require_available_car);
        assert_eq!(config.notices.utc_offset_hours, 3);
        assert!(config.backup.log_snapshots);
    }

    #[test]
    fn test_rental_config_deserialize() {
        let json = r#"{"strict_not_found": true}"#;
        let rentals: RentalConfig = serde_json::from_str(json).unwrap();
        assert!(rentals.strict_not_found);
        assert!(!rentals.require_available_car);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("require_available_car"));
        assert!(json.contains("utc_offset_hours"));
    }
}
