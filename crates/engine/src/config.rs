//! Rolodex configuration via `rolodex.toml`
//!
//! On first open a default `rolodex.toml` is written into the data
//! directory. To change settings, edit the file and reopen.

use serde::{Deserialize, Serialize};
use std::path::Path;

use rolodex_core::{Error, Result};
use tracing::info;

/// Config file name placed in the rolodex data directory.
pub const CONFIG_FILE_NAME: &str = "rolodex.toml";

fn default_reindex_batch_size() -> usize {
    100
}

fn default_repair_calendar_dates() -> bool {
    true
}

fn default_min_calendar_year() -> i32 {
    1900
}

/// Configuration loaded from `rolodex.toml`.
///
/// # Example
///
/// ```toml
/// reindex_batch_size = 100
/// repair_calendar_dates = true
/// min_calendar_year = 1900
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolodexConfig {
    /// Records per batch write, and Persons per "fix all" page.
    #[serde(default = "default_reindex_batch_size")]
    pub reindex_batch_size: usize,
    /// Move calendar dates before `min_calendar_year` up to that year during a fix.
    #[serde(default = "default_repair_calendar_dates")]
    pub repair_calendar_dates: bool,
    /// Earliest year a calendar date may carry after repair.
    #[serde(default = "default_min_calendar_year")]
    pub min_calendar_year: i32,
}

impl Default for RolodexConfig {
    fn default() -> Self {
        Self {
            reindex_batch_size: default_reindex_batch_size(),
            repair_calendar_dates: default_repair_calendar_dates(),
            min_calendar_year: default_min_calendar_year(),
        }
    }
}

impl RolodexConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Rolodex configuration
#
# Records written per batch during a bulk re-index, and Persons handled
# per "fix all" page. Must be greater than zero.
reindex_batch_size = 100

# Repair calendar dates older than min_calendar_year while re-indexing.
repair_calendar_dates = true
min_calendar_year = 1900
"#
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `Config` if a value is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.reindex_batch_size == 0 {
            return Err(Error::Config(
                "reindex_batch_size must be greater than zero".to_string(),
            ));
        }
        if chrono::NaiveDate::from_ymd_opt(self.min_calendar_year, 1, 1).is_none() {
            return Err(Error::Config(format!(
                "min_calendar_year {} is out of range",
                self.min_calendar_year
            )));
        }
        Ok(())
    }

    /// Read, parse and validate config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RolodexConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
            info!(target: "rolodex::config", path = %path.display(), "Wrote default config");
        }
        Ok(())
    }

    /// Load `rolodex.toml` from `dir`, creating the directory and a default file as needed.
    pub fn load_or_create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(CONFIG_FILE_NAME);
        Self::write_default_if_missing(&path)?;
        Self::from_file(&path)
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
