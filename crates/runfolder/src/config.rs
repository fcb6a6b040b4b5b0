//! Configuration for the runfolder service
//!
//! The service reads the same keys as the arteria `app.config` file:
//!
//! ```yaml
//! monitored_directories:
//!   - /data/sequencing/runfolders
//! completed_marker_grace_minutes: 10
//! can_create_runfolder: false
//! ```

use crate::error::{Result, RunfolderError};
use crate::paths::absolute_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration for the runfolder service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunfolderConfig {
    /// Directories whose immediate subdirectories are runfolders
    pub monitored_directories: Vec<PathBuf>,

    /// Minimum age of the completion marker before a runfolder is READY.
    /// Fractions of a minute are allowed.
    #[serde(default)]
    pub completed_marker_grace_minutes: f64,

    /// Enables the test provisioning actions (create runfolder, add marker)
    #[serde(default)]
    pub can_create_runfolder: bool,

    /// Host name reported in records (defaults to the local host name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
}

impl RunfolderConfig {
    pub fn new<I, P>(monitored_directories: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            monitored_directories: monitored_directories.into_iter().map(Into::into).collect(),
            completed_marker_grace_minutes: 0.0,
            can_create_runfolder: false,
            hostname: None,
        }
    }

    pub fn with_grace_minutes(mut self, minutes: f64) -> Self {
        self.completed_marker_grace_minutes = minutes;
        self
    }

    pub fn with_create_enabled(mut self, enabled: bool) -> Self {
        self.can_create_runfolder = enabled;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Load configuration from a YAML (`.yaml`, `.yml`, `.config`) or TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RunfolderError::Configuration(format!("Cannot read {}: {}", path.display(), e))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: RunfolderConfig = serde_yaml::from_str(content)
            .map_err(|e| RunfolderError::Configuration(e.to_string()))?;
        config.resolve()
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunfolderConfig =
            toml::from_str(content).map_err(|e| RunfolderError::Configuration(e.to_string()))?;
        config.resolve()
    }

    /// Validate the grace period and resolve monitored directories to
    /// absolute, normalized paths.
    ///
    /// Idempotent; called eagerly at load time so that every later check
    /// compares against the same roots.
    pub fn resolve(mut self) -> Result<Self> {
        let grace = self.completed_marker_grace_minutes;
        if !grace.is_finite() || grace < 0.0 {
            return Err(RunfolderError::Configuration(format!(
                "completed_marker_grace_minutes must be a non-negative number, got {}",
                grace
            )));
        }
        self.monitored_directories = self
            .monitored_directories
            .iter()
            .map(|dir| {
                absolute_path(dir).map_err(|e| {
                    RunfolderError::Configuration(format!(
                        "Cannot resolve monitored directory {}: {}",
                        dir.display(),
                        e
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self)
    }
}
