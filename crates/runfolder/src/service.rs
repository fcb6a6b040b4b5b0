//! Runfolder service facade
//!
//! Composes configuration, path validation, enumeration and state evaluation
//! into the operations an outer layer (HTTP handler, CLI) exposes. Every call
//! is synchronous and reads the filesystem afresh.

use crate::catalog::DirectoryCatalog;
use crate::config::RunfolderConfig;
use crate::error::{Result, RunfolderError};
use crate::instrument::InstrumentVariant;
use crate::readiness::{write_override_state, ReadinessEvaluator};
use crate::run_parameters::{RunParameters, RUN_PARAMETERS_FILE_NAMES};
use crate::types::{RunfolderRecord, RunfolderState, StateFilter};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CREATE_RUNFOLDER_ACTION: &str = "can_create_runfolder";

/// Run metadata written into runfolders created for test provisioning.
const PLACEHOLDER_RUN_PARAMETERS: &str = r#"<?xml version="1.0"?>
<RunParameters>
  <ReagentKitBarcode>PLACEHOLDER-REAGENT-KIT</ReagentKitBarcode>
  <RfidsInfo>
    <LibraryTubeSerialBarcode>PLACEHOLDER-LIBRARY-TUBE</LibraryTubeSerialBarcode>
  </RfidsInfo>
</RunParameters>
"#;

/// Effective configuration as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunfolderSettings {
    pub monitored_directories: Vec<PathBuf>,
    pub completed_marker_grace_minutes: f64,
    pub can_create_runfolder: bool,
    pub hostname: String,
}

/// Entry point for every runfolder query and mutation
#[derive(Debug, Clone)]
pub struct RunfolderService {
    config: RunfolderConfig,
    catalog: DirectoryCatalog,
}

impl RunfolderService {
    pub fn new(config: RunfolderConfig) -> Result<Self> {
        let config = config.resolve()?;
        let host = config.hostname.clone().unwrap_or_else(local_hostname);
        let catalog = DirectoryCatalog::new(
            config.monitored_directories.clone(),
            host,
            ReadinessEvaluator::new(config.completed_marker_grace_minutes),
        );
        Ok(Self { config, catalog })
    }

    pub fn config(&self) -> &RunfolderConfig {
        &self.config
    }

    pub fn catalog(&self) -> &DirectoryCatalog {
        &self.catalog
    }

    /// Lazily yield the runfolders matching `filter`.
    pub fn runfolders(
        &self,
        filter: StateFilter,
    ) -> impl Iterator<Item = Result<RunfolderRecord>> + '_ {
        self.catalog.filter_by_state(filter)
    }

    pub fn list_runfolders(&self, filter: StateFilter) -> Result<Vec<RunfolderRecord>> {
        self.runfolders(filter).collect()
    }

    /// All READY runfolders
    pub fn list_available_runfolders(&self) -> Result<Vec<RunfolderRecord>> {
        self.list_runfolders(StateFilter::Only(RunfolderState::Ready))
    }

    pub fn get_runfolder_by_path(&self, path: &Path) -> Result<RunfolderRecord> {
        let path = self.catalog.validate_monitored(path)?;
        if !path.is_dir() {
            return Err(RunfolderError::DirectoryDoesNotExist(path));
        }
        self.catalog.describe(&path)
    }

    /// The first READY runfolder found, if any.
    pub fn next_runfolder(&self) -> Result<Option<RunfolderRecord>> {
        let next = self.catalog.first_ready()?;
        match &next {
            Some(record) => info!(path = %record.path.display(), "Next runfolder"),
            None => info!("No runfolder is ready"),
        }
        Ok(next)
    }

    /// Current state of a monitored runfolder
    pub fn runfolder_state(&self, path: &Path) -> Result<RunfolderState> {
        self.get_runfolder_by_path(path).map(|record| record.state)
    }

    /// Create an empty runfolder with placeholder run metadata.
    ///
    /// Only for provisioning test environments.
    pub fn create_runfolder(&self, path: &Path) -> Result<RunfolderRecord> {
        self.require_enabled(CREATE_RUNFOLDER_ACTION, self.config.can_create_runfolder)?;
        let path = self.catalog.validate_monitored(path)?;
        if path.exists() {
            return Err(RunfolderError::DirectoryAlreadyExists(path));
        }

        fs::create_dir_all(&path)?;
        fs::write(path.join(RUN_PARAMETERS_FILE_NAMES[0]), PLACEHOLDER_RUN_PARAMETERS)?;
        info!(path = %path.display(), "Created a runfolder, intended for tests only");
        self.catalog.describe(&path)
    }

    /// Write the completion marker the runfolder's instrument would write.
    ///
    /// Only for provisioning test environments. Returns the marker path.
    pub fn add_completion_marker(&self, path: &Path) -> Result<PathBuf> {
        self.require_enabled(CREATE_RUNFOLDER_ACTION, self.config.can_create_runfolder)?;
        if !path.is_dir() {
            return Err(RunfolderError::DirectoryDoesNotExist(path.to_path_buf()));
        }

        let instrument = InstrumentVariant::resolve(RunParameters::load(path).as_ref());
        let marker = path.join(instrument.marker_file());
        if marker.exists() {
            return Err(RunfolderError::CannotOverrideFile(marker));
        }
        match OpenOptions::new().write(true).create_new(true).open(&marker) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(RunfolderError::CannotOverrideFile(marker));
            }
            Err(e) => return Err(e.into()),
        }
        info!(marker = %marker.display(), %instrument, "Added completion marker, intended for tests only");
        Ok(marker)
    }

    /// Override the state of a runfolder.
    ///
    /// The state is validated before anything touches the filesystem.
    pub fn set_state(&self, path: &Path, state: &str) -> Result<RunfolderState> {
        let state = RunfolderState::parse(state)?;
        if !path.is_dir() {
            return Err(RunfolderError::DirectoryDoesNotExist(path.to_path_buf()));
        }
        write_override_state(path, state)?;
        info!(path = %path.display(), %state, "Set runfolder state");
        Ok(state)
    }

    pub fn settings(&self) -> RunfolderSettings {
        RunfolderSettings {
            monitored_directories: self.config.monitored_directories.clone(),
            completed_marker_grace_minutes: self.config.completed_marker_grace_minutes,
            can_create_runfolder: self.config.can_create_runfolder,
            hostname: self.catalog.host().to_string(),
        }
    }

    fn require_enabled(&self, action: &str, enabled: bool) -> Result<()> {
        if enabled {
            return Ok(());
        }
        warn!(action, "Action is not enabled");
        Err(RunfolderError::ActionNotEnabled(action.to_string()))
    }
}

/// Host name of this machine, or `"unknown"`.
pub fn local_hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("HOST"))
        .ok()
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
