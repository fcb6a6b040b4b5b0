//! Error types for runfolder monitoring

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Runfolder error type
#[derive(Error, Debug)]
pub enum RunfolderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Config error: {0}")]
    Configuration(String),

    #[error("The path '{}' is not being monitored", .0.display())]
    PathNotMonitored(PathBuf),

    #[error("Directory does not exist: '{}'", .0.display())]
    DirectoryDoesNotExist(PathBuf),

    #[error("The path '{}' already exists and can't be overridden", .0.display())]
    DirectoryAlreadyExists(PathBuf),

    #[error("The complete marker already exists at '{}'", .0.display())]
    CannotOverrideFile(PathBuf),

    #[error("The action '{0}' is not enabled")]
    ActionNotEnabled(String),

    #[error("The state '{0}' is not valid")]
    InvalidRunfolderState(String),

    #[error("Cannot list monitored directory '{}': {source}", path.display())]
    MonitoredDirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RunfolderError {
    /// True for errors caused by the caller's input rather than the host.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PathNotMonitored(_)
                | Self::DirectoryAlreadyExists(_)
                | Self::CannotOverrideFile(_)
                | Self::ActionNotEnabled(_)
                | Self::InvalidRunfolderState(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RunfolderError>;
