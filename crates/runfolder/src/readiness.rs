//! Lifecycle state of a single runfolder.
//!
//! An explicit override in `.arteria/state` always wins. Without one, a
//! runfolder is READY once its completion marker exists and is older than the
//! grace period; instruments may still be writing auxiliary files for a short
//! while after the marker appears.
//!
//! The override file is not locked. A single writer per runfolder is assumed;
//! concurrent writers race and the last write wins.

use crate::error::Result;
use crate::types::RunfolderState;
use chrono::{DateTime, Duration, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const STATE_DIR_NAME: &str = ".arteria";
pub const STATE_FILE_NAME: &str = "state";

/// `{runfolder}/.arteria/state`
pub fn state_file_path(runfolder: &Path) -> PathBuf {
    runfolder.join(STATE_DIR_NAME).join(STATE_FILE_NAME)
}

/// Read the override state. An absent or blank file means "not overridden".
pub fn read_override_state(runfolder: &Path) -> Result<Option<RunfolderState>> {
    let path = state_file_path(runfolder);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = content.trim();
    if value.is_empty() {
        return Ok(None);
    }
    RunfolderState::parse(value).map(Some).map_err(|err| {
        warn!(path = %path.display(), value, "Invalid state in override file");
        err
    })
}

/// Write the override state, creating `.arteria/` if needed.
pub fn write_override_state(runfolder: &Path, state: RunfolderState) -> Result<()> {
    fs::create_dir_all(runfolder.join(STATE_DIR_NAME))?;
    fs::write(state_file_path(runfolder), state.as_str())?;
    Ok(())
}

/// Decides the state of one runfolder from filesystem evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessEvaluator {
    grace: Duration,
}

impl ReadinessEvaluator {
    /// Negative or NaN grace periods count as zero; periods too large for a
    /// `Duration` saturate.
    pub fn new(grace_minutes: f64) -> Self {
        let millis = grace_minutes * 60_000.0;
        let grace = if millis.is_nan() || millis <= 0.0 {
            Duration::zero()
        } else if millis >= i64::MAX as f64 {
            Duration::max_value()
        } else {
            Duration::try_milliseconds(millis.round() as i64).unwrap_or_else(Duration::max_value)
        };
        Self { grace }
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    pub fn evaluate(&self, runfolder: &Path, marker_file: &str) -> Result<RunfolderState> {
        self.evaluate_at(runfolder, marker_file, Utc::now())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit current time.
    pub fn evaluate_at(
        &self,
        runfolder: &Path,
        marker_file: &str,
        now: DateTime<Utc>,
    ) -> Result<RunfolderState> {
        if let Some(state) = read_override_state(runfolder)? {
            debug!(path = %runfolder.display(), %state, "State set by override file");
            return Ok(state);
        }

        let marker = runfolder.join(marker_file);
        let state = if self.marker_is_ready(&marker, now) {
            RunfolderState::Ready
        } else {
            RunfolderState::None
        };
        debug!(path = %runfolder.display(), marker = marker_file, %state, "Inferred state from marker");
        Ok(state)
    }

    /// The marker counts once it exists and its age has reached the grace period.
    fn marker_is_ready(&self, marker: &Path, now: DateTime<Utc>) -> bool {
        let modified = match fs::metadata(marker) {
            Ok(meta) if meta.is_file() => match meta.modified() {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(_) => return false,
            },
            _ => return false,
        };
        now.signed_duration_since(modified) >= self.grace
    }
}

impl Default for ReadinessEvaluator {
    fn default() -> Self {
        Self::new(0.0)
    }
}
