//! Core types for runfolder monitoring
//!
//! A runfolder is a directory written by a sequencing instrument. Its state is
//! derived from the filesystem on every query and never cached.

use crate::error::RunfolderError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Version reported in every runfolder record.
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Runfolder State
// ============================================================================

/// Lifecycle state of a runfolder.
///
/// Only `Ready` is ever inferred from the filesystem. Every other state is
/// assigned explicitly through the `.arteria/state` override file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum RunfolderState {
    /// Not ready for processing (or nothing known yet)
    #[default]
    None,
    /// Sequencing finished, ready for processing
    Ready,
    /// Processing has started
    Started,
    /// Processing finished
    Done,
    /// Processing started but failed
    Error,
    /// Claimed by a downstream consumer, not yet started
    Pending,
}

impl RunfolderState {
    pub const ALL: [RunfolderState; 6] = [
        RunfolderState::None,
        RunfolderState::Ready,
        RunfolderState::Started,
        RunfolderState::Done,
        RunfolderState::Error,
        RunfolderState::Pending,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RunfolderState::None => "NONE",
            RunfolderState::Ready => "READY",
            RunfolderState::Started => "STARTED",
            RunfolderState::Done => "DONE",
            RunfolderState::Error => "ERROR",
            RunfolderState::Pending => "PENDING",
        }
    }

    /// Parse a state, rejecting anything outside the enumeration.
    ///
    /// Names are case-sensitive; only surrounding whitespace is ignored.
    pub fn parse(s: &str) -> Result<Self, RunfolderError> {
        match s.trim() {
            "NONE" => Ok(RunfolderState::None),
            "READY" => Ok(RunfolderState::Ready),
            "STARTED" => Ok(RunfolderState::Started),
            "DONE" => Ok(RunfolderState::Done),
            "ERROR" => Ok(RunfolderState::Error),
            "PENDING" => Ok(RunfolderState::Pending),
            _ => Err(RunfolderError::InvalidRunfolderState(s.to_string())),
        }
    }
}

impl fmt::Display for RunfolderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RunfolderState {
    type Err = RunfolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// State Filter
// ============================================================================

/// Filter applied when listing runfolders. `*` on the wire means `All`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFilter {
    All,
    Only(RunfolderState),
}

impl StateFilter {
    pub const WILDCARD: &'static str = "*";

    pub fn matches(&self, state: RunfolderState) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Only(wanted) => *wanted == state,
        }
    }

    pub fn parse(s: &str) -> Result<Self, RunfolderError> {
        if s.trim() == Self::WILDCARD {
            return Ok(StateFilter::All);
        }
        RunfolderState::parse(s).map(StateFilter::Only)
    }
}

impl Default for StateFilter {
    fn default() -> Self {
        StateFilter::Only(RunfolderState::Ready)
    }
}

impl From<RunfolderState> for StateFilter {
    fn from(state: RunfolderState) -> Self {
        StateFilter::Only(state)
    }
}

impl From<Option<RunfolderState>> for StateFilter {
    fn from(state: Option<RunfolderState>) -> Self {
        state.map_or(StateFilter::All, StateFilter::Only)
    }
}

impl fmt::Display for StateFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateFilter::All => f.write_str(Self::WILDCARD),
            StateFilter::Only(state) => write!(f, "{}", state),
        }
    }
}

impl FromStr for StateFilter {
    type Err = RunfolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// Runfolder Record
// ============================================================================

/// Snapshot of one runfolder, assembled fresh on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunfolderRecord {
    /// Host the runfolder lives on
    pub host: String,
    /// Filesystem path of the runfolder on that host
    pub path: PathBuf,
    pub state: RunfolderState,
    pub service_version: String,
    /// Optional tracking identifiers (reagent kit, library tube)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl fmt::Display for RunfolderRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}@{}", self.state, self.path.display(), self.host)
    }
}
