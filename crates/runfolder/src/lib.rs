//! Arteria Runfolder - sequencing runfolder state monitoring
//!
//! Watches a set of monitored directories. Each immediate subdirectory is a
//! runfolder written by a sequencing instrument, and its lifecycle state is
//! derived from the filesystem on every query.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │  Directory   │     │  Instrument  │     │  Readiness   │
//! │   Catalog    │────▶│  (metadata → │────▶│  (override / │
//! │ (enumerate)  │     │   marker)    │     │   marker)    │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!         ▲
//!         │
//! ┌──────────────┐
//! │  Runfolder   │  list / get / next / create / mark-ready / set-state
//! │   Service    │
//! └──────────────┘
//! ```
//!
//! # Core Concepts
//!
//! - **Runfolder**: Directory produced by one sequencing run
//! - **Completion marker**: Empty file the instrument writes when done
//!   (`RTAComplete.txt` or `CopyComplete.txt`, depending on the model)
//! - **Override state**: Explicit state stored in `.arteria/state`

pub mod catalog;
pub mod config;
pub mod error;
pub mod instrument;
pub mod metadata;
pub mod paths;
pub mod readiness;
pub mod run_parameters;
pub mod service;
pub mod types;

// Re-exports for convenience
pub use catalog::{DirectoryCatalog, Runfolders};
pub use config::RunfolderConfig;
pub use error::{Result, RunfolderError};
pub use instrument::InstrumentVariant;
pub use readiness::ReadinessEvaluator;
pub use run_parameters::RunParameters;
pub use service::{RunfolderService, RunfolderSettings};
pub use types::{RunfolderRecord, RunfolderState, StateFilter, SERVICE_VERSION};
