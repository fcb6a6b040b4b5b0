//! Enumeration of runfolders under the monitored roots
//!
//! Every immediate subdirectory of a monitored root is a candidate runfolder.
//! Nothing is cached: each enumeration lists the roots again and evaluates
//! every candidate from scratch, so state can change between listing a
//! directory and evaluating it.

use crate::error::{Result, RunfolderError};
use crate::instrument::InstrumentVariant;
use crate::metadata::extract_metadata;
use crate::paths::absolute_path;
use crate::readiness::ReadinessEvaluator;
use crate::run_parameters::RunParameters;
use crate::types::{RunfolderRecord, RunfolderState, StateFilter, SERVICE_VERSION};
use std::fs;
use std::path::{Path, PathBuf};
use std::slice;
use tracing::{debug, warn};

/// Runfolder candidates under a fixed set of monitored roots
#[derive(Debug, Clone)]
pub struct DirectoryCatalog {
    roots: Vec<PathBuf>,
    host: String,
    evaluator: ReadinessEvaluator,
}

impl DirectoryCatalog {
    /// `roots` must already be absolute and normalized (see `RunfolderConfig::resolve`).
    pub fn new(roots: Vec<PathBuf>, host: impl Into<String>, evaluator: ReadinessEvaluator) -> Self {
        Self {
            roots,
            host: host.into(),
            evaluator,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn evaluator(&self) -> &ReadinessEvaluator {
        &self.evaluator
    }

    /// Check that `path` is a direct child of a monitored root.
    ///
    /// The path does not need to exist. Returns the normalized absolute path.
    pub fn validate_monitored(&self, path: &Path) -> Result<PathBuf> {
        let normalized = absolute_path(path)?;
        let is_monitored = normalized.file_name().is_some()
            && normalized
                .parent()
                .is_some_and(|parent| self.roots.iter().any(|root| root == parent));
        if !is_monitored {
            warn!(
                path = %path.display(),
                monitored = ?self.roots,
                "Validation error: path is not monitored"
            );
            return Err(RunfolderError::PathNotMonitored(path.to_path_buf()));
        }
        Ok(normalized)
    }

    /// Lazily enumerate every runfolder under every root.
    pub fn enumerate(&self) -> Runfolders<'_> {
        Runfolders {
            catalog: self,
            roots: self.roots.iter(),
            entries: None,
        }
    }

    /// Records matching `filter`.
    ///
    /// A runfolder whose override file holds an unknown state matches no
    /// filter and is skipped. Every other error is passed through.
    pub fn filter_by_state(
        &self,
        filter: StateFilter,
    ) -> impl Iterator<Item = Result<RunfolderRecord>> + '_ {
        self.enumerate().filter_map(move |item| match item {
            Ok(record) => filter.matches(record.state).then_some(Ok(record)),
            Err(RunfolderError::InvalidRunfolderState(value)) => {
                debug!(%value, %filter, "Skipping runfolder with invalid state");
                None
            }
            Err(err) => Some(Err(err)),
        })
    }

    /// First READY runfolder, or `None` once the candidates are exhausted.
    pub fn first_ready(&self) -> Result<Option<RunfolderRecord>> {
        self.filter_by_state(StateFilter::Only(RunfolderState::Ready))
            .next()
            .transpose()
    }

    /// Build the record for one runfolder directory.
    pub fn describe(&self, runfolder: &Path) -> Result<RunfolderRecord> {
        let run_parameters = RunParameters::load(runfolder);
        let instrument = InstrumentVariant::resolve(run_parameters.as_ref());
        let state = self.evaluator.evaluate(runfolder, instrument.marker_file())?;
        debug!(path = %runfolder.display(), %instrument, %state, "Evaluated runfolder");

        Ok(RunfolderRecord {
            host: self.host.clone(),
            path: runfolder.to_path_buf(),
            state,
            service_version: SERVICE_VERSION.to_string(),
            metadata: extract_metadata(run_parameters.as_ref()),
        })
    }
}

/// Iterator over the runfolders of a catalog, one root listing at a time.
///
/// Order follows the directory listing and is not stable across calls. A root
/// that cannot be listed yields an error and enumeration moves on to the next
/// root.
pub struct Runfolders<'a> {
    catalog: &'a DirectoryCatalog,
    roots: slice::Iter<'a, PathBuf>,
    entries: Option<(&'a Path, fs::ReadDir)>,
}

impl Iterator for Runfolders<'_> {
    type Item = Result<RunfolderRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((root, entries)) = self.entries.as_mut() {
                match entries.next() {
                    Some(Ok(entry)) => {
                        let path = entry.path();
                        if !path.is_dir() {
                            debug!(path = %path.display(), "Skipping non-directory entry");
                            continue;
                        }
                        debug!(path = %path.display(), "Found potential runfolder");
                        return Some(self.catalog.describe(&path));
                    }
                    Some(Err(source)) => {
                        return Some(Err(RunfolderError::MonitoredDirectoryUnreadable {
                            path: root.to_path_buf(),
                            source,
                        }));
                    }
                    None => self.entries = None,
                }
            }

            let root = self.roots.next()?;
            debug!(root = %root.display(), "Checking subdirectories");
            match fs::read_dir(root) {
                Ok(entries) => self.entries = Some((root.as_path(), entries)),
                Err(source) => {
                    return Some(Err(RunfolderError::MonitoredDirectoryUnreadable {
                        path: root.clone(),
                        source,
                    }));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::RTA_COMPLETE_MARKER;
    use crate::readiness::write_override_state;
    use tempfile::TempDir;

    fn catalog(roots: &[&Path]) -> DirectoryCatalog {
        DirectoryCatalog::new(
            roots.iter().map(|root| root.to_path_buf()).collect(),
            "localhost",
            ReadinessEvaluator::default(),
        )
    }

    fn make_runfolder(root: &Path, name: &str, ready: bool) -> PathBuf {
        let path = root.join(name);
        fs::create_dir_all(&path).unwrap();
        if ready {
            fs::write(path.join(RTA_COMPLETE_MARKER), "").unwrap();
        }
        path
    }

    #[test]
    fn test_validate_direct_children_only() {
        let catalog = catalog(&[Path::new("/data/testarteria1/runfolders")]);

        assert!(catalog
            .validate_monitored(Path::new("/data/testarteria1/runfolders/runfolder1"))
            .is_ok());
        assert!(catalog
            .validate_monitored(Path::new("/data/testarteria1/runfolders/runfolder1/"))
            .is_ok());

        for path in [
            "/data/testarteria1/runfolders/runfolder1/nested",
            "/data/testarteria1/runfolders_other/runfolder1",
            "/data/testarteria1/runfolders",
            "/notmonitored/dir/",
            "/",
        ] {
            assert!(
                matches!(
                    catalog.validate_monitored(Path::new(path)),
                    Err(RunfolderError::PathNotMonitored(_))
                ),
                "{} should not be monitored",
                path
            );
        }
    }

    #[test]
    fn test_validate_returns_normalized_path() {
        let catalog = catalog(&[Path::new("/data/mon")]);
        let normalized = catalog
            .validate_monitored(Path::new("/data/other/../mon/./rf1"))
            .unwrap();
        assert_eq!(normalized, PathBuf::from("/data/mon/rf1"));
    }

    #[test]
    fn test_enumerate_lists_subdirectories_of_every_root() {
        let mon1 = TempDir::new().unwrap();
        let mon2 = TempDir::new().unwrap();
        make_runfolder(mon1.path(), "runfolder001", true);
        make_runfolder(mon2.path(), "runfolder001", false);
        fs::write(mon1.path().join("not_a_runfolder.txt"), "x").unwrap();

        let catalog = catalog(&[mon1.path(), mon2.path()]);
        let mut records: Vec<_> = catalog.enumerate().collect::<Result<_>>().unwrap();
        records.sort_by(|a, b| a.path.cmp(&b.path));
        assert_eq!(records.len(), 2);

        let ready = records
            .iter()
            .find(|r| r.path == mon1.path().join("runfolder001"))
            .unwrap();
        assert_eq!(ready.state, RunfolderState::Ready);
        assert_eq!(ready.host, "localhost");
        assert_eq!(ready.service_version, SERVICE_VERSION);
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let mon = TempDir::new().unwrap();
        make_runfolder(mon.path(), "a", false);
        let catalog = catalog(&[mon.path()]);
        assert_eq!(catalog.enumerate().count(), 1);

        make_runfolder(mon.path(), "b", false);
        assert_eq!(catalog.enumerate().count(), 2);
    }

    #[test]
    fn test_missing_root_yields_error_and_continues() {
        let mon = TempDir::new().unwrap();
        make_runfolder(mon.path(), "rf", true);
        let missing = mon.path().join("does-not-exist");
        let catalog = catalog(&[missing.as_path(), mon.path()]);

        let items: Vec<_> = catalog.enumerate().collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[0],
            Err(RunfolderError::MonitoredDirectoryUnreadable { .. })
        ));
        assert!(items[1].is_ok());
    }

    #[test]
    fn test_filter_by_state() {
        let mon = TempDir::new().unwrap();
        make_runfolder(mon.path(), "ready", true);
        make_runfolder(mon.path(), "waiting", false);
        let started = make_runfolder(mon.path(), "started", true);
        write_override_state(&started, RunfolderState::Started).unwrap();

        let catalog = catalog(&[mon.path()]);
        let count = |filter| {
            catalog
                .filter_by_state(filter)
                .collect::<Result<Vec<_>>>()
                .unwrap()
                .len()
        };
        assert_eq!(count(StateFilter::All), 3);
        assert_eq!(count(StateFilter::Only(RunfolderState::Ready)), 1);
        assert_eq!(count(StateFilter::Only(RunfolderState::Started)), 1);
        assert_eq!(count(StateFilter::Only(RunfolderState::Done)), 0);
    }

    #[test]
    fn test_invalid_override_does_not_hide_other_runfolders() {
        let mon = TempDir::new().unwrap();
        let corrupt = make_runfolder(mon.path(), "corrupt", true);
        fs::create_dir_all(corrupt.join(".arteria")).unwrap();
        fs::write(corrupt.join(".arteria").join("state"), "PROCESSING").unwrap();
        let ready = make_runfolder(mon.path(), "ready", true);

        let catalog = catalog(&[mon.path()]);
        let record = catalog.first_ready().unwrap().unwrap();
        assert_eq!(record.path, ready);

        let all: Vec<_> = catalog
            .filter_by_state(StateFilter::All)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(all.len(), 1);

        // describing the corrupt folder directly still reports the problem
        assert!(matches!(
            catalog.describe(&corrupt),
            Err(RunfolderError::InvalidRunfolderState(ref value)) if value == "PROCESSING"
        ));
    }

    #[test]
    fn test_first_ready_on_empty_catalog_is_none() {
        let mon = TempDir::new().unwrap();
        let catalog = catalog(&[mon.path()]);
        assert!(catalog.first_ready().unwrap().is_none());

        make_runfolder(mon.path(), "waiting", false);
        assert!(catalog.first_ready().unwrap().is_none());

        let catalog = catalog_without_roots();
        assert!(catalog.first_ready().unwrap().is_none());
    }

    fn catalog_without_roots() -> DirectoryCatalog {
        DirectoryCatalog::new(Vec::new(), "localhost", ReadinessEvaluator::default())
    }

    #[test]
    fn test_first_ready_finds_ready_runfolder() {
        let mon = TempDir::new().unwrap();
        make_runfolder(mon.path(), "waiting", false);
        let ready = make_runfolder(mon.path(), "ready", true);

        let record = catalog(&[mon.path()]).first_ready().unwrap().unwrap();
        assert_eq!(record.path, ready);
        assert_eq!(record.state, RunfolderState::Ready);
    }

    #[test]
    fn test_describe_attaches_metadata() {
        let mon = TempDir::new().unwrap();
        let rf = make_runfolder(mon.path(), "rf", false);
        fs::write(
            rf.join("runParameters.xml"),
            "<RunParameters><ReagentKitBarcode>ABC-123</ReagentKitBarcode></RunParameters>",
        )
        .unwrap();

        let record = catalog(&[mon.path()]).describe(&rf).unwrap();
        assert_eq!(
            record.metadata.get("reagent_kit_barcode").map(String::as_str),
            Some("ABC-123")
        );
        assert!(!record.metadata.contains_key("library_tube_barcode"));
    }
}
