//! Logging setup for the runfolder binaries.
//!
//! Logs go to a size-rotated file under the service home directory and to
//! stderr. `RUST_LOG` overrides the default filter.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const DEFAULT_LOG_FILTER: &str = "runfolder=info";
const HOME_ENV_VAR: &str = "RUNFOLDER_HOME";
const HOME_DIR_NAME: &str = ".arteria_runfolder";
const MAX_LOG_FILES: usize = 5;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration for one binary
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Mirror the file filter on stderr instead of only warnings
    pub verbose: bool,
    /// Overrides [`logs_dir`]
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with a rotating file writer and stderr output.
///
/// When the log directory cannot be created, logging continues on stderr only.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let file_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let console_filter = if config.verbose {
        file_filter.clone()
    } else {
        EnvFilter::new("warn")
    };

    let log_dir = config.log_dir.unwrap_or_else(logs_dir);
    let file_layer = match SharedRotatingWriter::new(&log_dir, config.app_name) {
        Ok(writer) => Some(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(file_filter),
        ),
        Err(err) => {
            eprintln!("Warning: file logging disabled: {:#}", err);
            None
        }
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Service home directory: `$RUNFOLDER_HOME`, else `~/.arteria_runfolder`
pub fn runfolder_home() -> PathBuf {
    if let Some(override_path) = std::env::var_os(HOME_ENV_VAR) {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(HOME_DIR_NAME)
}

/// `{home}/logs`
pub fn logs_dir() -> PathBuf {
    runfolder_home().join("logs")
}

/// Append-only log file that rotates to `name.log.1 .. name.log.{max_files - 1}`
/// by size. At least one rotated file is kept.
struct RotatingFile {
    dir: PathBuf,
    base_name: String,
    max_files: usize,
    max_size: u64,
    file: Option<File>,
    size: u64,
}

impl RotatingFile {
    fn open(dir: &Path, base_name: &str, max_files: usize, max_size: u64) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let mut log = Self {
            dir: dir.to_path_buf(),
            base_name: sanitize_name(base_name),
            max_files: max_files.max(2),
            max_size,
            file: None,
            size: 0,
        };
        log.reopen()?;
        if log.size > log.max_size {
            log.rotate()?;
        }
        Ok(log)
    }

    fn path(&self, index: usize) -> PathBuf {
        match index {
            0 => self.dir.join(format!("{}.log", self.base_name)),
            n => self.dir.join(format!("{}.log.{}", self.base_name, n)),
        }
    }

    fn reopen(&mut self) -> io::Result<()> {
        let file = OpenOptions::new().create(true).append(true).open(self.path(0))?;
        self.size = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    /// Shift every file up one index; the rename onto the last index drops
    /// the oldest file.
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;
        for index in (1..self.max_files).rev() {
            match fs::rename(self.path(index - 1), self.path(index)) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
                _ => {}
            }
        }
        self.reopen()
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.size > 0 && self.size + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file unavailable"))?;
        let written = file.write(buf)?;
        self.size += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[derive(Clone)]
struct SharedRotatingWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl SharedRotatingWriter {
    fn new(dir: &Path, app_name: &str) -> Result<Self> {
        let log = RotatingFile::open(dir, app_name, MAX_LOG_FILES, MAX_LOG_FILE_SIZE)
            .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
        Ok(Self {
            inner: Arc::new(Mutex::new(log)),
        })
    }

    fn with_file<T>(&self, f: impl FnOnce(&mut RotatingFile) -> io::Result<T>) -> io::Result<T> {
        let mut guard = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))?;
        f(&mut *guard)
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SharedRotatingWriter {
    type Writer = SharedRotatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

impl Write for SharedRotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
