//! Daily log files and the tracing subscriber
//!
//! Log lines go to stdout and, when a log directory is configured, to
//! `<dir>/app_YYYYMMDD.log`. The active file can be rotated while requests
//! are being logged: writers hold a read lock, rotation takes the write lock.

use crate::error::FrameworkError;
use chrono::{Local, NaiveDate};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info,polaris=debug";

/// Path of the log file for a given day
pub fn daily_log_path(dir: impl AsRef<Path>, date: NaiveDate) -> PathBuf {
    dir.as_ref()
        .join(format!("app_{}.log", date.format("%Y%m%d")))
}

fn open_log(path: &Path) -> Result<File, FrameworkError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| FrameworkError::io(path, e))
}

struct ActiveLog {
    dir: PathBuf,
    path: PathBuf,
    file: Option<File>,
}

/// Shared handle on the active daily log file
#[derive(Clone)]
pub struct LogFile {
    active: Arc<RwLock<ActiveLog>>,
}

impl LogFile {
    /// Open today's log file in `dir`
    pub fn open_daily(dir: impl AsRef<Path>) -> Result<Self, FrameworkError> {
        Self::open_for(dir, Local::now().date_naive())
    }

    /// Open the log file of a given day in `dir`
    pub fn open_for(dir: impl AsRef<Path>, date: NaiveDate) -> Result<Self, FrameworkError> {
        let dir = dir.as_ref().to_path_buf();
        let path = daily_log_path(&dir, date);
        let file = open_log(&path)?;
        Ok(Self {
            active: Arc::new(RwLock::new(ActiveLog {
                dir,
                path,
                file: Some(file),
            })),
        })
    }

    /// Switch to today's log file
    pub fn rotate(&self) -> Result<PathBuf, FrameworkError> {
        self.rotate_to(Local::now().date_naive())
    }

    /// Switch to the log file of `date`
    ///
    /// The new file is opened before anything else happens. If that fails
    /// the current file stays active and keeps receiving writes.
    pub fn rotate_to(&self, date: NaiveDate) -> Result<PathBuf, FrameworkError> {
        let dir = self.read(|active| active.dir.clone());
        let path = daily_log_path(&dir, date);
        let file = open_log(&path).map_err(|e| {
            tracing::error!("Failed to rotate log: {}", e);
            e
        })?;

        let mut active = self
            .active
            .write()
            .map_err(|_| FrameworkError::internal("Log handle is poisoned"))?;
        // Dropping the previous handle closes it
        active.file = Some(file);
        active.path = path.clone();
        Ok(path)
    }

    /// Close the active file; later writes are discarded
    pub fn close(&self) {
        if let Ok(mut active) = self.active.write() {
            active.file = None;
        }
    }

    /// Path of the active (or last active) file
    pub fn path(&self) -> PathBuf {
        self.read(|active| active.path.clone())
    }

    pub fn is_open(&self) -> bool {
        self.read(|active| active.file.is_some())
    }

    fn read<T>(&self, f: impl FnOnce(&ActiveLog) -> T) -> T {
        match self.active.read() {
            Ok(active) => f(&active),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }
}

/// Writer handed to the fmt layer for each event
pub struct LogWriter {
    active: Arc<RwLock<ActiveLog>>,
}

impl Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let active = self
            .active
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log handle is poisoned"))?;
        match active.file.as_ref() {
            Some(file) => {
                let mut file: &File = file;
                file.write(buf)
            }
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let active = self
            .active
            .read()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log handle is poisoned"))?;
        match active.file.as_ref() {
            Some(file) => {
                let mut file: &File = file;
                file.flush()
            }
            None => Ok(()),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogWriter {
            active: self.active.clone(),
        }
    }
}

/// Install the global subscriber
///
/// Logs to stdout, plus the daily file when one is given. Only the first
/// call in a process installs anything.
pub fn init(log: Option<&LogFile>) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_FILTER));
    let file_layer = log.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file.clone())
    });

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .try_init();
    if installed.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
