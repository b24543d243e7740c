//! Timestamped logging for the daemon.
//!
//! Installs a `log` implementation writing `YYYY-MM-DD HH:MM:SS LEVEL msg`
//! lines either to the configured append-mode log file or to stdout
//! (foreground and dry-run modes). Quiet mode installs nothing and masks
//! every level.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;

/// Error type for logger installation
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Could not create or open the log file
    #[error("Failed to open log file: {0}")]
    Io(#[from] io::Error),

    /// A logger was already installed
    #[error("Logger already installed: {0}")]
    Init(#[from] SetLoggerError),
}

enum Sink {
    Stdout,
    File(std::fs::File),
}

struct DaemonLogger {
    sink: Mutex<Sink>,
}

impl Log for DaemonLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = format!(
            "{} {:<5} {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.args()
        );

        // A write failure here has nowhere better to be reported.
        if let Ok(mut sink) = self.sink.lock() {
            let _ = match &mut *sink {
                Sink::Stdout => io::stdout().write_all(line.as_bytes()),
                Sink::File(file) => file.write_all(line.as_bytes()),
            };
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = match &mut *sink {
                Sink::Stdout => io::stdout().flush(),
                Sink::File(file) => file.flush(),
            };
        }
    }
}

fn install(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_boxed_logger(Box::new(DaemonLogger {
        sink: Mutex::new(sink),
    }))?;
    log::set_max_level(level);
    Ok(())
}

/// Install the console logger (foreground and dry-run modes).
pub fn init_console(level: LevelFilter) -> Result<(), LoggingError> {
    install(Sink::Stdout, level)?;
    Ok(())
}

/// Install the file logger, appending to `path` (created along with its
/// parent directory if missing).
pub fn init_file(path: &Path, level: LevelFilter) -> Result<(), LoggingError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    install(Sink::File(file), level)?;
    Ok(())
}

/// Quiet mode: no logger is installed and every level is masked.
pub fn init_quiet() {
    log::set_max_level(LevelFilter::Off);
}
