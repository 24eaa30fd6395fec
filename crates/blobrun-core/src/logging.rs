//! Logging init: file under XDG state dir, or graceful fallback to stderr.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "info,blobrun=debug";

/// Appends each event to the log file; an event whose file handle cannot be
/// cloned goes to stderr instead of being lost.
struct LogFile(File);

enum EventWriter {
    File(File),
    Stderr(io::Stderr),
}

impl Write for EventWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            EventWriter::File(f) => f.write(buf),
            EventWriter::Stderr(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            EventWriter::File(f) => f.flush(),
            EventWriter::Stderr(e) => e.flush(),
        }
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = EventWriter;

    fn make_writer(&'a self) -> Self::Writer {
        match self.0.try_clone() {
            Ok(f) => EventWriter::File(f),
            Err(_) => EventWriter::Stderr(io::stderr()),
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Path of the log file: `~/.local/state/blobrun/blobrun.log` (parent created).
pub fn log_file_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("blobrun")?;
    Ok(xdg_dirs.place_state_file("blobrun.log")?)
}

fn open_log_file(path: &Path) -> Result<LogFile> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    Ok(LogFile(file))
}

/// Initialize structured logging, appending to `path`.
pub fn init_logging_at(path: &Path) -> Result<()> {
    let writer = open_log_file(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("install subscriber: {}", e))?;
    tracing::info!("blobrun logging initialized at {}", path.display());
    Ok(())
}

/// Initialize logging to the XDG state log file.
/// Returns the reason on failure so the caller can fall back to stderr.
pub fn init_logging() -> Result<()> {
    init_logging_at(&log_file_path()?)
}

/// Initialize logging to stderr only. Used when the log file is unavailable.
pub fn init_logging_stderr() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_writer_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("blobrun.log");
        let log = open_log_file(&path).unwrap();
        log.make_writer().write_all(b"first\n").unwrap();
        log.make_writer().write_all(b"second\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");

        let reopened = open_log_file(&path).unwrap();
        reopened.make_writer().write_all(b"third\n").unwrap();
        assert!(fs::read_to_string(&path).unwrap().ends_with("second\nthird\n"));
    }

    #[test]
    fn unopenable_log_path_reports_why() {
        let dir = tempfile::tempdir().unwrap();
        let err = match open_log_file(dir.path()) {
            Ok(_) => panic!("a directory is not a log file"),
            Err(e) => e,
        };
        assert!(format!("{:#}", err).contains("open log file"));
    }
}
