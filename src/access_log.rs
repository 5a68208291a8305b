//! Access log: a record of every file opened and every menu input
//!
//! The log is a capability passed explicitly to whatever needs it (loaders,
//! the menu, the binary). Each entry is one line, `<unix-millis> <message>`.

use crate::error::{CivicError, Result};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Sink for access-log events
pub trait AccessLog: Send + Sync {
    /// Record one event
    fn log(&self, message: &str);
}

/// Access log writing timestamped lines to a file or stderr
pub struct FileAccessLog {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl FileAccessLog {
    /// Log to stderr
    pub fn stderr() -> Self {
        Self::from_writer(io::stderr())
    }

    /// Append to `path`, creating it if needed
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file: File = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path_ref)
            .map_err(|e| CivicError::io(path_ref, e))?;
        Ok(Self::from_writer(file))
    }

    /// Append to `path`, or fall back to stderr if it cannot be opened
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        match Self::create(path) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!("Error initializing access log, using stderr: {}", e);
                Self::stderr()
            }
        }
    }

    pub fn from_writer<W: Write + Send + 'static>(writer: W) -> Self {
        FileAccessLog {
            writer: Mutex::new(Box::new(writer)),
        }
    }
}

impl AccessLog for FileAccessLog {
    fn log(&self, message: &str) {
        let timestamp = chrono::Utc::now().timestamp_millis();
        let mut writer = lock(&self.writer);
        let written = writeln!(writer, "{} {}", timestamp, message).and_then(|_| writer.flush());
        if let Err(e) = written {
            tracing::warn!("Failed to write access log: {}", e);
        }
    }
}

/// In-memory access log, mostly for tests
#[derive(Default)]
pub struct MemoryAccessLog {
    entries: Mutex<Vec<String>>,
}

impl MemoryAccessLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages logged so far, oldest first
    pub fn entries(&self) -> Vec<String> {
        lock(&self.entries).clone()
    }
}

impl AccessLog for MemoryAccessLog {
    fn log(&self, message: &str) {
        lock(&self.entries).push(message.to_string());
    }
}

// Poisoned locks are recovered; entries are independent lines
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
