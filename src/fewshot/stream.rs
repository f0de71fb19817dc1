use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::StreamError;

/// Append-only newline-delimited JSON file.
///
/// Clones share one write lock so concurrent appends never interleave.
#[derive(Debug, Clone)]
pub struct JsonlStream {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl JsonlStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record as a single line, creating parent directories as needed.
    pub fn append<T: Serialize>(&self, record: &T) -> Result<(), StreamError> {
        let mut line = serde_json::to_string(record).map_err(|e| StreamError::Serialize {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;
        line.push('\n');

        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;

        Ok(())
    }

    /// Reads every record, newest (last line) first. Blank lines are skipped.
    ///
    /// A missing file reads as empty. The first unparseable line fails the whole read.
    pub fn read_latest_first<T: DeserializeOwned>(&self) -> Result<Vec<T>, StreamError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        let mut records = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record = serde_json::from_str(line).map_err(|e| StreamError::CorruptLine {
                path: self.path.clone(),
                line: idx + 1,
                reason: e.to_string(),
            })?;
            records.push(record);
        }

        records.reverse();
        Ok(records)
    }

    fn io_error(&self, err: std::io::Error) -> StreamError {
        StreamError::Io {
            path: self.path.clone(),
            source: err,
        }
    }
}
