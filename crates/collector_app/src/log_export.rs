use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::persist::{AtomicFileWriter, PersistError};

/// Writes the session log as `{dir}/{prefix}{timestamp}.log`.
pub struct LogExport {
    dir: PathBuf,
    prefix: String,
}

impl LogExport {
    pub fn new(dir: PathBuf, prefix: impl Into<String>) -> Self {
        Self {
            dir,
            prefix: prefix.into(),
        }
    }

    pub fn save(&self, content: &str) -> Result<PathBuf, PersistError> {
        let filename = log_file_name(&self.prefix, Utc::now());
        AtomicFileWriter::new(self.dir.clone()).write(&filename, content)
    }
}

pub fn log_file_name(prefix: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}{}.log", at.format("%Y-%m-%dT%H-%M-%S"))
}
