use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure output directory exists; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes `{dir}/{filename}` through a temp file and a rename, so readers
/// never observe a half-written config or log.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_dir_and_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let writer = AtomicFileWriter::new(temp.path().join("nested").join("out"));

        let first = writer.write("collector.ron", "(a: 1)").unwrap();
        let second = writer.write("collector.ron", "(a: 2)").unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_to_string(&second).unwrap(), "(a: 2)");
        // Only the target remains; the temp file was renamed away.
        assert_eq!(fs::read_dir(second.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("not_a_dir");
        fs::write(&not_a_dir, "x").unwrap();

        let result = AtomicFileWriter::new(not_a_dir.clone()).write("log.log", "data");
        assert!(matches!(result, Err(PersistError::OutputDir(_))));
        assert_eq!(fs::read_to_string(&not_a_dir).unwrap(), "x");
    }
}
