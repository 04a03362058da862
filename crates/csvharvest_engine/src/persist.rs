use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Separator written after every JSON array element.
const ELEMENT_SEPARATOR: &[u8] = b",\n";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory missing or not writable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the directory holding `path` exists; create it if missing.
pub fn ensure_parent_dir(path: &Path) -> Result<(), PersistError> {
    let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    }
    Ok(())
}

/// Output file shared by all workers of a run.
///
/// Each `append` is one `write_all` under the lock, so records from concurrent
/// jobs never interleave.
#[derive(Debug)]
pub struct AppendWriter {
    path: PathBuf,
    file: Mutex<File>,
}

impl AppendWriter {
    /// Truncate (or create) `path` and write `preamble` first.
    pub fn create(path: impl Into<PathBuf>, preamble: &str) -> Result<Self, PersistError> {
        let path = path.into();
        ensure_parent_dir(&path)?;
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;
        file.write_all(preamble.as_bytes())?;
        file.flush()?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &str) -> Result<(), PersistError> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        file.write_all(record.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// Append one element of a JSON array opened with `[\n`.
    pub fn append_json_element(&self, json: &str) -> Result<(), PersistError> {
        let mut record = String::with_capacity(json.len() + ELEMENT_SEPARATOR.len());
        record.push_str(json);
        record.push_str(",\n");
        self.append(&record)
    }

    /// Trim the trailing separator and write the closing bracket.
    pub fn close_json_array(&self) -> Result<(), PersistError> {
        let mut file = self
            .file
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let len = file.metadata()?.len();
        let sep_len = ELEMENT_SEPARATOR.len() as u64;
        let mut tail = [0u8; 2];
        let has_element = if len >= sep_len {
            file.seek(SeekFrom::End(-(sep_len as i64)))?;
            file.read_exact(&mut tail)?;
            tail[..] == *ELEMENT_SEPARATOR
        } else {
            false
        };

        if has_element {
            file.set_len(len - sep_len)?;
            file.seek(SeekFrom::End(0))?;
            file.write_all(b"\n]")?;
        } else {
            file.seek(SeekFrom::End(0))?;
            file.write_all(b"]")?;
        }
        file.sync_all()?;
        Ok(())
    }
}
