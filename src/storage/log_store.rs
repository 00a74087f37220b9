//! Data-access object for the JSON log document.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use fs2::FileExt;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Map, Serializer, Value};
use thiserror::Error;

use crate::form::Submission;
use crate::storage::timestamp;

/// Timestamp key → submission object, in insertion order.
pub type LogDocument = Map<String, Value>;

/// Error type for log store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file holds valid JSON that is not an object.
    #[error("log document at {path} is not a JSON object")]
    CorruptDocument { path: PathBuf },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only log of submissions stored as one pretty-printed JSON object.
///
/// Every append runs a full read-modify-write cycle while holding an
/// exclusive lock on a sibling `.lock` file.
#[derive(Debug, Clone)]
pub struct LogStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl LogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let lock_path = sibling(&path, ".lock");
        Self { path, lock_path }
    }

    /// Location of the JSON document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a submission captured now. Returns the key it was stored under.
    pub fn append(&self, submission: &Submission) -> Result<String, StoreError> {
        self.append_at(submission, timestamp::now())
    }

    /// Append a submission captured at `at`.
    ///
    /// If the key for `at` is already taken the capture time is advanced one
    /// microsecond at a time until a free key is found.
    pub fn append_at(
        &self,
        submission: &Submission,
        at: NaiveDateTime,
    ) -> Result<String, StoreError> {
        self.ensure_parent()?;
        let _guard = self.lock(LockMode::Exclusive)?;

        let mut document = self.read_document()?;
        let key = timestamp::unique_key(at, |k| document.contains_key(k));
        document.insert(key.clone(), serde_json::to_value(submission)?);
        self.write_document(&document)?;

        Ok(key)
    }

    /// Snapshot of the current document. Empty if the file does not exist.
    pub fn load(&self) -> Result<LogDocument, StoreError> {
        if !self.path.exists() {
            return Ok(LogDocument::new());
        }
        let _guard = self.lock(LockMode::Shared)?;
        self.read_document()
    }

    fn ensure_parent(&self) -> Result<(), StoreError> {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|source| StoreError::Io {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    fn lock(&self, mode: LockMode) -> Result<LockGuard, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|source| StoreError::Lock {
                path: self.lock_path.clone(),
                source,
            })?;

        let locked = match mode {
            LockMode::Exclusive => FileExt::lock_exclusive(&file),
            LockMode::Shared => FileExt::lock_shared(&file),
        };
        locked.map_err(|source| StoreError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;

        Ok(LockGuard { file })
    }

    fn read_document(&self) -> Result<LogDocument, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(LogDocument::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(LogDocument::new());
        }

        match serde_json::from_slice::<Value>(&bytes)? {
            Value::Object(document) => Ok(document),
            _ => Err(StoreError::CorruptDocument {
                path: self.path.clone(),
            }),
        }
    }

    fn write_document(&self, document: &LogDocument) -> Result<(), StoreError> {
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document.serialize(&mut serializer)?;

        let tmp_path = sibling(&self.path, ".tmp");
        let io_err = |source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        };

        let mut tmp = File::create(&tmp_path).map_err(io_err)?;
        tmp.write_all(&buf).map_err(io_err)?;
        tmp.sync_all().map_err(io_err)?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Exclusive,
    Shared,
}

/// Releases the file lock on drop.
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}
