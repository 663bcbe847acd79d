//! File-backed persistence for the state document.
//!
//! # Contract
//!
//! - [`StateStore::load`] never fails. Absent, empty, or corrupt files yield a
//!   default document and a warning in the log.
//! - [`StateStore::save`] replaces the whole document. It writes a temp file
//!   in the same directory and renames it over the target, so readers see
//!   either the previous document or the new one, never a partial write.
//!
//! There is no locking. The host runs one hook at a time per event, and each
//! invocation does exactly one load → mutate → save.

use fs_err as fs;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{MaestroError, Result};

use super::types::StateDocument;

pub struct StateStore {
    file_path: PathBuf,
}

impl StateStore {
    pub fn new(file_path: &Path) -> Self {
        StateStore {
            file_path: file_path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub fn exists(&self) -> bool {
        self.file_path.exists()
    }

    pub fn load(&self) -> StateDocument {
        self.try_load().unwrap_or_default()
    }

    /// Like [`StateStore::load`], but distinguishes "no usable document"
    /// (`None`) from a real one. The session-end reset needs this to treat
    /// missing counters as zero.
    pub fn try_load(&self) -> Option<StateDocument> {
        if !self.file_path.exists() {
            return None;
        }

        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read state document, using defaults");
                return None;
            }
        };

        if content.trim().is_empty() {
            tracing::warn!(path = %self.file_path.display(), "Empty state document, using defaults");
            return None;
        }

        match serde_json::from_str::<StateDocument>(&content) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(
                    path = %self.file_path.display(),
                    error = %e,
                    "Failed to parse state document, using defaults"
                );
                None
            }
        }
    }

    pub fn save(&self, doc: &StateDocument) -> Result<()> {
        write_json_atomic(&self.file_path, doc)
    }
}

/// Serializes `value` as pretty JSON and atomically replaces `path`.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| MaestroError::json(format!("serializing {}", path.display()), e))?;

    let parent_dir = path.parent().ok_or_else(|| {
        MaestroError::io(
            format!("{} has no parent directory", path.display()),
            std::io::Error::from(std::io::ErrorKind::InvalidInput),
        )
    })?;
    fs::create_dir_all(parent_dir)
        .map_err(|e| MaestroError::io("creating state directory", e))?;

    let mut temp_file = NamedTempFile::new_in(parent_dir)
        .map_err(|e| MaestroError::io("creating temp file", e))?;
    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| MaestroError::io("writing temp file", e))?;
    temp_file
        .flush()
        .map_err(|e| MaestroError::io("flushing temp file", e))?;
    temp_file
        .persist(path)
        .map_err(|e| MaestroError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;

    Ok(())
}
