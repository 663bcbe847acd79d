//! Session backups and their archive.
//!
//! A backup is a point-in-time copy of the state document taken before
//! compaction, on subagent stop, and at session end. Finalizing a session
//! moves its backup into `sessions/archives/` under a timestamped name and
//! prunes the archive to the newest [`ARCHIVE_RETENTION`] entries by
//! modification time.
//!
//! Archiving never drops data silently: if both the rename and the
//! copy-then-delete fallback fail, the backup stays where it is and the error
//! is returned for the operator log.

use chrono::{DateTime, SecondsFormat, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::Result;
use crate::storage::{sanitize_file_stem, MaestroPaths};

use super::store::write_json_atomic;
use super::types::StateDocument;

/// Archives kept after pruning.
pub const ARCHIVE_RETENTION: usize = 10;

/// Work-log lines captured in each backup.
pub const WORK_LOG_TAIL: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBackup {
    pub session_id: String,
    pub saved_at: DateTime<Utc>,
    /// Hook event that triggered the save.
    pub saved_by: String,
    pub context: StateDocument,
    #[serde(default)]
    pub recent_work: Vec<String>,
    pub summary: BackupSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupSummary {
    pub prompt_count: u32,
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub active_domain: Option<String>,
    #[serde(default)]
    pub last_edited_file: Option<String>,
    #[serde(default)]
    pub skills_recommended: Vec<String>,
    pub pending_evaluations: u64,
    pub evaluation_compliance: f64,
}

impl SessionBackup {
    pub fn capture(
        session_id: &str,
        saved_by: &str,
        doc: &StateDocument,
        recent_work: Vec<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let tracking = doc.skill_tracking.as_ref();
        Self {
            session_id: session_id.to_string(),
            saved_at: now,
            saved_by: saved_by.to_string(),
            context: doc.clone(),
            recent_work,
            summary: BackupSummary {
                prompt_count: doc.prompt_count(),
                session_start: tracking.and_then(|t| t.session_start),
                active_domain: doc.active_domain.clone(),
                last_edited_file: doc.last_edited_file.clone(),
                skills_recommended: doc.recommended().to_vec(),
                pending_evaluations: doc.evaluation_tracking.skipped_evaluations,
                evaluation_compliance: doc.evaluation_tracking.compliance_rate,
            },
        }
    }
}

/// Returns the last `WORK_LOG_TAIL` non-empty lines of the work log, or
/// nothing when the log is absent.
pub fn read_work_log_tail(path: &Path) -> Vec<String> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).collect();
    let start = lines.len().saturating_sub(WORK_LOG_TAIL);
    lines[start..].iter().map(|l| l.to_string()).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("Archive failed for {backup}: rename: {rename}; copy: {copy}")]
    MoveFailed {
        backup: PathBuf,
        rename: std::io::Error,
        copy: std::io::Error,
    },
}

#[derive(Debug, PartialEq)]
pub enum ArchiveOutcome {
    /// No backup existed for the session.
    NoBackup,
    Moved(PathBuf),
    /// Rename failed; copy-then-delete succeeded.
    Copied(PathBuf),
}

/// An archive entry loaded back from disk.
#[derive(Debug, Clone)]
pub struct ArchivedSession {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub backup: SessionBackup,
}

pub struct Archiver {
    paths: MaestroPaths,
    sessions_dir: PathBuf,
    archives_dir: PathBuf,
}

impl Archiver {
    pub fn new(paths: &MaestroPaths) -> Self {
        Self {
            paths: paths.clone(),
            sessions_dir: paths.sessions_dir(),
            archives_dir: paths.archives_dir(),
        }
    }

    pub fn backup_path(&self, session_id: &str) -> PathBuf {
        self.paths.backup_file(session_id)
    }

    pub fn write_backup(&self, backup: &SessionBackup) -> Result<PathBuf> {
        let path = self.backup_path(&backup.session_id);
        write_json_atomic(&path, backup)?;
        tracing::debug!(session = %backup.session_id, path = %path.display(), "Session backup written");
        Ok(path)
    }

    pub fn load_backup(&self, session_id: &str) -> Option<SessionBackup> {
        read_backup(&self.backup_path(session_id))
    }

    /// Newest backup (by file name, which embeds the id) whose session id is
    /// not `exclude`. Malformed backups are skipped.
    pub fn latest_backup_excluding(&self, exclude: Option<&str>) -> Option<SessionBackup> {
        let mut names: Vec<PathBuf> = WalkDir::new(&self.sessions_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".backup.json"))
            })
            .collect();
        names.sort();

        names
            .iter()
            .rev()
            .filter_map(|p| read_backup(p))
            .find(|b| Some(b.session_id.as_str()) != exclude)
    }

    /// Moves the session's backup into the archive, then prunes.
    ///
    /// A pruning failure is logged and does not fail the call; the archive
    /// step already succeeded.
    pub fn finalize(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<ArchiveOutcome, ArchiveError> {
        let outcome = self.archive_backup(session_id, now)?;
        match self.enforce_retention() {
            Ok(removed) if removed > 0 => {
                tracing::debug!(removed, "Pruned old session archives");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Archive cleanup failed"),
        }
        Ok(outcome)
    }

    fn archive_backup(
        &self,
        session_id: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<ArchiveOutcome, ArchiveError> {
        let backup = self.backup_path(session_id);
        if !backup.exists() {
            return Ok(ArchiveOutcome::NoBackup);
        }

        let stamp = now
            .to_rfc3339_opts(SecondsFormat::Millis, true)
            .replace([':', '.'], "-");
        let target = self.archives_dir.join(format!(
            "{}-{}.json",
            sanitize_file_stem(session_id),
            stamp
        ));

        let rename_err = match fs::create_dir_all(&self.archives_dir)
            .and_then(|()| fs::rename(&backup, &target))
        {
            Ok(()) => return Ok(ArchiveOutcome::Moved(target)),
            Err(e) => e,
        };

        tracing::warn!(error = %rename_err, "Archive rename failed, attempting copy");
        match fs::copy(&backup, &target).and_then(|_| fs::remove_file(&backup)) {
            Ok(()) => Ok(ArchiveOutcome::Copied(target)),
            Err(copy_err) => Err(ArchiveError::MoveFailed {
                backup,
                rename: rename_err,
                copy: copy_err,
            }),
        }
    }

    /// Deletes all but the newest [`ARCHIVE_RETENTION`] archives by mtime.
    /// Returns how many were removed.
    pub fn enforce_retention(&self) -> std::io::Result<usize> {
        let mut entries = self.archive_entries()?;
        if entries.len() <= ARCHIVE_RETENTION {
            return Ok(0);
        }

        entries.sort_by(|a, b| b.1.cmp(&a.1));
        let mut removed = 0;
        for (path, _) in entries.into_iter().skip(ARCHIVE_RETENTION) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Loads every archive, newest first. Unreadable entries are skipped.
    pub fn load_archives(&self) -> Vec<ArchivedSession> {
        let mut entries = match self.archive_entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(error = %e, "No archives to load");
                return Vec::new();
            }
        };
        entries.sort_by(|a, b| b.1.cmp(&a.1));

        entries
            .into_iter()
            .filter_map(|(path, modified)| {
                let backup = read_backup(&path)?;
                Some(ArchivedSession {
                    path,
                    modified,
                    backup,
                })
            })
            .collect()
    }

    fn archive_entries(&self) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
        if !self.archives_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&self.archives_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::other)?;
            let is_json = entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("json");
            if !is_json {
                continue;
            }
            let modified = entry
                .metadata()
                .map_err(std::io::Error::other)?
                .modified()?;
            entries.push((entry.into_path(), modified));
        }
        Ok(entries)
    }
}

fn read_backup(path: &Path) -> Option<SessionBackup> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(backup) => Some(backup),
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Skipping malformed backup");
            None
        }
    }
}
