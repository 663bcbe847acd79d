//! Storage configuration and path management for Maestro.
//!
//! Every file Maestro reads or writes lives under a project's `.claude/`
//! directory, except the work log which sits at the project root (it is
//! written by other tooling).
//!
//! ```text
//! <project>/
//! ├── .maestro-work-log.txt
//! └── .claude/
//!     ├── context.json                 live state document
//!     ├── feature-flags.json           optional flag overrides
//!     ├── agents/agent-registry.json   agent catalog
//!     ├── skills/skill-rules.json      skill catalog
//!     └── sessions/
//!         ├── <id>.backup.json         per-session backups
//!         └── archives/                finalized backups (10 newest kept)
//! ```
//!
//! Production code uses `MaestroPaths::for_project(dir)`; tests point the same
//! constructor at a temp directory.

use std::path::{Path, PathBuf};

/// Environment variable Claude Code sets to the project root for hooks.
pub const PROJECT_DIR_ENV: &str = "CLAUDE_PROJECT_DIR";

/// Central configuration for all Maestro storage paths.
#[derive(Debug, Clone)]
pub struct MaestroPaths {
    project_root: PathBuf,
    claude_dir: PathBuf,
}

impl MaestroPaths {
    pub fn for_project(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let claude_dir = project_root.join(".claude");
        Self {
            project_root,
            claude_dir,
        }
    }

    /// Resolves the project root: `CLAUDE_PROJECT_DIR`, then the hook's cwd,
    /// then the process working directory.
    pub fn resolve(hook_cwd: Option<&str>) -> Self {
        let from_env = std::env::var(PROJECT_DIR_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let from_hook = hook_cwd
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let root = from_env
            .or(from_hook)
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self::for_project(root)
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn claude_dir(&self) -> &Path {
        &self.claude_dir
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // State
    // ─────────────────────────────────────────────────────────────────────────────

    /// Path to context.json (the live state document).
    pub fn state_file(&self) -> PathBuf {
        self.claude_dir.join("context.json")
    }

    /// Path to sessions/ (per-session backups).
    pub fn sessions_dir(&self) -> PathBuf {
        self.claude_dir.join("sessions")
    }

    /// Path to sessions/archives/.
    pub fn archives_dir(&self) -> PathBuf {
        self.sessions_dir().join("archives")
    }

    /// Path to a session's backup file.
    pub fn backup_file(&self, session_id: &str) -> PathBuf {
        self.sessions_dir()
            .join(format!("{}.backup.json", sanitize_file_stem(session_id)))
    }

    /// Path to the human-readable work log kept at the project root.
    pub fn work_log_file(&self) -> PathBuf {
        self.project_root.join(".maestro-work-log.txt")
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Static configuration (read-only)
    // ─────────────────────────────────────────────────────────────────────────────

    pub fn agent_registry_file(&self) -> PathBuf {
        self.claude_dir.join("agents").join("agent-registry.json")
    }

    pub fn skill_rules_file(&self) -> PathBuf {
        self.claude_dir.join("skills").join("skill-rules.json")
    }

    pub fn feature_flags_file(&self) -> PathBuf {
        self.claude_dir.join("feature-flags.json")
    }
}

/// Keeps session ids usable as file names. Path separators and other
/// characters outside `[A-Za-z0-9._-]` become `_`.
pub fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "unknown-session".to_string()
    } else {
        cleaned
    }
}
