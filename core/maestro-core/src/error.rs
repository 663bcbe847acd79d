//! Error types for maestro-core operations.
//!
//! Only registry failures are fatal to a hook invocation. Everything else is
//! recovered where it happens and logged, so most of these variants end up in
//! a `tracing::warn!` rather than in front of the user.

use std::path::PathBuf;

/// All errors that can occur in maestro-core operations.
#[derive(Debug, thiserror::Error)]
pub enum MaestroError {
    // ─────────────────────────────────────────────────────────────────────
    // Registry Errors (fatal: scoring cannot proceed)
    // ─────────────────────────────────────────────────────────────────────
    #[error("Candidate registry not found (looked in {agents} and {skills})")]
    RegistryMissing { agents: PathBuf, skills: PathBuf },

    #[error("Candidate registry malformed: {path}: {details}")]
    RegistryMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Persistence Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Atomic write failed: {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MaestroError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        MaestroError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn json(context: impl Into<String>, source: serde_json::Error) -> Self {
        MaestroError::Json {
            context: context.into(),
            source,
        }
    }

    /// True for errors that must stop the invocation.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MaestroError::RegistryMissing { .. } | MaestroError::RegistryMalformed { .. }
        )
    }
}

/// Convenience type alias for Results using MaestroError.
pub type Result<T> = std::result::Result<T, MaestroError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_errors_are_fatal() {
        let err = MaestroError::RegistryMalformed {
            path: PathBuf::from("/p/agent-registry.json"),
            details: "expected value".to_string(),
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("agent-registry.json"));
    }

    #[test]
    fn test_io_errors_are_not_fatal() {
        let err = MaestroError::io(
            "reading context",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "I/O error: reading context: gone");
    }
}
