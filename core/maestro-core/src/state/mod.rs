//! Session state: the shared document and its lifecycle.
//!
//! # Architecture
//!
//! Every hook invocation is a separate short-lived process. The only thing
//! they share is one JSON document per project (`.claude/context.json`).
//!
//! ```text
//! hook event → classify (transition) → mutate document → save (store)
//!                                                      ↘ backup / archive (archive)
//! ```
//!
//! # Module Structure
//!
//! - [`types`]: the document and its counters
//! - [`store`]: load-or-default and atomic save
//! - [`transition`]: session classification and the pure mutations it drives
//! - [`archive`]: per-session backups, archive moves, and retention

pub mod archive;
mod store;
pub mod transition;
pub mod types;

pub use archive::{
    read_work_log_tail, ArchiveError, ArchiveOutcome, ArchivedSession, Archiver, BackupSummary,
    SessionBackup, ARCHIVE_RETENTION,
};
pub use store::StateStore;
pub use transition::{
    begin_prompt, classify, end_session, generate_session_id, record_recommendations,
    SessionObservation, SessionStatus, SESSION_IDLE_TIMEOUT_MINS,
};
pub use types::{
    EvaluationTracking, HistoricalMetrics, SessionTracking, StateDocument, MAX_DOMAIN_HISTORY,
};
