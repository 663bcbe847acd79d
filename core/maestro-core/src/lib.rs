//! # maestro-core
//!
//! Session tracking and agent/skill recommendation for Claude Code hooks.
//!
//! ## Design Principles
//!
//! - **One invocation per event**: every hook is a short-lived process. The
//!   only shared state is the project's `.claude/context.json`.
//! - **Graceful degradation**: missing or corrupt state yields defaults, and
//!   failed writes are logged. Only a missing candidate registry is fatal.
//! - **Pure core**: session classification, scoring, and output selection
//!   are pure functions; the engine does the I/O around them.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use maestro_core::{MaestroEngine, MaestroPaths};
//!
//! let engine = MaestroEngine::new(MaestroPaths::resolve(None));
//! let text = engine.handle_prompt("write tests for the parser", None, chrono::Utc::now())?;
//! ```

pub mod activity;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod hook;
pub mod patterns;
pub mod presenter;
pub mod scoring;
pub mod state;
pub mod storage;
pub mod warmup;

pub use catalog::{CandidateKind, CandidateProfile, CandidateRegistry, Complexity, Priority};
pub use config::{Feature, FeatureFlags};
pub use engine::MaestroEngine;
pub use error::{MaestroError, Result};
pub use hook::{HookEvent, HookInput, HookPayload};
pub use presenter::{Presentation, RecommendationPresenter, TieBreakConfig};
pub use scoring::{RelevanceScorer, ScoreBreakdown, ScoredCandidate, ScoringConfig, Signal};
pub use state::{SessionStatus, StateDocument, StateStore};
pub use storage::MaestroPaths;
