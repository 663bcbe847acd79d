//! Agent and skill catalog.
//!
//! The catalog is static configuration owned by the project. It is loaded
//! once per invocation and never written.
//!
//! - [`types`]: candidate profiles and their trigger vocabulary
//! - [`registry`]: loading `agent-registry.json` and `skill-rules.json`

mod registry;
mod types;

pub use registry::CandidateRegistry;
pub use types::{CandidateKind, CandidateProfile, Complexity, DeferLoading, Priority, Triggers};
