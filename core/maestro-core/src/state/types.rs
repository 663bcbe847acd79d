//! Serialized state types.
//!
//! The on-disk layout is `context.json`, shared with the project's other hook
//! scripts, so field names stay camelCase and the session-scoped fields live
//! under `skillTracking`.
//!
//! ```json
//! {
//!   "skillTracking": {
//!     "sessionId": "...", "sessionStart": "...", "lastPromptTime": "...",
//!     "promptCount": 3, "recommended": [], "used": [], "domainHistory": []
//!   },
//!   "activeDomain": "testing",
//!   "lastEditedFile": "tests/auth.test.js",
//!   "evaluationTracking": { ... },
//!   "historicalMetrics": { ... }
//! }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Oldest entries are dropped past this length.
pub const MAX_DOMAIN_HISTORY: usize = 100;

/// Compliance starts at 100% until a delegation is observed.
pub const DEFAULT_COMPLIANCE: f64 = 100.0;

/// The single live state document for a project.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    /// Absent between a session end and the next prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_tracking: Option<SessionTracking>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub evaluation_tracking: EvaluationTracking,
    #[serde(default)]
    pub historical_metrics: HistoricalMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_session_end: Option<DateTime<Utc>>,
}

impl StateDocument {
    pub fn session_id(&self) -> Option<&str> {
        self.skill_tracking
            .as_ref()
            .and_then(|t| t.session_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn recommended(&self) -> &[String] {
        self.skill_tracking
            .as_ref()
            .map(|t| t.recommended.as_slice())
            .unwrap_or(&[])
    }

    pub fn prompt_count(&self) -> u32 {
        self.skill_tracking.as_ref().map_or(0, |t| t.prompt_count)
    }

    /// Records a capability the agent actually invoked this session.
    pub fn record_used(&mut self, name: &str) {
        let tracking = self.skill_tracking.get_or_insert_with(SessionTracking::default);
        if !tracking.used.iter().any(|n| n == name) {
            tracking.used.push(name.to_string());
        }
    }
}

/// Session-scoped fields. Reset on every new session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionTracking {
    pub session_id: Option<String>,
    pub session_start: Option<DateTime<Utc>>,
    pub last_prompt_time: Option<DateTime<Utc>>,
    pub prompt_count: u32,
    /// Names surfaced this session, in first-recommended order.
    pub recommended: Vec<String>,
    /// Names actually invoked this session.
    pub used: Vec<String>,
    pub domain_history: Vec<String>,
}

impl SessionTracking {
    /// Appends `domain` unless it repeats the last entry, then enforces the
    /// history bound.
    pub fn push_domain(&mut self, domain: &str) {
        if domain.is_empty() {
            return;
        }
        if self.domain_history.last().map(String::as_str) != Some(domain) {
            self.domain_history.push(domain.to_string());
        }
        truncate_history(&mut self.domain_history);
    }

    pub fn last_domain(&self) -> Option<&str> {
        self.domain_history.last().map(String::as_str)
    }

    /// Set union that keeps first-seen order.
    pub fn record_recommended<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            if !self.recommended.iter().any(|n| n == name) {
                self.recommended.push(name.to_string());
            }
        }
    }
}

/// Drops the oldest entries until the history fits.
pub fn truncate_history(history: &mut Vec<String>) {
    if history.len() > MAX_DOMAIN_HISTORY {
        let excess = history.len() - MAX_DOMAIN_HISTORY;
        history.drain(..excess);
    }
}

/// Delegation/evaluation counters. Cross-session; never reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EvaluationTracking {
    pub total_delegations: u64,
    pub evaluated_delegations: u64,
    pub skipped_evaluations: u64,
    #[serde(deserialize_with = "de_percentage")]
    pub compliance_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl Default for EvaluationTracking {
    fn default() -> Self {
        Self {
            total_delegations: 0,
            evaluated_delegations: 0,
            skipped_evaluations: 0,
            compliance_rate: DEFAULT_COMPLIANCE,
            last_checked: None,
        }
    }
}

impl EvaluationTracking {
    /// Counts one delegation and recomputes the compliance percentage
    /// (rounded to one decimal).
    pub fn record_delegation(&mut self, evaluated: bool, now: DateTime<Utc>) {
        self.total_delegations += 1;
        if evaluated {
            self.evaluated_delegations += 1;
        } else {
            self.skipped_evaluations += 1;
        }
        let ratio = self.evaluated_delegations as f64 / self.total_delegations as f64;
        self.compliance_rate = (ratio * 1000.0).round() / 10.0;
        self.last_checked = Some(now);
    }
}

/// Cross-session totals, bumped once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoricalMetrics {
    pub total_sessions: u64,
    pub total_delegations: u64,
    #[serde(deserialize_with = "de_percentage")]
    pub average_compliance: f64,
}

impl Default for HistoricalMetrics {
    fn default() -> Self {
        Self {
            total_sessions: 0,
            total_delegations: 0,
            average_compliance: DEFAULT_COMPLIANCE,
        }
    }
}

/// Older hook scripts wrote percentages as strings ("87.5").
fn de_percentage<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null(()),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Number(n) => n,
        Raw::Text(s) => s.trim().parse().unwrap_or(DEFAULT_COMPLIANCE),
        Raw::Null(()) => DEFAULT_COMPLIANCE,
    })
}
