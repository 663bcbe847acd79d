//! Session boundary detection and the state mutations it drives.
//!
//! Every prompt is classified against the stored document, then
//! [`begin_prompt`] applies the matching row of this table:
//!
//! ```text
//!                 recommended   domainHistory             promptCount  sessionId/start
//! NewSession      cleared       [domain] or []            1            new / now
//! DomainSwitch    kept (union)  append (dedup vs last)    +1           unchanged
//! Continue        kept (union)  append if distinct        +1           unchanged
//! ```
//!
//! Newly scored names are unioned in afterwards with [`record_recommendations`].
//! Both functions are pure over the document; the caller owns load and save.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use super::types::{HistoricalMetrics, SessionTracking, StateDocument};

/// Idle gap after which the next prompt starts a new session.
pub const SESSION_IDLE_TIMEOUT_MINS: i64 = 30;

/// What the incoming event tells us about the session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionObservation {
    /// Host-provided session id, when the event carried one.
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    /// Domain of the most recent file activity.
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Continue,
    DomainSwitch,
    NewSession,
}

impl SessionStatus {
    pub fn is_new_session(self) -> bool {
        self == SessionStatus::NewSession
    }
}

pub fn classify(doc: &StateDocument, obs: &SessionObservation) -> SessionStatus {
    let Some(tracking) = doc.skill_tracking.as_ref() else {
        return SessionStatus::NewSession;
    };

    let Some(stored_id) = doc.session_id() else {
        return SessionStatus::NewSession;
    };

    if let Some(incoming_id) = obs.session_id.as_deref().filter(|id| !id.is_empty()) {
        if incoming_id != stored_id {
            tracing::debug!(from = %stored_id, to = %incoming_id, "Session id changed");
            return SessionStatus::NewSession;
        }
    }

    let Some(last_prompt) = tracking.last_prompt_time else {
        return SessionStatus::NewSession;
    };

    let idle = obs.timestamp.signed_duration_since(last_prompt);
    if idle > Duration::minutes(SESSION_IDLE_TIMEOUT_MINS) {
        tracing::debug!(idle_mins = idle.num_minutes(), "Idle timeout, starting new session");
        return SessionStatus::NewSession;
    }

    match (obs.domain.as_deref(), tracking.last_domain()) {
        (Some(domain), Some(last)) if !domain.is_empty() && domain != last => {
            SessionStatus::DomainSwitch
        }
        _ => SessionStatus::Continue,
    }
}

/// Applies the session transition for one prompt.
pub fn begin_prompt(doc: &mut StateDocument, status: SessionStatus, obs: &SessionObservation) {
    let domain = obs.domain.as_deref().filter(|d| !d.is_empty());

    match status {
        SessionStatus::NewSession => {
            let session_id = obs
                .session_id
                .clone()
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| generate_session_id(obs.timestamp));

            doc.historical_metrics.total_sessions += 1;
            doc.skill_tracking = Some(SessionTracking {
                session_id: Some(session_id),
                session_start: Some(obs.timestamp),
                last_prompt_time: Some(obs.timestamp),
                prompt_count: 1,
                recommended: Vec::new(),
                used: Vec::new(),
                domain_history: domain.map(|d| vec![d.to_string()]).unwrap_or_default(),
            });
            doc.active_domain = None;
            doc.last_edited_file = None;
        }
        SessionStatus::DomainSwitch | SessionStatus::Continue => {
            let tracking = doc
                .skill_tracking
                .get_or_insert_with(SessionTracking::default);
            tracking.prompt_count = tracking.prompt_count.saturating_add(1);
            tracking.last_prompt_time = Some(obs.timestamp);
            if let Some(domain) = domain {
                tracking.push_domain(domain);
            }
        }
    }

    doc.last_updated = Some(obs.timestamp);
}

/// Unions newly surfaced names into the session's recommended set.
pub fn record_recommendations<'a>(
    doc: &mut StateDocument,
    names: impl IntoIterator<Item = &'a str>,
) {
    doc.skill_tracking
        .get_or_insert_with(SessionTracking::default)
        .record_recommended(names);
}

/// Builds the minimal document that replaces the live one at session end.
///
/// Only cross-session data survives. `prior` is `None` when the live document
/// was missing or unreadable, in which case every counter starts at zero.
pub fn end_session(
    prior: Option<&StateDocument>,
    session_id: &str,
    now: DateTime<Utc>,
) -> StateDocument {
    let evaluation = prior
        .map(|doc| doc.evaluation_tracking.clone())
        .unwrap_or_default();
    let total_sessions = prior.map_or(0, |doc| doc.historical_metrics.total_sessions);

    StateDocument {
        historical_metrics: HistoricalMetrics {
            total_sessions: total_sessions + 1,
            total_delegations: evaluation.total_delegations,
            average_compliance: evaluation.compliance_rate,
        },
        evaluation_tracking: evaluation,
        last_session_id: Some(session_id.to_string()),
        last_session_end: Some(now),
        ..Default::default()
    }
}

/// `session-<unix millis>-<9 base36 chars>`.
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..9)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("session-{}-{}", now.timestamp_millis(), suffix)
}
