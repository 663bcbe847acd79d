//! Session warm-up shown when maestro mode is switched on.

use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::state::{SessionBackup, StateDocument};

const RECENT_FILES_SCANNED: usize = 5;
const RECENT_FILES_SHOWN: usize = 3;

pub fn is_maestro_activation(prompt: &str) -> bool {
    let lower = prompt.trim().to_lowercase();
    lower.contains("/maestro") || lower.contains("maestro mode") || lower.starts_with("maestro")
}

/// Whether the document holds anything worth summarizing.
pub fn has_session_data(doc: &StateDocument) -> bool {
    let started = doc
        .skill_tracking
        .as_ref()
        .is_some_and(|t| t.session_start.is_some() || t.prompt_count > 0);
    started || doc.evaluation_tracking.total_delegations > 0
}

/// File paths from work-log bullet lines (`• path/to/file.ext ...`),
/// newest first.
pub fn recent_files(work_log: &[String]) -> Vec<String> {
    work_log
        .iter()
        .rev()
        .filter_map(|line| {
            let rest = line.trim_start().strip_prefix('•')?;
            let token = rest.split_whitespace().next()?;
            let (_, ext) = token.rsplit_once('.')?;
            let plausible_ext = (2..=4).contains(&ext.len())
                && ext.chars().all(|c| c.is_ascii_alphabetic());
            plausible_ext.then(|| token.to_string())
        })
        .take(RECENT_FILES_SCANNED)
        .collect()
}

/// `1h 5m`, `12m`, or `just started`.
pub fn format_duration(start: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes_total = now.signed_duration_since(start).num_minutes().max(0);
    let (hours, minutes) = (minutes_total / 60, minutes_total % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        "just started".to_string()
    }
}

/// Renders the warm-up block. `previous` is the newest backup of another
/// session, if any.
pub fn render(
    doc: &StateDocument,
    previous: Option<&SessionBackup>,
    work_log: &[String],
    now: DateTime<Utc>,
) -> Option<String> {
    if !has_session_data(doc) {
        return None;
    }

    let tracking = doc.skill_tracking.as_ref();
    let mut out = String::from("# Maestro Session Warm-up\n\n");

    let duration = tracking
        .and_then(|t| t.session_start)
        .map_or_else(|| "unknown".to_string(), |start| format_duration(start, now));
    let _ = writeln!(
        out,
        "Session: {} ({} prompts so far)",
        duration,
        doc.prompt_count()
    );
    let _ = writeln!(
        out,
        "Domain: {}",
        doc.active_domain.as_deref().unwrap_or("No domain set")
    );

    if let Some(prev) = previous.filter(|p| Some(p.session_id.as_str()) != doc.session_id()) {
        let _ = writeln!(
            out,
            "\nPrevious session available: {} prompts, domain: {}",
            prev.summary.prompt_count,
            prev.summary.active_domain.as_deref().unwrap_or("general")
        );
    }

    let files = recent_files(work_log);
    if !files.is_empty() {
        let stamp = tracking
            .and_then(|t| t.last_prompt_time)
            .map_or_else(|| "--:--".to_string(), |t| t.format("%H:%M").to_string());
        out.push_str("\nRecent work:\n");
        for file in files.iter().take(RECENT_FILES_SHOWN) {
            let _ = writeln!(out, "- {} {}", stamp, file);
        }
    }

    if !doc.recommended().is_empty() {
        let _ = writeln!(out, "\nRecommended so far: {}", doc.recommended().join(", "));
    }

    let pending = doc.evaluation_tracking.skipped_evaluations;
    if pending > 0 {
        let _ = writeln!(out, "\nPending: {} delegations not yet evaluated", pending);
    }

    Some(out)
}
