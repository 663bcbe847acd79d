//! MaestroEngine - one entry point per hook event.
//!
//! The engine owns the per-project paths, the resolved feature flags, and the
//! scoring/presentation tuning. Each `handle_*` call performs at most one
//! load → mutate → save cycle on the state document.
//!
//! Persistence failures are logged and swallowed here: the conversation must
//! keep working when tracking data cannot be written. The only error that
//! escapes is a missing or unreadable candidate registry.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use maestro_core::{HookPayload, MaestroEngine, MaestroPaths};
//!
//! let engine = MaestroEngine::new(MaestroPaths::resolve(None));
//! if let Some(payload) = HookPayload::parse(&stdin) {
//!     if let Some(text) = engine.handle(&payload, chrono::Utc::now())? {
//!         println!("{text}");
//!     }
//! }
//! ```

use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::PathBuf;

use crate::activity::{domain_for_path, is_file_modifying_tool, used_candidate};
use crate::catalog::{CandidateKind, CandidateRegistry};
use crate::config::{Feature, FeatureFlags};
use crate::error::Result;
use crate::evaluation::{
    render_evaluation_reminder, render_missing_evaluation_warning, DelegationCheck,
};
use crate::hook::{HookEvent, HookInput, HookPayload, UNKNOWN_SESSION_ID};
use crate::patterns::RE_EXPLICIT_LISTING;
use crate::presenter::{Presentation, RecommendationPresenter, TieBreakConfig};
use crate::scoring::{RelevanceScorer, ScoringConfig};
use crate::state::{
    begin_prompt, classify, end_session, read_work_log_tail, record_recommendations, ArchiveError,
    ArchiveOutcome, Archiver, SessionBackup, SessionObservation, SessionStatus, StateDocument,
    StateStore,
};
use crate::storage::MaestroPaths;
use crate::warmup;

pub struct MaestroEngine {
    paths: MaestroPaths,
    flags: FeatureFlags,
    store: StateStore,
    archiver: Archiver,
    scorer: RelevanceScorer,
    tie_break: TieBreakConfig,
}

impl MaestroEngine {
    /// Flags come from `.claude/feature-flags.json` and the environment.
    pub fn new(paths: MaestroPaths) -> Self {
        let flags = FeatureFlags::load(&paths.feature_flags_file());
        Self::with_flags(paths, flags)
    }

    pub fn with_flags(paths: MaestroPaths, flags: FeatureFlags) -> Self {
        Self {
            store: StateStore::new(&paths.state_file()),
            archiver: Archiver::new(&paths),
            paths,
            flags,
            scorer: RelevanceScorer::default(),
            tie_break: TieBreakConfig::default(),
        }
    }

    pub fn with_tuning(mut self, scoring: ScoringConfig, tie_break: TieBreakConfig) -> Self {
        self.scorer = RelevanceScorer::new(scoring);
        self.tie_break = tie_break;
        self
    }

    pub fn paths(&self) -> &MaestroPaths {
        &self.paths
    }

    pub fn flags(&self) -> &FeatureFlags {
        &self.flags
    }

    pub fn archiver(&self) -> &Archiver {
        &self.archiver
    }

    /// Current state document (default when absent or unreadable).
    pub fn load_state(&self) -> StateDocument {
        self.store.load()
    }

    /// Dispatches one hook payload. Returns the text to inject into the
    /// conversation, if any.
    pub fn handle(&self, payload: &HookPayload, now: DateTime<Utc>) -> Result<Option<String>> {
        let input = match payload {
            HookPayload::RawText(text) => return self.handle_prompt(text, None, now),
            HookPayload::Json(input) => input,
        };

        let Some(event) = input.to_event() else {
            tracing::debug!(event = ?input.hook_event_name, "Ignoring unhandled hook event");
            return Ok(None);
        };
        let now = input.timestamp_or(now);
        tracing::debug!(
            event = event.name(),
            session = ?input.session_id(),
            "Handling hook event"
        );

        match event {
            HookEvent::UserPromptSubmit => {
                let prompt = input.prompt.as_deref().unwrap_or_default();
                self.handle_prompt(prompt, input.session_id(), now)
            }
            HookEvent::PreToolUse | HookEvent::PostToolUse => {
                self.handle_tool_use(input, now);
                Ok(None)
            }
            HookEvent::PreCompact | HookEvent::SubagentStop => {
                let backup = self.persist_backup(event.name(), input.session_id(), now);
                Ok(backup
                    .filter(|_| event == HookEvent::PreCompact)
                    .map(|b| render_backup_confirmation(&b)))
            }
            HookEvent::Stop => {
                let transcript = read_transcript(input);
                Ok(self.handle_stop(&transcript, now))
            }
            HookEvent::SessionEnd => {
                if let Err(e) = self.finish_session(input.session_id(), now) {
                    tracing::error!(error = %e, "Session archive failed, backup left in place");
                }
                Ok(None)
            }
        }
    }

    /// Prompt flow: classify the session, score candidates, pick an output
    /// mode, and record what was surfaced.
    pub fn handle_prompt(
        &self,
        prompt: &str,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Option<String>> {
        if prompt.trim().is_empty() {
            self.count_prompt(session_id, now);
            return Ok(None);
        }
        let registry = CandidateRegistry::load(&self.paths)?;

        let mut doc = self.store.load();
        let previously = doc.recommended().to_vec();
        let status = advance_session(&mut doc, session_id, now);
        let previously = if status.is_new_session() {
            Vec::new()
        } else {
            previously
        };

        let warm_up = if warmup::is_maestro_activation(prompt) {
            let previous = self.archiver.latest_backup_excluding(doc.session_id());
            let work_log = read_work_log_tail(&self.paths.work_log_file());
            warmup::render(&doc, previous.as_ref(), &work_log, now)
        } else {
            None
        };

        let candidates = registry.filtered(|kind| match kind {
            CandidateKind::Agent => self.flags.is_enabled(Feature::AgentSuggestions),
            CandidateKind::Skill => self.flags.is_enabled(Feature::SkillDiscovery),
        });
        // a new session has already cleared the domain left by the last edit
        let ranked = self
            .scorer
            .score(prompt, doc.active_domain.as_deref(), &candidates);
        let recommendations = self.scorer.recommendations(&ranked);
        let mut names: Vec<String> = recommendations
            .iter()
            .map(|s| s.name().to_string())
            .collect();

        let presenter = RecommendationPresenter::new(
            self.tie_break,
            self.flags.is_enabled(Feature::DeferLoading),
        );
        let force_full = RE_EXPLICIT_LISTING.is_match(prompt);
        let presentation =
            presenter.select(&ranked, recommendations, status, &previously, force_full);
        if let Presentation::TieAware { second, .. } = &presentation {
            if !names.iter().any(|n| n == second.name()) {
                names.push(second.name().to_string());
            }
        }
        tracing::debug!(
            mode = presentation.mode(),
            top = ?names.first(),
            "Recommendations selected"
        );
        let rendered = presenter.render(&presentation, &registry);

        record_recommendations(&mut doc, names.iter().map(String::as_str));
        self.save(&doc);

        let output: Vec<String> = warm_up.into_iter().chain(rendered).collect();
        Ok((!output.is_empty()).then(|| output.join("\n")))
    }

    /// An empty prompt still advances the session but is never scored, so it
    /// does not need the registry.
    fn count_prompt(&self, session_id: Option<&str>, now: DateTime<Utc>) {
        let mut doc = self.store.load();
        advance_session(&mut doc, session_id, now);
        self.save(&doc);
    }

    /// Context and usage tracking for tool events.
    pub fn handle_tool_use(&self, input: &HookInput, now: DateTime<Utc>) {
        let Some(tool) = input.tool_name() else {
            return;
        };

        let mut doc = self.store.load();
        let mut changed = false;

        if self.flags.is_enabled(Feature::ContextTracking) && is_file_modifying_tool(tool) {
            if let Some(path) = input.file_path() {
                let domain = domain_for_path(path);
                tracing::debug!(tool, path, domain, "File activity");
                doc.active_domain = Some(domain.to_string());
                doc.last_edited_file = Some(path.to_string());
                changed = true;
            }
        }

        if let Some(name) = used_candidate(tool, input.tool_input.as_ref()) {
            tracing::debug!(tool, name = %name, "Capability used");
            doc.record_used(&name);
            changed = true;
        }

        if changed {
            doc.last_updated = Some(now);
            self.save(&doc);
        }
    }

    /// Writes the session backup. Returns it when the write succeeded.
    pub fn persist_backup(
        &self,
        saved_by: &str,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> Option<SessionBackup> {
        let doc = self.store.load();
        let session_id = resolve_session_id(session_id, &doc);
        let recent_work = if self.flags.is_enabled(Feature::WorkTracking) {
            read_work_log_tail(&self.paths.work_log_file())
        } else {
            Vec::new()
        };

        let backup = SessionBackup::capture(&session_id, saved_by, &doc, recent_work, now);
        match self.archiver.write_backup(&backup) {
            Ok(_) => Some(backup),
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "Failed to save session backup");
                None
            }
        }
    }

    /// Session end: back up, reset the live document, archive, prune.
    ///
    /// The reset happens even when archiving fails; the backup then stays in
    /// the sessions directory for manual recovery.
    pub fn finish_session(
        &self,
        session_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> std::result::Result<ArchiveOutcome, ArchiveError> {
        let prior = self.store.try_load();
        let session_id = match prior.as_ref() {
            Some(doc) => resolve_session_id(session_id, doc),
            None => resolve_session_id(session_id, &StateDocument::default()),
        };

        self.persist_backup(HookEvent::SessionEnd.name(), Some(&session_id), now);
        self.save(&end_session(prior.as_ref(), &session_id, now));

        let outcome = self.archiver.finalize(&session_id, now)?;
        tracing::info!(session = %session_id, ?outcome, "Session finalized");
        Ok(outcome)
    }

    /// Evaluation compliance for a finished turn.
    pub fn handle_stop(&self, transcript: &str, now: DateTime<Utc>) -> Option<String> {
        if transcript.trim().is_empty() {
            return None;
        }

        let check = DelegationCheck::inspect(transcript);
        let mut doc = self.store.load();
        if check.apply(&mut doc, now) {
            tracing::debug!(evaluated = check.evaluated, "Delegation recorded");
            self.save(&doc);
        }

        if check.needs_warning() {
            Some(render_missing_evaluation_warning())
        } else {
            check.needs_reminder().then(render_evaluation_reminder)
        }
    }

    fn save(&self, doc: &StateDocument) {
        if let Err(e) = self.store.save(doc) {
            tracing::warn!(
                path = %self.store.path().display(),
                error = %e,
                "Failed to save state document"
            );
        }
    }
}

/// Classifies the prompt against the stored document and applies the
/// session mutation.
fn advance_session(
    doc: &mut StateDocument,
    session_id: Option<&str>,
    now: DateTime<Utc>,
) -> SessionStatus {
    let observation = SessionObservation {
        session_id: session_id.map(str::to_string),
        timestamp: now,
        domain: doc.active_domain.clone(),
    };
    let status = classify(doc, &observation);
    begin_prompt(doc, status, &observation);
    tracing::debug!(?status, session = ?doc.session_id(), "Prompt classified");
    status
}

fn resolve_session_id(incoming: Option<&str>, doc: &StateDocument) -> String {
    incoming
        .filter(|id| !id.is_empty())
        .or_else(|| doc.session_id())
        .unwrap_or(UNKNOWN_SESSION_ID)
        .to_string()
}

/// Transcript file contents, falling back to an inline prompt field.
fn read_transcript(input: &HookInput) -> String {
    if let Some(path) = input.transcript_path.as_deref().filter(|p| !p.is_empty()) {
        match fs_err::read_to_string(PathBuf::from(path)) {
            Ok(text) => return text,
            Err(e) => tracing::warn!(error = %e, "Failed to read transcript"),
        }
    }
    input.prompt.clone().unwrap_or_default()
}

fn render_backup_confirmation(backup: &SessionBackup) -> String {
    let mut out = String::from("# Session State Saved\n\n");
    let _ = writeln!(out, "Trigger: {}", backup.saved_by);
    let _ = writeln!(out, "Prompts: {}", backup.summary.prompt_count);
    let _ = writeln!(
        out,
        "Pending evaluations: {}",
        backup.summary.pending_evaluations
    );
    out.push_str("\nThe session can be restored on the next /maestro start.\n");
    out
}
