//! Relevance scoring of candidates against a task.
//!
//! The scorer folds [`signals::SIGNAL_TABLE`] over every non-internal
//! candidate and ranks the results. It holds no state and does no I/O.

pub mod signals;

use crate::catalog::CandidateProfile;

pub use signals::{analyze_complexity, Signal, SignalContext, TaskText, SIGNAL_TABLE};

/// Minimum score for the top candidate to be worth mentioning.
pub const DEFAULT_MIN_SCORE: u32 = 10;
pub const DEFAULT_RESEARCH_CANDIDATE: &str = "base-research";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoringConfig {
    pub min_score: u32,
    /// Receives the interrogative bonus for questions.
    pub research_candidate: String,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            research_candidate: DEFAULT_RESEARCH_CANDIDATE.to_string(),
        }
    }
}

/// Signals that fired for one candidate, in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    hits: Vec<(Signal, u32)>,
}

impl ScoreBreakdown {
    pub fn from_hits(hits: Vec<(Signal, u32)>) -> Self {
        Self { hits }
    }

    pub fn hits(&self) -> &[(Signal, u32)] {
        &self.hits
    }

    pub fn total(&self) -> u32 {
        self.hits.iter().map(|(_, points)| points).sum()
    }

    /// Number of distinct categories that fired.
    pub fn category_count(&self) -> usize {
        self.hits.len()
    }

    pub fn has_non_complexity_signal(&self) -> bool {
        self.hits.iter().any(|(s, _)| *s != Signal::Complexity)
    }

    pub fn fired(&self, signal: Signal) -> bool {
        self.hits.iter().any(|(s, _)| *s == signal)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate<'a> {
    pub candidate: &'a CandidateProfile,
    pub breakdown: ScoreBreakdown,
    pub total: u32,
}

impl ScoredCandidate<'_> {
    pub fn name(&self) -> &str {
        &self.candidate.name
    }
}

#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer {
    config: ScoringConfig,
}

impl RelevanceScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Ranks every non-internal candidate, highest total first. Equal totals
    /// keep declaration order.
    pub fn score<'a>(
        &self,
        task: &str,
        active_domain: Option<&str>,
        candidates: &'a [CandidateProfile],
    ) -> Vec<ScoredCandidate<'a>> {
        if task.trim().is_empty() || candidates.is_empty() {
            return Vec::new();
        }

        let text = TaskText::new(task);
        let ctx = SignalContext {
            active_domain,
            research_candidate: &self.config.research_candidate,
        };

        let mut ranked: Vec<ScoredCandidate<'a>> = candidates
            .iter()
            .filter(|c| !c.internal)
            .map(|candidate| {
                let breakdown = score_one(&text, candidate, &ctx);
                ScoredCandidate {
                    candidate,
                    total: breakdown.total(),
                    breakdown,
                }
            })
            .collect();

        // sort_by is stable
        ranked.sort_by(|a, b| b.total.cmp(&a.total));
        ranked
    }

    /// The actionable subset of `ranked`: empty unless the top score clears
    /// the threshold, then every entry that does.
    pub fn recommendations<'a>(&self, ranked: &[ScoredCandidate<'a>]) -> Vec<ScoredCandidate<'a>> {
        match ranked.first() {
            Some(top) if top.total >= self.config.min_score => ranked
                .iter()
                .filter(|s| s.total >= self.config.min_score)
                .cloned()
                .collect(),
            _ => Vec::new(),
        }
    }
}

fn score_one(
    text: &TaskText<'_>,
    candidate: &CandidateProfile,
    ctx: &SignalContext<'_>,
) -> ScoreBreakdown {
    let hits = SIGNAL_TABLE
        .iter()
        .filter(|(_, _, matcher)| matcher(text, candidate, ctx))
        .map(|(signal, weight, _)| (*signal, *weight))
        .collect();
    ScoreBreakdown { hits }
}
