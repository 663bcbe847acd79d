//! Chooses how much of a ranking to show and renders it as markdown.
//!
//! Selection is separate from rendering so the mode decision can be tested
//! without string matching.

use std::fmt::Write as _;

use crate::catalog::{CandidateKind, CandidateProfile, CandidateRegistry};
use crate::scoring::ScoredCandidate;
use crate::state::SessionStatus;

pub const DEFAULT_TIE_MAX_GAP: u32 = 10;
const FALLBACK_BRIEF: &str = "Guidance available";

/// When the top two recommendations count as co-equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TieBreakConfig {
    /// Largest score gap that still counts as a tie.
    pub max_gap: u32,
    pub require_equal_categories: bool,
}

impl Default for TieBreakConfig {
    fn default() -> Self {
        Self {
            max_gap: DEFAULT_TIE_MAX_GAP,
            require_equal_categories: true,
        }
    }
}

impl TieBreakConfig {
    pub fn is_tie(&self, first: &ScoredCandidate<'_>, second: &ScoredCandidate<'_>) -> bool {
        let gap = first.total.abs_diff(second.total);
        if gap > self.max_gap {
            return false;
        }
        if !first.breakdown.has_non_complexity_signal()
            || !second.breakdown.has_non_complexity_signal()
        {
            return false;
        }
        !self.require_equal_categories
            || first.breakdown.category_count() == second.breakdown.category_count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Presentation<'a> {
    Silent,
    FullDiscovery {
        matches: Vec<ScoredCandidate<'a>>,
    },
    Incremental {
        new: Vec<ScoredCandidate<'a>>,
        previous: Vec<String>,
    },
    CompactOnly {
        previous: Vec<String>,
    },
    TieAware {
        first: ScoredCandidate<'a>,
        second: ScoredCandidate<'a>,
        previous: Vec<String>,
    },
}

impl Presentation<'_> {
    pub fn mode(&self) -> &'static str {
        match self {
            Presentation::Silent => "silent",
            Presentation::FullDiscovery { .. } => "full",
            Presentation::Incremental { .. } => "incremental",
            Presentation::CompactOnly { .. } => "compact",
            Presentation::TieAware { .. } => "tie",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendationPresenter {
    tie_break: TieBreakConfig,
    defer_loading: bool,
}

impl RecommendationPresenter {
    pub fn new(tie_break: TieBreakConfig, defer_loading: bool) -> Self {
        Self {
            tie_break,
            defer_loading,
        }
    }

    /// Picks the output mode.
    ///
    /// `recommendations` is the actionable subset of `ranked` and
    /// `previously` the names already recommended this session. Ties are
    /// judged on the top two of the full ranking, so a runner-up below the
    /// threshold can still be co-recommended.
    pub fn select<'a>(
        &self,
        ranked: &[ScoredCandidate<'a>],
        recommendations: Vec<ScoredCandidate<'a>>,
        status: SessionStatus,
        previously: &[String],
        force_full: bool,
    ) -> Presentation<'a> {
        if recommendations.is_empty() {
            return Presentation::Silent;
        }

        let full = status.is_new_session() || force_full;
        let is_new = |s: &ScoredCandidate<'_>| !previously.iter().any(|p| p == s.name());

        if let [first, second, ..] = ranked {
            if self.tie_break.is_tie(first, second) && (full || is_new(first) || is_new(second)) {
                return Presentation::TieAware {
                    first: first.clone(),
                    second: second.clone(),
                    previous: if full { Vec::new() } else { previously.to_vec() },
                };
            }
        }

        if full {
            return Presentation::FullDiscovery {
                matches: recommendations,
            };
        }

        let new: Vec<_> = recommendations.into_iter().filter(|s| is_new(s)).collect();
        match (new.is_empty(), previously.is_empty()) {
            (false, false) => Presentation::Incremental {
                new,
                previous: previously.to_vec(),
            },
            (true, false) => Presentation::CompactOnly {
                previous: previously.to_vec(),
            },
            (false, true) => Presentation::FullDiscovery { matches: new },
            (true, true) => Presentation::Silent,
        }
    }

    pub fn render(
        &self,
        presentation: &Presentation<'_>,
        registry: &CandidateRegistry,
    ) -> Option<String> {
        let mut out = String::new();
        match presentation {
            Presentation::Silent => return None,
            Presentation::FullDiscovery { matches } => {
                out.push_str("# Maestro Recommendations\n\n");
                out.push_str("Based on your task, these capabilities look relevant:\n\n");
                for scored in matches {
                    self.write_verbose(&mut out, scored);
                }
                write_usage(&mut out);
            }
            Presentation::Incremental { new, previous } => {
                out.push_str("# New Recommendations\n\n");
                for scored in new {
                    self.write_verbose(&mut out, scored);
                }
                let _ = writeln!(
                    out,
                    "Previously recommended: {}\n",
                    compact_list(previous, registry)
                );
            }
            Presentation::CompactOnly { previous } => {
                out.push_str("# Available This Session\n\n");
                let _ = writeln!(out, "{}\n", compact_list(previous, registry));
                out.push_str("Use Skill(skill: \"name\") for skills or the Task tool for agents.\n");
            }
            Presentation::TieAware {
                first,
                second,
                previous,
            } => {
                out.push_str("# Maestro Recommendations (close match)\n\n");
                out.push_str("Two candidates fit this task about equally well:\n\n");
                self.write_verbose(&mut out, first);
                self.write_verbose(&mut out, second);
                let _ = writeln!(
                    out,
                    "Both matched {} signal categories and are {} points apart. \
                     Use the surrounding context to choose between them.\n",
                    first.breakdown.category_count(),
                    first.total.abs_diff(second.total),
                );
                if !previous.is_empty() {
                    let _ = writeln!(
                        out,
                        "Previously recommended: {}\n",
                        compact_list(previous, registry)
                    );
                }
            }
        }
        Some(out)
    }

    fn write_verbose(&self, out: &mut String, scored: &ScoredCandidate<'_>) {
        let c = scored.candidate;
        let kind = match c.kind {
            CandidateKind::Agent => "agent",
            CandidateKind::Skill => "skill",
        };
        let _ = writeln!(
            out,
            "## {} ({}, {} priority)",
            c.name,
            kind,
            c.priority.label()
        );
        let _ = writeln!(
            out,
            "Confidence: {} (score {})",
            confidence_label(scored.total),
            scored.total
        );
        for (signal, points) in scored.breakdown.hits() {
            let _ = writeln!(out, "- {} (+{})", signal.label(), points);
        }

        if self.is_deferred(c) {
            let brief = c
                .defer_loading
                .as_ref()
                .and_then(|d| d.short_description())
                .unwrap_or(FALLBACK_BRIEF);
            let _ = writeln!(out, "Brief: {}", brief);
        } else {
            let _ = writeln!(
                out,
                "When to use: {}",
                c.description.as_deref().unwrap_or(FALLBACK_BRIEF)
            );
        }
        let _ = writeln!(out, "{}\n", activation_hint(c));
    }

    fn is_deferred(&self, candidate: &CandidateProfile) -> bool {
        self.defer_loading
            && candidate.kind == CandidateKind::Skill
            && candidate
                .defer_loading
                .as_ref()
                .is_some_and(|d| d.enabled())
    }
}

/// High at 40 and above, Medium at 25 and above.
pub fn confidence_label(total: u32) -> &'static str {
    if total >= 40 {
        "High"
    } else if total >= 25 {
        "Medium"
    } else {
        "Low"
    }
}

fn activation_hint(candidate: &CandidateProfile) -> String {
    match candidate.kind {
        CandidateKind::Agent => format!(
            "Activate: Task(subagent_type: \"{}\") using the 3P format (Product, Process, Performance)",
            candidate.name
        ),
        CandidateKind::Skill => format!("Activate: Skill(skill: \"{}\")", candidate.name),
    }
}

fn compact_list(names: &[String], registry: &CandidateRegistry) -> String {
    names
        .iter()
        .map(|name| match registry.get(name) {
            Some(c) => format!("[{}] {}", c.priority.label(), name),
            None => name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_usage(out: &mut String) {
    out.push_str("## Using Recommendations\n\n");
    out.push_str("Delegate to agents with the Task tool. Activate skills with the Skill tool.\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DeferLoading, Priority};
    use crate::scoring::{ScoreBreakdown, Signal};

    fn profile(name: &str, kind: CandidateKind) -> CandidateProfile {
        let mut c = CandidateProfile::new(name, kind);
        c.priority = Priority::High;
        c
    }

    fn scored<'a>(
        candidate: &'a CandidateProfile,
        total: u32,
        hits: Vec<(Signal, u32)>,
    ) -> ScoredCandidate<'a> {
        ScoredCandidate {
            candidate,
            breakdown: ScoreBreakdown::from_hits(hits),
            total,
        }
    }

    fn keyword_and_intent() -> Vec<(Signal, u32)> {
        vec![(Signal::Keyword, 10), (Signal::Intent, 15)]
    }

    #[test]
    fn test_empty_is_silent() {
        let presenter = RecommendationPresenter::default();
        let p = presenter.select(&[], Vec::new(), SessionStatus::NewSession, &[], true);
        assert_eq!(p, Presentation::Silent);
        assert!(presenter.render(&p, &CandidateRegistry::default()).is_none());
    }

    #[test]
    fn test_close_scores_with_equal_categories_present_both() {
        let a = profile("architect", CandidateKind::Agent);
        let b = profile("reviewer", CandidateKind::Agent);
        let recs = vec![
            scored(&a, 38, keyword_and_intent()),
            scored(&b, 32, keyword_and_intent()),
        ];

        let presenter = RecommendationPresenter::default();
        let p = presenter.select(&recs, recs.clone(), SessionStatus::NewSession, &[], false);
        assert_eq!(p.mode(), "tie");

        let text = presenter.render(&p, &CandidateRegistry::default()).unwrap();
        assert!(text.contains("## architect"));
        assert!(text.contains("## reviewer"));
        assert!(text.contains("6 points apart"));
    }

    #[test]
    fn test_complexity_only_runner_up_is_not_a_tie() {
        let a = profile("architect", CandidateKind::Agent);
        let b = profile("reviewer", CandidateKind::Agent);
        let recs = vec![
            scored(&a, 38, keyword_and_intent()),
            scored(&b, 32, vec![(Signal::Complexity, 5)]),
        ];

        let p = RecommendationPresenter::default().select(
            &recs,
            recs.clone(),
            SessionStatus::NewSession,
            &[],
            false,
        );
        assert_eq!(p.mode(), "full");
    }

    #[test]
    fn test_runner_up_below_threshold_can_tie() {
        let a = profile("architect", CandidateKind::Agent);
        let b = profile("reviewer", CandidateKind::Agent);
        let ranked = vec![
            scored(&a, 15, vec![(Signal::Intent, 15)]),
            scored(&b, 8, vec![(Signal::Operation, 8)]),
        ];
        let actionable = vec![ranked[0].clone()];

        let presenter = RecommendationPresenter::default();
        let p = presenter.select(&ranked, actionable, SessionStatus::NewSession, &[], false);
        match p {
            Presentation::TieAware { first, second, .. } => {
                assert_eq!(first.name(), "architect");
                assert_eq!(second.name(), "reviewer");
            }
            other => panic!("unexpected {:?}", other),
        }

        // nothing actionable means no tie either
        let p = presenter.select(
            &ranked[1..],
            Vec::new(),
            SessionStatus::NewSession,
            &[],
            false,
        );
        assert_eq!(p, Presentation::Silent);
    }

    #[test]
    fn test_unequal_category_counts_are_not_a_tie() {
        let a = profile("a", CandidateKind::Agent);
        let b = profile("b", CandidateKind::Agent);
        let recs = vec![
            scored(&a, 33, vec![(Signal::Keyword, 10), (Signal::Intent, 15), (Signal::Operation, 8)]),
            scored(&b, 25, keyword_and_intent()),
        ];
        let presenter = RecommendationPresenter::default();
        assert_eq!(
            presenter.select(&recs, recs.clone(), SessionStatus::NewSession, &[], false).mode(),
            "full"
        );

        let relaxed = RecommendationPresenter::new(
            TieBreakConfig {
                max_gap: 10,
                require_equal_categories: false,
            },
            false,
        );
        assert_eq!(
            relaxed.select(&recs, recs.clone(), SessionStatus::NewSession, &[], false).mode(),
            "tie"
        );
    }

    #[test]
    fn test_incremental_and_compact_modes() {
        let a = profile("a", CandidateKind::Agent);
        let b = profile("b", CandidateKind::Skill);
        let presenter = RecommendationPresenter::default();
        let previously = vec!["a".to_string()];

        let recs = vec![
            scored(&a, 40, keyword_and_intent()),
            scored(&b, 10, vec![(Signal::Keyword, 10)]),
        ];
        match presenter.select(&recs, recs.clone(), SessionStatus::Continue, &previously, false) {
            Presentation::Incremental { new, previous } => {
                assert_eq!(new.len(), 1);
                assert_eq!(new[0].name(), "b");
                assert_eq!(previous, previously);
            }
            other => panic!("unexpected {:?}", other),
        }

        let recs = vec![scored(&a, 40, keyword_and_intent())];
        let p = presenter.select(
            &recs,
            recs.clone(),
            SessionStatus::DomainSwitch,
            &previously,
            false,
        );
        assert_eq!(p.mode(), "compact");
        let registry = CandidateRegistry::new(vec![a.clone()]);
        let text = presenter.render(&p, &registry).unwrap();
        assert!(text.contains("[high] a"));
    }

    #[test]
    fn test_forced_listing_is_full_even_mid_session() {
        let a = profile("a", CandidateKind::Agent);
        let previously = vec!["a".to_string()];
        let recs = vec![scored(&a, 40, keyword_and_intent())];
        let p = RecommendationPresenter::default().select(
            &recs,
            recs.clone(),
            SessionStatus::Continue,
            &previously,
            true,
        );
        assert_eq!(p.mode(), "full");
    }

    #[test]
    fn test_deferred_skill_renders_brief() {
        let mut skill = profile("testing-guide", CandidateKind::Skill);
        skill.defer_loading = Some(DeferLoading::Detailed {
            enabled: true,
            short_description: Some("Test patterns".to_string()),
        });
        skill.description = Some("Long description".to_string());
        let recs = vec![scored(&skill, 45, keyword_and_intent())];

        let presenter = RecommendationPresenter::new(TieBreakConfig::default(), true);
        let p = presenter.select(&recs, recs.clone(), SessionStatus::NewSession, &[], false);
        let text = presenter.render(&p, &CandidateRegistry::default()).unwrap();
        assert!(text.contains("Brief: Test patterns"));
        assert!(text.contains("Confidence: High (score 45)"));
        assert!(text.contains("Activate: Skill(skill: \"testing-guide\")"));

        let eager = RecommendationPresenter::new(TieBreakConfig::default(), false);
        let p = eager.select(&recs, recs.clone(), SessionStatus::NewSession, &[], false);
        let text = eager.render(&p, &CandidateRegistry::default()).unwrap();
        assert!(text.contains("When to use: Long description"));
    }

    #[test]
    fn test_confidence_labels() {
        assert_eq!(confidence_label(40), "High");
        assert_eq!(confidence_label(39), "Medium");
        assert_eq!(confidence_label(25), "Medium");
        assert_eq!(confidence_label(24), "Low");
    }
}
