//! Signal categories and their matchers.
//!
//! Each row of [`SIGNAL_TABLE`] is `(category, weight, matcher)`. Matchers are
//! pure functions of the task, the candidate, and the context, and answer a
//! single yes/no question; the scorer folds the table into points.

use regex::RegexBuilder;

use crate::catalog::{CandidateProfile, Complexity};
use crate::patterns::RE_MULTI_STEP;

/// Word-count boundaries for the task complexity tier.
pub const SIMPLE_MAX_WORDS: usize = 9;
pub const MEDIUM_MAX_WORDS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Signal {
    Keyword,
    Synonym,
    Intent,
    Operation,
    Complexity,
    ContextDomain,
    Interrogative,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::Keyword => "Keyword match",
            Signal::Synonym => "Synonym match",
            Signal::Intent => "Intent pattern",
            Signal::Operation => "Operation match",
            Signal::Complexity => "Complexity alignment",
            Signal::ContextDomain => "Context match",
            Signal::Interrogative => "Question detected",
        }
    }
}

/// The task text with the derived views every matcher needs.
#[derive(Debug, Clone)]
pub struct TaskText<'a> {
    pub raw: &'a str,
    pub lower: String,
    pub tier: Complexity,
}

impl<'a> TaskText<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lower: raw.to_lowercase(),
            tier: analyze_complexity(raw),
        }
    }
}

/// Context the matchers may consult.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    pub active_domain: Option<&'a str>,
    /// The one candidate that earns the interrogative bonus.
    pub research_candidate: &'a str,
}

pub type Matcher = fn(&TaskText<'_>, &CandidateProfile, &SignalContext<'_>) -> bool;

pub const SIGNAL_TABLE: [(Signal, u32, Matcher); 7] = [
    (Signal::Keyword, 10, match_keywords),
    (Signal::Synonym, 5, match_synonyms),
    (Signal::Intent, 15, match_intent),
    (Signal::Operation, 8, match_operations),
    (Signal::Complexity, 5, match_complexity),
    (Signal::ContextDomain, 15, match_context_domain),
    (Signal::Interrogative, 3, match_interrogative),
];

pub fn weight_of(signal: Signal) -> u32 {
    SIGNAL_TABLE
        .iter()
        .find(|(s, _, _)| *s == signal)
        .map_or(0, |(_, w, _)| *w)
}

/// <10 words simple, 10-30 medium, >30 or multi-step wording complex.
pub fn analyze_complexity(task: &str) -> Complexity {
    let words = task.split_whitespace().count();
    if words > MEDIUM_MAX_WORDS || RE_MULTI_STEP.is_match(task) {
        Complexity::Complex
    } else if words > SIMPLE_MAX_WORDS {
        Complexity::Medium
    } else {
        Complexity::Simple
    }
}

fn match_keywords(task: &TaskText<'_>, c: &CandidateProfile, _: &SignalContext<'_>) -> bool {
    any_whole_word(&task.lower, &c.triggers.keywords)
}

fn match_synonyms(task: &TaskText<'_>, c: &CandidateProfile, _: &SignalContext<'_>) -> bool {
    any_whole_word(&task.lower, &c.triggers.synonyms)
}

fn match_intent(task: &TaskText<'_>, c: &CandidateProfile, _: &SignalContext<'_>) -> bool {
    c.triggers
        .intent_patterns
        .iter()
        .any(|pattern| pattern_matches(pattern, task.raw))
}

fn match_operations(task: &TaskText<'_>, c: &CandidateProfile, _: &SignalContext<'_>) -> bool {
    c.triggers
        .operations
        .iter()
        .map(|op| op.trim().to_lowercase())
        .any(|op| !op.is_empty() && task.lower.contains(&op))
}

fn match_complexity(task: &TaskText<'_>, c: &CandidateProfile, _: &SignalContext<'_>) -> bool {
    c.complexity == Some(task.tier)
}

fn match_context_domain(_: &TaskText<'_>, c: &CandidateProfile, ctx: &SignalContext<'_>) -> bool {
    match (ctx.active_domain, c.domain.as_deref()) {
        (Some(active), Some(domain)) => !active.is_empty() && active == domain,
        _ => false,
    }
}

fn match_interrogative(task: &TaskText<'_>, c: &CandidateProfile, ctx: &SignalContext<'_>) -> bool {
    c.name == ctx.research_candidate && task.raw.contains('?')
}

/// Case-insensitive regex match. An invalid pattern never matches.
pub fn pattern_matches(pattern: &str, text: &str) -> bool {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Patterns in `patterns` that fail to compile.
pub fn invalid_patterns(patterns: &[String]) -> Vec<&str> {
    patterns
        .iter()
        .filter(|p| RegexBuilder::new(p).case_insensitive(true).build().is_err())
        .map(String::as_str)
        .collect()
}

fn any_whole_word(haystack_lower: &str, needles: &[String]) -> bool {
    needles
        .iter()
        .map(|n| n.trim().to_lowercase())
        .any(|n| !n.is_empty() && contains_whole_word(haystack_lower, &n))
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// True when `needle` occurs in `haystack` without being glued to adjacent
/// word characters. Both sides are expected to be lowercased already.
pub fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    let starts_with_word = needle.chars().next().is_some_and(is_word_char);
    let ends_with_word = needle.chars().next_back().is_some_and(is_word_char);

    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        let left_ok = !starts_with_word || !before.is_some_and(is_word_char);
        let right_ok = !ends_with_word || !after.is_some_and(is_word_char);
        left_ok && right_ok
    })
}
