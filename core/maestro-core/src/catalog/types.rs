//! Candidate profile types, as declared in the registry files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which catalog a candidate came from. Decides the activation hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Agent,
    Skill,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Complexity::Simple => "simple",
            Complexity::Medium => "medium",
            Complexity::Complex => "complex",
        };
        f.write_str(s)
    }
}

/// Trigger vocabulary. Regex patterns are kept as strings; an invalid one
/// simply never matches.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Triggers {
    pub keywords: Vec<String>,
    pub synonyms: Vec<String>,
    pub intent_patterns: Vec<String>,
    pub operations: Vec<String>,
}

/// `defer_loading` is either a bare bool or `{enabled, short_description}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DeferLoading {
    Enabled(bool),
    Detailed {
        #[serde(default)]
        enabled: bool,
        #[serde(default)]
        short_description: Option<String>,
    },
}

impl DeferLoading {
    pub fn enabled(&self) -> bool {
        match self {
            DeferLoading::Enabled(enabled) => *enabled,
            DeferLoading::Detailed { enabled, .. } => *enabled,
        }
    }

    pub fn short_description(&self) -> Option<&str> {
        match self {
            DeferLoading::Enabled(_) => None,
            DeferLoading::Detailed {
                short_description, ..
            } => short_description.as_deref(),
        }
    }
}

/// A profile as written in a registry file (name is the map key).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProfileSpec {
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub complexity: Option<Complexity>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, alias = "promptTriggers")]
    pub triggers: Triggers,
    #[serde(default)]
    pub internal: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "defer_loading", alias = "deferLoading")]
    pub defer_loading: Option<DeferLoading>,
}

/// An agent or skill eligible for recommendation.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub name: String,
    pub kind: CandidateKind,
    pub priority: Priority,
    /// Missing tier never earns the complexity bonus.
    pub complexity: Option<Complexity>,
    pub domain: Option<String>,
    pub triggers: Triggers,
    pub internal: bool,
    pub description: Option<String>,
    pub defer_loading: Option<DeferLoading>,
}

impl CandidateProfile {
    pub(crate) fn from_spec(name: String, kind: CandidateKind, spec: ProfileSpec) -> Self {
        Self {
            name,
            kind,
            priority: spec.priority,
            complexity: spec.complexity,
            domain: spec.domain.filter(|d| !d.trim().is_empty()),
            triggers: spec.triggers,
            internal: spec.internal,
            description: spec.description,
            defer_loading: spec.defer_loading,
        }
    }

    /// Minimal profile for tests and programmatic registries.
    pub fn new(name: impl Into<String>, kind: CandidateKind) -> Self {
        Self {
            name: name.into(),
            kind,
            priority: Priority::default(),
            complexity: None,
            domain: None,
            triggers: Triggers::default(),
            internal: false,
            description: None,
            defer_loading: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_spec_accepts_prompt_triggers_alias() {
        let spec: ProfileSpec = serde_json::from_str(
            r#"{
                "priority": "high",
                "promptTriggers": {"keywords": ["test"], "intentPatterns": ["write.*tests?"]},
                "defer_loading": {"enabled": true, "short_description": "Testing guide"}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.priority, Priority::High);
        assert_eq!(spec.triggers.keywords, vec!["test"]);
        assert_eq!(spec.triggers.intent_patterns, vec!["write.*tests?"]);
        let defer = spec.defer_loading.unwrap();
        assert!(defer.enabled());
        assert_eq!(defer.short_description(), Some("Testing guide"));
    }

    #[test]
    fn test_defer_loading_bool_form() {
        let spec: ProfileSpec = serde_json::from_str(r#"{"defer_loading": true}"#).unwrap();
        let defer = spec.defer_loading.unwrap();
        assert!(defer.enabled());
        assert_eq!(defer.short_description(), None);
    }

    #[test]
    fn test_empty_domain_is_dropped() {
        let spec: ProfileSpec = serde_json::from_str(r#"{"domain": "  "}"#).unwrap();
        let profile = CandidateProfile::from_spec("x".into(), CandidateKind::Agent, spec);
        assert_eq!(profile.domain, None);
    }
}
