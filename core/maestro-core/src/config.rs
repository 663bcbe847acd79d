//! Feature flags.
//!
//! Precedence, lowest to highest:
//! 1. Built-in defaults
//! 2. `.claude/feature-flags.json` (`{"DEFER_LOADING": false, ...}`)
//! 3. Environment: `MAESTRO_FEATURE_<NAME>=true|false`
//!
//! Unknown keys in the file are ignored. A malformed file logs a warning and
//! contributes nothing.

use fs_err as fs;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

pub const ENV_PREFIX: &str = "MAESTRO_FEATURE_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    /// Render opted-in skills as a short brief plus activation hint.
    DeferLoading,
    /// Score the skill catalog on prompts.
    SkillDiscovery,
    /// Score the agent catalog on prompts.
    AgentSuggestions,
    /// Include the work-log tail in session backups.
    WorkTracking,
    /// Track active domain and last edited file from tool events.
    ContextTracking,
}

impl Feature {
    pub const ALL: [Feature; 5] = [
        Feature::DeferLoading,
        Feature::SkillDiscovery,
        Feature::AgentSuggestions,
        Feature::WorkTracking,
        Feature::ContextTracking,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Feature::DeferLoading => "DEFER_LOADING",
            Feature::SkillDiscovery => "SKILL_DISCOVERY",
            Feature::AgentSuggestions => "AGENT_SUGGESTIONS",
            Feature::WorkTracking => "WORK_TRACKING",
            Feature::ContextTracking => "CONTEXT_TRACKING",
        }
    }

    pub fn default_enabled(self) -> bool {
        true
    }

    pub fn from_key(key: &str) -> Option<Feature> {
        Feature::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// Resolved flag set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FeatureFlags {
    flags: BTreeMap<Feature, bool>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            flags: Feature::ALL
                .into_iter()
                .map(|f| (f, f.default_enabled()))
                .collect(),
        }
    }
}

impl FeatureFlags {
    /// Loads flags from the config file and the process environment.
    pub fn load(config_file: &Path) -> Self {
        Self::load_with(config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`FeatureFlags::load`] with an injectable environment lookup.
    pub fn load_with(config_file: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let mut flags = FeatureFlags::default();

        for (feature, enabled) in read_config_file(config_file) {
            flags.set(feature, enabled);
        }

        for feature in Feature::ALL {
            if let Some(value) = env(&format!("{}{}", ENV_PREFIX, feature.key())) {
                // Anything other than "true" disables, matching the hook scripts.
                flags.set(feature, value.trim() == "true");
            }
        }

        flags
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.flags
            .get(&feature)
            .copied()
            .unwrap_or_else(|| feature.default_enabled())
    }

    pub fn set(&mut self, feature: Feature, enabled: bool) {
        self.flags.insert(feature, enabled);
    }
}

fn read_config_file(path: &Path) -> Vec<(Feature, bool)> {
    if !path.exists() {
        return Vec::new();
    }

    let parsed = fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|content| {
            serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content)
                .map_err(|e| e.to_string())
        });

    match parsed {
        Ok(map) => map
            .iter()
            .filter_map(|(key, value)| Some((Feature::from_key(key)?, value.as_bool()?)))
            .collect(),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Could not load feature flags; using defaults");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_enable_everything() {
        let flags = FeatureFlags::default();
        assert!(Feature::ALL.iter().all(|f| flags.is_enabled(*f)));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = tempdir().unwrap();
        let flags = FeatureFlags::load_with(&temp.path().join("nope.json"), no_env);
        assert_eq!(flags, FeatureFlags::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("feature-flags.json");
        fs::write(&file, r#"{"DEFER_LOADING": false, "NOT_A_FLAG": false}"#).unwrap();

        let flags = FeatureFlags::load_with(&file, no_env);
        assert!(!flags.is_enabled(Feature::DeferLoading));
        assert!(flags.is_enabled(Feature::SkillDiscovery));
    }

    #[test]
    fn test_env_overrides_file() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("feature-flags.json");
        fs::write(&file, r#"{"SKILL_DISCOVERY": false, "WORK_TRACKING": true}"#).unwrap();

        let flags = FeatureFlags::load_with(&file, |key| match key {
            "MAESTRO_FEATURE_SKILL_DISCOVERY" => Some("true".to_string()),
            "MAESTRO_FEATURE_WORK_TRACKING" => Some("0".to_string()),
            _ => None,
        });
        assert!(flags.is_enabled(Feature::SkillDiscovery));
        assert!(!flags.is_enabled(Feature::WorkTracking));
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("feature-flags.json");
        fs::write(&file, "{not json").unwrap();

        let flags = FeatureFlags::load_with(&file, no_env);
        assert_eq!(flags, FeatureFlags::default());
    }

    #[test]
    fn test_serializes_as_flat_object() {
        let json = serde_json::to_value(FeatureFlags::default()).unwrap();
        assert_eq!(json["DEFER_LOADING"], serde_json::Value::Bool(true));
        assert_eq!(json.as_object().unwrap().len(), Feature::ALL.len());
    }
}
