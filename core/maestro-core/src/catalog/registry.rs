//! Loads the agent and skill catalogs.
//!
//! Declaration order in the files is preserved (serde_json `preserve_order`)
//! because the scorer breaks ties by it.

use fs_err as fs;
use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{MaestroError, Result};
use crate::scoring::signals::invalid_patterns;
use crate::storage::MaestroPaths;

use super::types::{CandidateKind, CandidateProfile, ProfileSpec};

/// Ordered set of candidate profiles.
#[derive(Debug, Clone, Default)]
pub struct CandidateRegistry {
    candidates: Vec<CandidateProfile>,
}

impl CandidateRegistry {
    pub fn new(candidates: Vec<CandidateProfile>) -> Self {
        Self { candidates }
    }

    /// Reads `agents/agent-registry.json` then `skills/skill-rules.json`.
    ///
    /// A single absent file is fine; both absent, or either unparsable, is a
    /// fatal registry error.
    pub fn load(paths: &MaestroPaths) -> Result<Self> {
        let agents_path = paths.agent_registry_file();
        let skills_path = paths.skill_rules_file();

        let agents = read_catalog(&agents_path, "agents", CandidateKind::Agent)?;
        let skills = read_catalog(&skills_path, "skills", CandidateKind::Skill)?;

        if agents.is_none() && skills.is_none() {
            return Err(MaestroError::RegistryMissing {
                agents: agents_path,
                skills: skills_path,
            });
        }

        let candidates: Vec<_> = agents
            .unwrap_or_default()
            .into_iter()
            .chain(skills.unwrap_or_default())
            .collect();

        for candidate in &candidates {
            for pattern in invalid_patterns(&candidate.triggers.intent_patterns) {
                tracing::warn!(
                    candidate = %candidate.name,
                    pattern = %pattern,
                    "Invalid intent pattern, it will never match"
                );
            }
        }

        tracing::debug!(count = candidates.len(), "Candidate registry loaded");
        Ok(Self { candidates })
    }

    pub fn candidates(&self) -> &[CandidateProfile] {
        &self.candidates
    }

    pub fn get(&self, name: &str) -> Option<&CandidateProfile> {
        self.candidates.iter().find(|c| c.name == name)
    }

    /// Keeps only candidates of the given kinds, preserving order.
    pub fn filtered(&self, keep: impl Fn(CandidateKind) -> bool) -> Vec<CandidateProfile> {
        self.candidates
            .iter()
            .filter(|c| keep(c.kind))
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }
}

/// Returns `Ok(None)` when the file does not exist.
fn read_catalog(
    path: &Path,
    section: &str,
    kind: CandidateKind,
) -> Result<Option<Vec<CandidateProfile>>> {
    if !path.exists() {
        return Ok(None);
    }

    let malformed = |details: String| MaestroError::RegistryMalformed {
        path: path.to_path_buf(),
        details,
    };

    let content = fs::read_to_string(path).map_err(|e| malformed(e.to_string()))?;
    let root: Value = serde_json::from_str(&content).map_err(|e| malformed(e.to_string()))?;
    let entries: &Map<String, Value> = root
        .get(section)
        .and_then(Value::as_object)
        .ok_or_else(|| malformed(format!("missing \"{}\" object", section)))?;

    let mut profiles = Vec::with_capacity(entries.len());
    for (name, raw) in entries {
        let spec: ProfileSpec = serde_json::from_value(raw.clone())
            .map_err(|e| malformed(format!("{}: {}", name, e)))?;
        profiles.push(CandidateProfile::from_spec(name.clone(), kind, spec));
    }

    Ok(Some(profiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(paths: &MaestroPaths, agents: Option<&str>, skills: Option<&str>) {
        if let Some(body) = agents {
            let file = paths.agent_registry_file();
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, body).unwrap();
        }
        if let Some(body) = skills {
            let file = paths.skill_rules_file();
            fs::create_dir_all(file.parent().unwrap()).unwrap();
            fs::write(file, body).unwrap();
        }
    }

    #[test]
    fn test_missing_registry_is_fatal() {
        let temp = tempdir().unwrap();
        let paths = MaestroPaths::for_project(temp.path());
        let err = CandidateRegistry::load(&paths).unwrap_err();
        assert!(matches!(err, MaestroError::RegistryMissing { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_corrupt_registry_is_fatal() {
        let temp = tempdir().unwrap();
        let paths = MaestroPaths::for_project(temp.path());
        write(&paths, Some("{\"agents\": "), None);
        let err = CandidateRegistry::load(&paths).unwrap_err();
        assert!(matches!(err, MaestroError::RegistryMalformed { .. }));
    }

    #[test]
    fn test_registry_without_section_is_malformed() {
        let temp = tempdir().unwrap();
        let paths = MaestroPaths::for_project(temp.path());
        write(&paths, None, Some(r#"{"rules": {}}"#));
        assert!(CandidateRegistry::load(&paths).is_err());
    }

    #[test]
    fn test_declaration_order_is_preserved() {
        let temp = tempdir().unwrap();
        let paths = MaestroPaths::for_project(temp.path());
        write(
            &paths,
            Some(r#"{"agents": {"zeta": {}, "alpha": {}, "mid": {"internal": true}}}"#),
            Some(r#"{"skills": {"writing": {}, "analysis": {}}}"#),
        );

        let registry = CandidateRegistry::load(&paths).unwrap();
        let names: Vec<_> = registry
            .candidates()
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid", "writing", "analysis"]);
        assert_eq!(registry.get("writing").unwrap().kind, CandidateKind::Skill);
        assert!(registry.get("mid").unwrap().internal);
    }

    #[test]
    fn test_filtered_by_kind() {
        let registry = CandidateRegistry::new(vec![
            CandidateProfile::new("a", CandidateKind::Agent),
            CandidateProfile::new("s", CandidateKind::Skill),
        ]);
        let skills = registry.filtered(|k| k == CandidateKind::Skill);
        assert_eq!(skills.len(), 1);
        assert_eq!(skills[0].name, "s");
    }
}
