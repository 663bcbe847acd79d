//! Event handler for Claude Code hooks.
//!
//! Reads one payload from stdin, runs it through the engine, and prints
//! whatever text the engine wants injected into the conversation.
//!
//! ## Event Routing
//!
//! ```text
//! UserPromptSubmit / raw text → session classification + recommendations
//! PreToolUse / PostToolUse    → active domain, used agents and skills
//! PreCompact / SubagentStop   → session backup
//! Stop                        → evaluation compliance
//! SessionEnd                  → backup, reset, archive
//! ```

use chrono::Utc;
use maestro_core::{HookPayload, MaestroEngine, MaestroPaths};
use std::io::{self, Read, Write};

use crate::HookError;

pub fn run() -> Result<(), HookError> {
    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(HookError::Stdin)?;

    let mut stdout = io::stdout().lock();
    run_with(&input, &mut stdout)
}

pub(crate) fn run_with(input: &str, out: &mut impl Write) -> Result<(), HookError> {
    let Some(payload) = HookPayload::parse(input) else {
        return Ok(());
    };

    let paths = MaestroPaths::resolve(payload.cwd());
    tracing::debug!(project = %paths.project_root().display(), "Resolved project");
    let engine = MaestroEngine::new(paths);

    if let Some(text) = engine.handle(&payload, Utc::now())? {
        writeln!(out, "{}", text).map_err(HookError::Stdout)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn payload(cwd: &std::path::Path, body: &str) -> String {
        format!(
            r#"{{"hook_event_name":"UserPromptSubmit","session_id":"s1","cwd":"{}",{}}}"#,
            cwd.display(),
            body
        )
    }

    #[test]
    fn test_empty_input_is_noop() {
        let mut out = Vec::new();
        run_with("  ", &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_prompt_renders_recommendation() {
        if std::env::var_os(maestro_core::storage::PROJECT_DIR_ENV).is_some() {
            return;
        }
        let temp = tempdir().unwrap();
        let agents = temp.path().join(".claude/agents");
        fs::create_dir_all(&agents).unwrap();
        fs::write(
            agents.join("agent-registry.json"),
            r#"{"agents": {"base-research": {"priority": "high", "triggers": {"keywords": ["research"]}}}}"#,
        )
        .unwrap();

        let mut out = Vec::new();
        run_with(&payload(temp.path(), r#""prompt":"research caching options""#), &mut out)
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("## base-research (agent, high priority)"));
    }

    #[test]
    fn test_missing_registry_is_an_error() {
        if std::env::var_os(maestro_core::storage::PROJECT_DIR_ENV).is_some() {
            return;
        }
        let temp = tempdir().unwrap();
        let mut out = Vec::new();
        let err = run_with(&payload(temp.path(), r#""prompt":"anything""#), &mut out).unwrap_err();
        assert!(matches!(err, HookError::Core(_)));
    }
}
