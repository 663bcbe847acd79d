//! Compiled regex patterns for reading prompts and transcripts.
//!
//! Compiled once on first use. Update these when the conversation markers
//! emitted by the agent runtime or the evaluation agent change.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Prompt Parsing Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// "what skills", "list agents", "recommend skills", ...
pub static RE_EXPLICIT_LISTING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(what|show|list|available|which|recommend)\s+(skills|agents)\b").unwrap()
});

/// Words that mark a prompt as a multi-step request.
pub static RE_MULTI_STEP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(then|afterwards|after\s+that|followed\s+by|step\s+by\s+step|finally|subsequently)\b",
    )
    .unwrap()
});

// ═══════════════════════════════════════════════════════════════════════════════
// Transcript Parsing Regexes
// ═══════════════════════════════════════════════════════════════════════════════

/// Any sign that the Task tool delegated to a subagent.
pub static RE_TASK_TOOL_USE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(<invoke name="task">|"name"\s*:\s*"Task"|\bDelegating to.*agent\b|\bTask tool to delegate\b|\bsubagent_type\\?"?\s*[=:])"#,
    )
    .unwrap()
});

pub static RE_EVALUATION_REPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b4-?D[- ]EVALUATION REPORT\b").unwrap());

pub static RE_EVALUATION_AGENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)subagent_type\\?"?\s*[=:]\s*\\?["']4d-evaluation\\?["']"#).unwrap()
});

pub static RE_VERDICT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bVERDICT:\s*(EXCELLENT|NEEDS REFINEMENT)\b").unwrap());

/// Markers a subagent leaves when it hands its output back.
pub static RE_SUBAGENT_RETURN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(\bREPORT\b|\bTask Complete\b|</?function_results>|\b(EVIDENCE|VERIFICATION|FINDINGS|IMPLEMENTATION):|\bReturning to Maestro\b|\bDelegating back to Maestro\b)",
    )
    .unwrap()
});

/// Any trace of an evaluation, complete or not.
pub static RE_EVALUATION_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(4-?D[- ]EVALUATION|VERDICT|EXCELLENT|NEEDS REFINEMENT|(Product|Process|Performance) Discernment)\b",
    )
    .unwrap()
});

pub static RE_PRODUCT_DISCERNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bProduct Discernment\b").unwrap());
pub static RE_PROCESS_DISCERNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bProcess Discernment\b").unwrap());
pub static RE_PERFORMANCE_DISCERNMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPerformance Discernment\b").unwrap());

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_listing() {
        assert!(RE_EXPLICIT_LISTING.is_match("What skills do I have?"));
        assert!(RE_EXPLICIT_LISTING.is_match("please list   agents"));
        assert!(!RE_EXPLICIT_LISTING.is_match("improve my skills at chess"));
    }

    #[test]
    fn test_multi_step() {
        assert!(RE_MULTI_STEP.is_match("Build it, then deploy"));
        assert!(RE_MULTI_STEP.is_match("do this step by step"));
        assert!(!RE_MULTI_STEP.is_match("refactor the authentication module and write tests"));
        assert!(!RE_MULTI_STEP.is_match("thenceforth"));
    }

    #[test]
    fn test_task_tool_markers() {
        assert!(RE_TASK_TOOL_USE.is_match(r#"<invoke name="Task">"#));
        assert!(RE_TASK_TOOL_USE.is_match(r#"{"type":"tool_use","name":"Task","input":{}}"#));
        assert!(RE_TASK_TOOL_USE.is_match(r#"subagent_type="base-research""#));
        assert!(!RE_TASK_TOOL_USE.is_match("just a normal reply"));
    }

    #[test]
    fn test_evaluation_agent_marker_in_json_transcript() {
        assert!(RE_EVALUATION_AGENT.is_match(r#"subagent_type="4d-evaluation""#));
        assert!(RE_EVALUATION_AGENT.is_match(r#""subagent_type":"4d-evaluation""#));
    }
}
