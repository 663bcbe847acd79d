//! What tool activity tells us about the session.
//!
//! Two things are extracted from tool events: the coarse domain of an edited
//! file, and the name of an agent or skill the model actually used.

use serde_json::Value;

/// Tools that modify files. Other tools never move the active domain.
pub const FILE_MODIFYING_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "write_file", "replace"];

pub fn is_file_modifying_tool(tool: &str) -> bool {
    FILE_MODIFYING_TOOLS.contains(&tool)
}

/// Coarse domain of a file path. First matching rule wins.
pub fn domain_for_path(path: &str) -> &'static str {
    let path = path.replace('\\', "/");
    let p = path.as_str();

    if p.contains("src/components/")
        || p.contains("src/pages/")
        || p.ends_with(".jsx")
        || p.ends_with(".tsx")
    {
        "frontend"
    } else if p.contains("src/server/")
        || p.contains("api/")
        || p.ends_with(".py")
        || p.ends_with(".go")
        || p.ends_with(".rs")
    {
        "backend"
    } else if p.contains("test/") || p.ends_with(".test.js") || p.ends_with(".spec.js") {
        "testing"
    } else if p.contains("docs/") || p.ends_with(".md") {
        "documentation"
    } else {
        "general"
    }
}

/// Name of the agent (`Task`) or skill (`Skill`) a tool call invoked.
pub fn used_candidate(tool: &str, tool_input: Option<&Value>) -> Option<String> {
    let key = match tool {
        "Task" => "subagent_type",
        "Skill" => "skill",
        _ => return None,
    };
    tool_input?
        .get(key)?
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
