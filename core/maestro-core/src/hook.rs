//! Hook payloads as delivered on stdin.
//!
//! Claude Code sends one JSON object per hook invocation. Some older hook
//! wiring pipes the bare prompt text instead, so anything that is not a JSON
//! object is treated as raw text. A JSON object is always an envelope, even
//! when it does not parse as one.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Session id used when neither the event nor the document carries one.
pub const UNKNOWN_SESSION_ID: &str = "unknown-session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    PreCompact,
    SubagentStop,
    Stop,
    SessionEnd,
}

impl HookEvent {
    pub fn name(self) -> &'static str {
        match self {
            HookEvent::UserPromptSubmit => "UserPromptSubmit",
            HookEvent::PreToolUse => "PreToolUse",
            HookEvent::PostToolUse => "PostToolUse",
            HookEvent::PreCompact => "PreCompact",
            HookEvent::SubagentStop => "SubagentStop",
            HookEvent::Stop => "Stop",
            HookEvent::SessionEnd => "SessionEnd",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub hook_event_name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub tool_name: Option<String>,
    #[serde(default)]
    pub tool_input: Option<Value>,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub cwd: Option<String>,
    #[serde(default)]
    pub transcript_path: Option<String>,
    /// RFC 3339 string or epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl HookInput {
    /// Maps the event name. Untagged payloads are classified by content: a
    /// tool name means a tool event, a prompt means a prompt event.
    pub fn to_event(&self) -> Option<HookEvent> {
        match self.hook_event_name.as_deref() {
            Some("UserPromptSubmit") => Some(HookEvent::UserPromptSubmit),
            Some("PreToolUse") => Some(HookEvent::PreToolUse),
            Some("PostToolUse") => Some(HookEvent::PostToolUse),
            Some("PreCompact") => Some(HookEvent::PreCompact),
            Some("SubagentStop") => Some(HookEvent::SubagentStop),
            Some("Stop") => Some(HookEvent::Stop),
            Some("SessionEnd") => Some(HookEvent::SessionEnd),
            Some(_) => None,
            None if self.tool_name().is_some() => Some(HookEvent::PostToolUse),
            None if self.prompt.is_some() => Some(HookEvent::UserPromptSubmit),
            None => None,
        }
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_name
            .as_deref()
            .or(self.tool.as_deref())
            .filter(|t| !t.is_empty())
    }

    /// `file_path`, then `file`, then the tool input's `file_path`.
    pub fn file_path(&self) -> Option<&str> {
        self.file_path
            .as_deref()
            .or(self.file.as_deref())
            .or_else(|| {
                self.tool_input
                    .as_ref()
                    .and_then(|input| input.get("file_path"))
                    .and_then(Value::as_str)
            })
            .filter(|p| !p.is_empty())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref().filter(|id| !id.is_empty())
    }

    /// Event time, or `fallback` when absent or unparsable.
    pub fn timestamp_or(&self, fallback: DateTime<Utc>) -> DateTime<Utc> {
        let parsed = match self.timestamp.as_ref() {
            Some(Value::String(ts)) => DateTime::parse_from_rfc3339(ts)
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            Some(Value::Number(ms)) => ms.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        };
        parsed.unwrap_or(fallback)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum HookPayload {
    Json(HookInput),
    RawText(String),
}

impl HookPayload {
    /// `None` for empty input and for JSON objects that are not a valid
    /// envelope.
    pub fn parse(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.starts_with('{') {
            if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
                return match serde_json::from_value::<HookInput>(value) {
                    Ok(hook_input) => Some(HookPayload::Json(hook_input)),
                    Err(e) => {
                        tracing::warn!(error = %e, "Malformed hook envelope, ignoring event");
                        None
                    }
                };
            }
            tracing::debug!("Input is not JSON, using raw text");
        }
        Some(HookPayload::RawText(trimmed.to_string()))
    }

    pub fn cwd(&self) -> Option<&str> {
        match self {
            HookPayload::Json(input) => input.cwd.as_deref(),
            HookPayload::RawText(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_prompt_event() {
        let payload = HookPayload::parse(
            r#"{"hook_event_name":"UserPromptSubmit","session_id":"abc","prompt":"hi","cwd":"/tmp/p"}"#,
        )
        .unwrap();
        let HookPayload::Json(input) = payload else {
            panic!("expected JSON payload");
        };
        assert_eq!(input.to_event(), Some(HookEvent::UserPromptSubmit));
        assert_eq!(input.session_id(), Some("abc"));
        assert_eq!(input.cwd.as_deref(), Some("/tmp/p"));
    }

    #[test]
    fn test_raw_text_and_empty_input() {
        assert_eq!(HookPayload::parse("   \n"), None);
        assert_eq!(
            HookPayload::parse("refactor the parser"),
            Some(HookPayload::RawText("refactor the parser".to_string()))
        );
        assert!(matches!(
            HookPayload::parse("{not json"),
            Some(HookPayload::RawText(_))
        ));
    }

    #[test]
    fn test_untagged_tool_envelope() {
        let input: HookInput =
            serde_json::from_str(r#"{"tool":"Edit","file":"src/api/users.ts"}"#).unwrap();
        assert_eq!(input.to_event(), Some(HookEvent::PostToolUse));
        assert_eq!(input.tool_name(), Some("Edit"));
        assert_eq!(input.file_path(), Some("src/api/users.ts"));
    }

    #[test]
    fn test_file_path_from_tool_input() {
        let input: HookInput = serde_json::from_str(
            r#"{"hook_event_name":"PostToolUse","tool_name":"Write","tool_input":{"file_path":"docs/a.md"}}"#,
        )
        .unwrap();
        assert_eq!(input.file_path(), Some("docs/a.md"));
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let input: HookInput =
            serde_json::from_str(r#"{"hook_event_name":"Notification","tool":"Edit"}"#).unwrap();
        assert_eq!(input.to_event(), None);
    }

    #[test]
    fn test_timestamp_fallback() {
        let fallback = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let input = HookInput {
            timestamp: Some(Value::from("2026-02-03T04:05:06Z")),
            ..Default::default()
        };
        assert_eq!(
            input.timestamp_or(fallback),
            Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap()
        );
        let bad = HookInput {
            timestamp: Some(Value::from("yesterday")),
            ..Default::default()
        };
        assert_eq!(bad.timestamp_or(fallback), fallback);
    }

    #[test]
    fn test_epoch_millis_timestamp() {
        let payload = HookPayload::parse(
            r#"{"hook_event_name":"SessionEnd","session_id":"s1","timestamp":1767225600000}"#,
        )
        .unwrap();
        let HookPayload::Json(input) = payload else {
            panic!("expected JSON payload");
        };
        assert_eq!(input.to_event(), Some(HookEvent::SessionEnd));
        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            input.timestamp_or(fallback),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_malformed_envelope_is_never_a_prompt() {
        assert_eq!(
            HookPayload::parse(r#"{"hook_event_name":"SessionEnd","session_id":42}"#),
            None
        );
        let Some(HookPayload::Json(input)) = HookPayload::parse(r#"{"timestamp":true}"#) else {
            panic!("expected JSON payload");
        };
        let fallback = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(input.timestamp_or(fallback), fallback);
    }
}
