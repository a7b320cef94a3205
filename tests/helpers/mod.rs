use std::io::Write;

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::NamedTempFile;

/// Fixed "current time" for deterministic durations and staleness.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap()
}

pub fn minutes_ago(m: i64) -> DateTime<Utc> {
    now() - Duration::minutes(m)
}

fn ts(at: DateTime<Utc>) -> String {
    at.to_rfc3339()
}

/// Build a JSONL assistant line launching a Task agent.
pub fn jsonl_launch(id: &str, agent_type: &str, model: Option<&str>, at: DateTime<Utc>) -> String {
    let model = model
        .map(|m| format!(r#","model":"{m}""#))
        .unwrap_or_default();
    format!(
        r#"{{"type":"assistant","sessionId":"s1","timestamp":"{}","message":{{"role":"assistant","content":[{{"type":"tool_use","id":"{id}","name":"Task","input":{{"subagent_type":"{agent_type}","description":"{agent_type} for {id}"{model}}}}}]}}}}"#,
        ts(at)
    )
}

/// Build a JSONL user line carrying a tool result.
pub fn jsonl_result(tool_use_id: &str, text: &str, at: DateTime<Utc>) -> String {
    let text = serde_json::to_string(text).unwrap();
    format!(
        r#"{{"type":"user","sessionId":"s1","timestamp":"{}","message":{{"role":"user","content":[{{"type":"tool_result","tool_use_id":"{tool_use_id}","content":{text}}}]}}}}"#,
        ts(at)
    )
}

/// Build a TodoWrite line from (content, status) pairs.
pub fn jsonl_todos(items: &[(&str, &str)], at: DateTime<Utc>) -> String {
    let todos: Vec<serde_json::Value> = items
        .iter()
        .map(|(content, status)| serde_json::json!({ "content": content, "status": status }))
        .collect();
    let line = serde_json::json!({
        "type": "assistant",
        "timestamp": ts(at),
        "message": {
            "role": "assistant",
            "content": [{ "type": "tool_use", "id": "todo", "name": "TodoWrite", "input": { "todos": todos } }]
        }
    });
    line.to_string()
}

/// Build a JSONL user message with no tool blocks.
pub fn jsonl_user_msg(at: DateTime<Utc>) -> String {
    format!(
        r#"{{"type":"user","timestamp":"{}","message":{{"role":"user","content":"hello"}}}}"#,
        ts(at)
    )
}

pub fn write_jsonl(lines: &[String]) -> NamedTempFile {
    let mut tmp = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(tmp, "{}", line).unwrap();
    }
    tmp.flush().unwrap();
    tmp
}

/// Snapshot JSON as the host would pipe it.
pub fn snapshot_json(used_percentage: Option<f64>, transcript: Option<&std::path::Path>) -> String {
    let mut snap = serde_json::json!({
        "model": { "id": "claude-opus-4-5-20251101", "display_name": "Opus" },
        "version": "2.0.1",
        "cost": { "total_lines_added": 0, "total_lines_removed": 0 },
    });
    if let Some(pct) = used_percentage {
        snap["context_window"] = serde_json::json!({ "used_percentage": pct });
    }
    if let Some(path) = transcript {
        snap["transcript_path"] = serde_json::json!(path.to_string_lossy());
    }
    snap.to_string()
}
