use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{ContentBlock, LogEvent, TodoItem};

/// Tool names that launch a sub-agent task.
const TASK_TOOLS: &[&str] = &["Task", "proxy_Task"];

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlock {
    ToolUse {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<String>,
        #[serde(default)]
        content: Value,
    },
    #[serde(other)]
    Other,
}

/// Parse a single JSONL line from a Claude Code transcript.
/// Returns `None` for blank lines and lines that are not JSON objects.
pub fn parse_jsonl_line(line: &str) -> Option<LogEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let mut entry = match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(entry)) => entry,
        Ok(_) => {
            tracing::trace!("skipping non-object transcript line");
            return None;
        }
        Err(e) => {
            tracing::trace!("skipping malformed transcript line: {e}");
            return None;
        }
    };

    let timestamp = entry.get("timestamp").and_then(parse_timestamp);

    let content = match entry.remove("message") {
        Some(Value::Object(mut message)) => message.remove("content"),
        _ => None,
    };
    let blocks = match content {
        Some(Value::Array(items)) => items.into_iter().flat_map(map_block).collect(),
        _ => Vec::new(),
    };

    Some(LogEvent { timestamp, blocks })
}

/// Read just the timestamp of a record, for the head of a tailed file.
pub fn record_timestamp(line: &str) -> Option<DateTime<Utc>> {
    let entry: Value = serde_json::from_str(line.trim()).ok()?;
    entry.get("timestamp").and_then(parse_timestamp)
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let raw = value.as_str()?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => Some(ts.with_timezone(&Utc)),
        Err(e) => {
            tracing::trace!("ignoring timestamp {raw:?}: {e}");
            None
        }
    }
}

/// Map one raw content block to zero or more typed blocks. A block that does
/// not deserialize is dropped without affecting its siblings.
fn map_block(raw: Value) -> Vec<ContentBlock> {
    let block: RawBlock = match serde_json::from_value(raw) {
        Ok(block) => block,
        Err(e) => {
            tracing::trace!("skipping content block: {e}");
            return Vec::new();
        }
    };

    let mut out = Vec::new();
    match block {
        RawBlock::ToolUse { id, name, input } => {
            let is_task = name.as_deref().is_some_and(|n| TASK_TOOLS.contains(&n));
            if let (true, Some(id)) = (is_task, id) {
                out.push(ContentBlock::TaskLaunch {
                    id,
                    agent_type: input_str(&input, "subagent_type").unwrap_or("unknown").to_string(),
                    model: input_str(&input, "model").map(String::from),
                    description: input_str(&input, "description").unwrap_or("").to_string(),
                });
            }
            if let Some(Value::Array(todos)) = input.get("todos") {
                let items = todos
                    .iter()
                    .filter_map(|t| serde_json::from_value::<TodoItem>(t.clone()).ok())
                    .collect();
                out.push(ContentBlock::TodoSnapshot(items));
            }
        }
        RawBlock::ToolResult {
            tool_use_id: Some(id),
            content,
        } => {
            out.push(ContentBlock::TaskResult {
                correlates_to: id,
                text: flatten_text(&content),
            });
        }
        RawBlock::ToolResult { .. } | RawBlock::Other => {}
    }
    out
}

fn input_str<'a>(input: &'a Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(|v| v.as_str())
}

/// Tool result content is either a string or a list of blocks with `text`.
fn flatten_text(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect(),
        _ => String::new(),
    }
}
