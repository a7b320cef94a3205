pub mod claude;
pub mod markers;
pub mod tail;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::de;

/// One parsed transcript line.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEvent {
    /// `None` when the line has no timestamp or it does not parse.
    pub timestamp: Option<DateTime<Utc>>,
    pub blocks: Vec<ContentBlock>,
}

/// The content blocks the status line cares about. Everything else in the
/// transcript is dropped while parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    /// A sub-agent task was launched.
    TaskLaunch {
        id: String,
        agent_type: String,
        model: Option<String>,
        description: String,
    },
    /// A tool result, with its text flattened.
    TaskResult { correlates_to: String, text: String },
    /// A full replacement of the todo list.
    TodoSnapshot(Vec<TodoItem>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// One todo entry. A `null` or mistyped field reads as empty/unknown so the
/// item still counts toward the total.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TodoItem {
    #[serde(default, deserialize_with = "de::or_default")]
    pub content: String,
    #[serde(default, deserialize_with = "de::or_default")]
    pub status: TodoStatus,
}

impl TodoItem {
    pub fn is_done(&self) -> bool {
        self.status == TodoStatus::Completed
    }
}
