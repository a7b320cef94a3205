//! Markers scraped from the human-readable text of tool results.
//!
//! The host reports asynchronous agent lifecycle only as prose inside tool
//! results, so this is best-effort pattern matching against that prose. If
//! the upstream wording changes, the matchers return `None` and background
//! agents simply stay "running" until they go stale. Nothing here errors.

use std::sync::LazyLock;

use regex::Regex;

const ASYNC_LAUNCH_PHRASE: &str = "Async agent launched";

static AGENT_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"agentId:\s*(?P<id>[a-zA-Z0-9]+)").unwrap());
static TASK_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<task_id>(?P<id>[^<]+)</task_id>").unwrap());
static STATUS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<status>(?P<status>[^<]+)</status>").unwrap());

/// Acknowledgement that a task was started in the background rather than run
/// to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncLaunch {
    /// The id later completion reports will use. `None` when the phrase is
    /// present but the id could not be found.
    pub background_id: Option<String>,
}

/// A status report for a background task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundReport {
    pub task_id: String,
    pub status: String,
}

impl BackgroundReport {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

pub fn async_launch(text: &str) -> Option<AsyncLaunch> {
    if !text.contains(ASYNC_LAUNCH_PHRASE) {
        return None;
    }
    let background_id = AGENT_ID_RE
        .captures(text)
        .map(|caps| caps["id"].to_string());
    Some(AsyncLaunch { background_id })
}

/// Both a `<task_id>` and a `<status>` tag must be present.
pub fn background_report(text: &str) -> Option<BackgroundReport> {
    let task_id = TASK_ID_RE.captures(text)?["id"].to_string();
    let status = STATUS_RE.captures(text)?["status"].to_string();
    Some(BackgroundReport { task_id, status })
}
