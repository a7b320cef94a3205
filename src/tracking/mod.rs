pub mod agents;

use chrono::{DateTime, Duration, Utc};

use crate::config::Limits;
use crate::ingest::claude::{parse_jsonl_line, record_timestamp};
use crate::ingest::markers;
use crate::ingest::tail::TranscriptLines;
use crate::ingest::{ContentBlock, LogEvent, TodoItem};

pub use agents::{AgentRegistry, AgentStatus, AgentTask};

/// Session state recovered from the transcript for one refresh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedState {
    pub session_start: Option<DateTime<Utc>>,
    /// Running tasks first, then the most recently completed ones.
    pub agents: Vec<AgentTask>,
    /// The latest todo list seen, in its original order.
    pub todos: Vec<TodoItem>,
}

impl DerivedState {
    pub fn running_agents(&self) -> impl Iterator<Item = &AgentTask> {
        self.agents.iter().filter(|a| a.is_running())
    }

    pub fn running_count(&self) -> usize {
        self.running_agents().count()
    }

    pub fn todos_done(&self) -> usize {
        self.todos.iter().filter(|t| t.is_done()).count()
    }
}

/// Folds transcript events, in order, into a [`DerivedState`].
#[derive(Debug, Clone)]
pub struct Reconstructor {
    limits: Limits,
    now: DateTime<Utc>,
    session_start: Option<DateTime<Utc>>,
    registry: AgentRegistry,
    todos: Vec<TodoItem>,
}

impl Reconstructor {
    /// `now` stands in for missing event timestamps and anchors staleness.
    pub fn new(limits: Limits, now: DateTime<Utc>) -> Self {
        Self {
            limits,
            now,
            session_start: None,
            registry: AgentRegistry::new(limits.max_tracked_agents),
            todos: Vec::new(),
        }
    }

    /// Set the session start ahead of folding, e.g. from the head of a
    /// tailed file. Later events never overwrite it.
    pub fn seed_session_start(&mut self, start: DateTime<Utc>) {
        self.session_start.get_or_insert(start);
    }

    /// Fold one raw line. Blank and malformed lines are skipped.
    pub fn apply_line(&mut self, line: &str) {
        if let Some(event) = parse_jsonl_line(line) {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: LogEvent) {
        if let Some(ts) = event.timestamp {
            self.session_start.get_or_insert(ts);
        }
        let at = event.timestamp.unwrap_or(self.now);

        for block in event.blocks {
            match block {
                ContentBlock::TaskLaunch {
                    id,
                    agent_type,
                    model,
                    description,
                } => {
                    let task = AgentTask::running(id, agent_type, model, description, at);
                    // Rejections are already logged by the registry.
                    let _ = self.registry.launch(task);
                }
                ContentBlock::TodoSnapshot(items) => {
                    self.todos = items;
                }
                ContentBlock::TaskResult {
                    correlates_to,
                    text,
                } => self.apply_result(correlates_to, &text, at),
            }
        }
    }

    fn apply_result(&mut self, correlates_to: String, text: &str, at: DateTime<Utc>) {
        if self.registry.get(&correlates_to).is_some() {
            match markers::async_launch(text) {
                Some(ack) => {
                    if let Some(background_id) = ack.background_id {
                        self.registry.link_background(background_id, correlates_to);
                    }
                }
                None => {
                    self.registry.complete(&correlates_to, at);
                }
            }
        }

        if let Some(report) = markers::background_report(text) {
            if report.is_completed() {
                self.registry.complete_background(&report.task_id, at);
            }
        }
    }

    /// Apply staleness and select the agents worth showing.
    pub fn finish(mut self) -> DerivedState {
        let max_age = Duration::minutes(self.limits.stale_after_minutes);
        self.registry.expire_stale(self.now, max_age);

        let cap = self.limits.max_listed_agents;
        let mut agents: Vec<AgentTask> = self.registry.running().cloned().collect();

        let mut completed: Vec<&AgentTask> = self.registry.completed().collect();
        // Stable sort keeps insertion order among equal finish times.
        completed.sort_by_key(|t| std::cmp::Reverse(t.finished_at()));
        let room = cap.saturating_sub(agents.len());
        agents.extend(completed.into_iter().take(room).cloned());
        agents.truncate(cap);

        DerivedState {
            session_start: self.session_start,
            agents,
            todos: self.todos,
        }
    }
}

/// Reconstruct state from the lines selected by the tail reader.
pub fn reconstruct(transcript: &TranscriptLines, limits: Limits, now: DateTime<Utc>) -> DerivedState {
    let mut fold = Reconstructor::new(limits, now);
    if let Some(start) = transcript.first_record.as_deref().and_then(record_timestamp) {
        fold.seed_session_start(start);
    }
    for line in &transcript.lines {
        fold.apply_line(line);
    }
    fold.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 13, 0, 0).unwrap()
    }

    fn launch(id: &str, ts: &str) -> String {
        format!(
            r#"{{"type":"assistant","timestamp":"{ts}","message":{{"content":[{{"type":"tool_use","id":"{id}","name":"Task","input":{{"subagent_type":"type-{id}","description":"desc {id}"}}}}]}}}}"#
        )
    }

    fn result(id: &str, ts: &str, text: &str) -> String {
        let text = serde_json::to_string(text).unwrap();
        format!(
            r#"{{"type":"user","timestamp":"{ts}","message":{{"content":[{{"type":"tool_result","tool_use_id":"{id}","content":{text}}}]}}}}"#
        )
    }

    fn fold(lines: &[String]) -> DerivedState {
        let mut r = Reconstructor::new(Limits::default(), now());
        for line in lines {
            r.apply_line(line);
        }
        r.finish()
    }

    #[test]
    fn session_start_from_first_timestamped_line() {
        let state = fold(&[
            r#"{"type":"summary"}"#.to_string(),
            launch("a", "2025-01-01T12:40:00Z"),
            launch("b", "2025-01-01T12:45:00Z"),
        ]);
        assert_eq!(
            state.session_start,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 40, 0).unwrap())
        );
    }

    #[test]
    fn seeded_session_start_wins() {
        let seed = Utc.with_ymd_and_hms(2024, 12, 31, 9, 0, 0).unwrap();
        let mut r = Reconstructor::new(Limits::default(), now());
        r.seed_session_start(seed);
        r.apply_line(&launch("a", "2025-01-01T12:40:00Z"));
        assert_eq!(r.finish().session_start, Some(seed));
    }

    #[test]
    fn result_completes_task() {
        let state = fold(&[
            launch("a", "2025-01-01T12:40:00Z"),
            result("a", "2025-01-01T12:42:00Z", "all good"),
        ]);
        assert_eq!(state.running_count(), 0);
        assert_eq!(
            state.agents[0].end_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 42, 0).unwrap())
        );
    }

    #[test]
    fn async_ack_keeps_task_running_until_background_report() {
        let lines = vec![
            launch("a", "2025-01-01T12:40:00Z"),
            result("a", "2025-01-01T12:40:01Z", "Async agent launched. agentId: bg1"),
        ];
        let state = fold(&lines);
        assert_eq!(state.running_count(), 1);

        let mut lines = lines;
        lines.push(result(
            "other_tool",
            "2025-01-01T12:50:00Z",
            "<task_id>bg1</task_id><status>completed</status>",
        ));
        let state = fold(&lines);
        assert_eq!(state.running_count(), 0);
        assert_eq!(
            state.agents[0].end_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 50, 0).unwrap())
        );
    }

    #[test]
    fn unlinked_background_report_is_ignored() {
        let state = fold(&[
            launch("a", "2025-01-01T12:40:00Z"),
            result("x", "2025-01-01T12:50:00Z", "<task_id>zz</task_id><status>completed</status>"),
        ]);
        assert_eq!(state.running_count(), 1);
    }

    #[test]
    fn result_for_untracked_id_is_ignored() {
        let state = fold(&[result("ghost", "2025-01-01T12:50:00Z", "done")]);
        assert!(state.agents.is_empty());
    }

    #[test]
    fn duplicate_completion_is_a_no_op() {
        let state = fold(&[
            launch("a", "2025-01-01T12:40:00Z"),
            result("a", "2025-01-01T12:42:00Z", "done"),
            result("a", "2025-01-01T12:55:00Z", "done again"),
        ]);
        assert_eq!(
            state.agents[0].end_time,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 12, 42, 0).unwrap())
        );
    }

    #[test]
    fn todos_are_last_writer_wins() {
        let first = r#"{"message":{"content":[{"type":"tool_use","id":"w1","name":"TodoWrite","input":{"todos":[{"content":"a","status":"pending"},{"content":"b","status":"pending"}]}}]}}"#;
        let second = r#"{"message":{"content":[{"type":"tool_use","id":"w2","name":"TodoWrite","input":{"todos":[{"content":"c","status":"completed"}]}}]}}"#;
        let state = fold(&[first.to_string(), second.to_string()]);
        assert_eq!(state.todos.len(), 1);
        assert_eq!(state.todos[0].content, "c");
        assert_eq!(state.todos_done(), 1);
    }

    #[test]
    fn stale_running_task_is_shown_completed() {
        let state = fold(&[
            launch("old", "2025-01-01T12:20:00Z"),
            launch("fresh", "2025-01-01T12:50:00Z"),
        ]);
        let running: Vec<&str> = state.running_agents().map(|a| a.id.as_str()).collect();
        assert_eq!(running, vec!["fresh"]);
        let old = state.agents.iter().find(|a| a.id == "old").unwrap();
        assert_eq!(old.status, AgentStatus::Completed);
    }

    #[test]
    fn launch_without_timestamp_uses_now() {
        let line = r#"{"message":{"content":[{"type":"tool_use","id":"a","name":"Task","input":{}}]}}"#;
        let state = fold(&[line.to_string()]);
        assert_eq!(state.agents[0].start_time, now());
        assert_eq!(state.session_start, None);
    }

    #[test]
    fn list_caps_running_first_then_newest_completed() {
        let mut lines = Vec::new();
        for i in 0..8 {
            let id = format!("c{i}");
            lines.push(launch(&id, "2025-01-01T12:40:00Z"));
            lines.push(result(&id, &format!("2025-01-01T12:4{i}:30Z"), "ok"));
        }
        for i in 0..4 {
            lines.push(launch(&format!("r{i}"), "2025-01-01T12:55:00Z"));
        }
        let state = fold(&lines);
        let ids: Vec<&str> = state.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["r0", "r1", "r2", "r3", "c7", "c6", "c5", "c4", "c3", "c2"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let state = fold(&[
            launch("a", "2025-01-01T12:40:00Z"),
            "{\"message\": {\"content\": [".to_string(),
            String::new(),
            launch("b", "2025-01-01T12:41:00Z"),
        ]);
        assert_eq!(state.running_count(), 2);
    }

    #[test]
    fn refolding_is_deterministic() {
        let lines = vec![
            launch("a", "2025-01-01T12:40:00Z"),
            result("a", "2025-01-01T12:41:00Z", "Async agent launched agentId: q1"),
            launch("b", "2025-01-01T12:42:00Z"),
            result("b", "2025-01-01T12:43:00Z", "done"),
            result("z", "2025-01-01T12:44:00Z", "<task_id>q1</task_id><status>completed</status>"),
        ];
        assert_eq!(fold(&lines), fold(&lines));
    }

    #[test]
    fn reconstruct_uses_first_record_for_start() {
        let transcript = TranscriptLines {
            first_record: Some(r#"{"timestamp":"2025-01-01T08:00:00Z"}"#.to_string()),
            lines: vec![launch("a", "2025-01-01T12:40:00Z")],
        };
        let state = reconstruct(&transcript, Limits::default(), now());
        assert_eq!(
            state.session_start,
            Some(Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap())
        );
        assert_eq!(state.running_count(), 1);
    }
}
