use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Running,
    Completed,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Completed => write!(f, "completed"),
        }
    }
}

/// A sub-agent task launched during the session.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentTask {
    pub id: String,
    pub agent_type: String,
    pub model: Option<String>,
    pub description: String,
    pub status: AgentStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl AgentTask {
    pub fn running(
        id: impl Into<String>,
        agent_type: impl Into<String>,
        model: Option<String>,
        description: impl Into<String>,
        start_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            agent_type: agent_type.into(),
            model,
            description: description.into(),
            status: AgentStatus::Running,
            start_time,
            end_time: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
    }

    /// When the task stopped, as far as is known. Tasks forced complete by
    /// staleness have no end time and sort by their start.
    pub fn finished_at(&self) -> DateTime<Utc> {
        self.end_time.unwrap_or(self.start_time)
    }
}

/// Why a launch was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejected {
    /// The id is already tracked.
    Duplicate,
    /// At capacity with no completed task to evict.
    Full,
}

/// Bounded, insertion-ordered set of agent tasks for one invocation, plus
/// the links from background task ids back to the tasks that launched them.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    tasks: Vec<AgentTask>,
    background: HashMap<String, String>,
    capacity: usize,
}

impl AgentRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            tasks: Vec::new(),
            background: HashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&AgentTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut AgentTask> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn tasks(&self) -> &[AgentTask] {
        &self.tasks
    }

    /// Track a newly launched task. At capacity, the completed task with the
    /// earliest start is evicted first; running tasks are never evicted.
    pub fn launch(&mut self, task: AgentTask) -> Result<(), Rejected> {
        if self.get(&task.id).is_some() {
            tracing::trace!(id = %task.id, "duplicate launch ignored");
            return Err(Rejected::Duplicate);
        }
        if self.tasks.len() >= self.capacity {
            let oldest = self
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| !t.is_running())
                .min_by_key(|(_, t)| t.start_time)
                .map(|(i, _)| i);
            match oldest {
                Some(i) => {
                    let evicted = self.tasks.remove(i);
                    tracing::trace!(id = %evicted.id, "evicted completed agent");
                }
                None => {
                    tracing::debug!(id = %task.id, "agent registry full, launch dropped");
                    return Err(Rejected::Full);
                }
            }
        }
        self.tasks.push(task);
        Ok(())
    }

    /// Mark a running task completed. Returns false if the task is unknown
    /// or already completed; a second completion never moves the end time.
    pub fn complete(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        match self.get_mut(id) {
            Some(task) if task.is_running() => {
                task.status = AgentStatus::Completed;
                task.end_time = Some(at);
                true
            }
            _ => false,
        }
    }

    /// Remember that `background_id` reports on the task `task_id`.
    pub fn link_background(&mut self, background_id: String, task_id: String) {
        self.background.insert(background_id, task_id);
    }

    /// Complete the task a background id was linked to, if it is still running.
    pub fn complete_background(&mut self, background_id: &str, at: DateTime<Utc>) -> bool {
        match self.background.get(background_id).cloned() {
            Some(task_id) => self.complete(&task_id, at),
            None => false,
        }
    }

    /// Running tasks started more than `max_age` before `now` are presumed
    /// abandoned and shown as completed. The end time is left unknown.
    pub fn expire_stale(&mut self, now: DateTime<Utc>, max_age: Duration) {
        for task in self.tasks.iter_mut().filter(|t| t.is_running()) {
            if now - task.start_time > max_age {
                task.status = AgentStatus::Completed;
            }
        }
    }

    pub fn running(&self) -> impl Iterator<Item = &AgentTask> {
        self.tasks.iter().filter(|t| t.is_running())
    }

    pub fn completed(&self) -> impl Iterator<Item = &AgentTask> {
        self.tasks.iter().filter(|t| !t.is_running())
    }
}
