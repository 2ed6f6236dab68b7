//! Task definition, status machine and board events

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Task identifier, allocated in increasing order starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TaskId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Task status
///
/// ```text
/// Running ──► Completed | Error
///    │
///    └──► Stopping ──► Stopped
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Running,
    Stopping,
    Stopped,
    Completed,
    Error,
}

impl TaskStatus {
    /// No further transition possible
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Stopped | TaskStatus::Completed | TaskStatus::Error
        )
    }

    /// Worker thread still owns the task body
    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// Whether `next` is a legal successor of this status
    pub fn can_become(&self, next: TaskStatus) -> bool {
        use TaskStatus::*;
        matches!(
            (self, next),
            (Running, Stopping)
                | (Running, Completed)
                | (Running, Error)
                | (Stopping, Stopped)
        )
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TaskStatus::Running => "Running",
            TaskStatus::Stopping => "Stopping",
            TaskStatus::Stopped => "Stopped",
            TaskStatus::Completed => "Completed",
            TaskStatus::Error => "Error",
        }
    }

    /// Symbol for the task board
    pub fn symbol(&self) -> &'static str {
        match self {
            TaskStatus::Running => "⟳",
            TaskStatus::Stopping => "◌",
            TaskStatus::Stopped => "⊘",
            TaskStatus::Completed => "✓",
            TaskStatus::Error => "✗",
        }
    }

    /// Badge color name, resolved by the presentation theme
    pub fn color_name(&self) -> &'static str {
        match self {
            TaskStatus::Running => "yellow",
            TaskStatus::Stopping => "orange",
            TaskStatus::Stopped => "gray",
            TaskStatus::Completed => "green",
            TaskStatus::Error => "red",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Snapshot of one task for display
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub feature: String,
    pub status: TaskStatus,
    pub started_at: DateTime<Local>,
    pub finished_at: Option<DateTime<Local>>,
    /// Failure detail for `Error`
    pub error: Option<String>,
    /// Still `Stopping` past the stop grace period
    pub overdue: bool,
}

impl TaskInfo {
    pub fn new(id: TaskId, feature: impl Into<String>) -> Self {
        Self {
            id,
            feature: feature.into(),
            status: TaskStatus::Running,
            started_at: Local::now(),
            finished_at: None,
            error: None,
            overdue: false,
        }
    }

    /// Board label, e.g. `Task 3: Slow Task`
    pub fn label(&self) -> String {
        format!("Task {}: {}", self.id, self.feature)
    }
}

/// How a worker's body ended, as reported over the completion queue
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Completed,
    Stopped,
    Error(String),
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed => TaskStatus::Completed,
            TaskOutcome::Stopped => TaskStatus::Stopped,
            TaskOutcome::Error(_) => TaskStatus::Error,
        }
    }
}

/// Message a worker sends when its body returns
#[derive(Debug, Clone)]
pub struct Completion {
    pub id: TaskId,
    pub outcome: TaskOutcome,
}

/// Change on the task board
#[derive(Debug, Clone)]
pub enum TaskEvent {
    Started(TaskInfo),
    Stopping(TaskId),
    Finished {
        id: TaskId,
        status: TaskStatus,
        error: Option<String>,
    },
    Overdue(TaskId),
    Dismissed(TaskId),
}

impl TaskEvent {
    pub fn id(&self) -> TaskId {
        match self {
            TaskEvent::Started(info) => info.id,
            TaskEvent::Stopping(id)
            | TaskEvent::Overdue(id)
            | TaskEvent::Dismissed(id)
            | TaskEvent::Finished { id, .. } => *id,
        }
    }
}
