//! Note and task records, plus the filter and patch types the repositories take.

use serde::{Deserialize, Serialize};

/// Progress state shared by tasks and subtasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl WorkStatus {
    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!(
                "unknown status: {s} (expected pending, in_progress, completed, blocked)"
            )),
        }
    }
}

/// A structured note, matching the `notes` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// `note_YYYYMMDD_NNN`
    pub note_id: String,
    pub agent_id: String,
    /// `session_YYYYMMDD_NNN`
    pub task_id: String,
    /// RFC 3339 creation timestamp.
    pub timestamp: String,
    pub task_title: String,
    /// `subtask_YYYYMMDD_NNN`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtask_title: Option<String>,
    pub content: String,
    pub subtask_status: WorkStatus,
    /// Visible to other agents when `true`; private to `agent_id` otherwise.
    pub public_state: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Input for creating a note. The id and timestamp are assigned on insert
/// unless `note_id` is given.
#[derive(Debug, Clone, Default)]
pub struct NewNote {
    pub note_id: Option<String>,
    pub agent_id: String,
    pub task_id: String,
    pub task_title: String,
    pub subtask_id: Option<String>,
    pub subtask_title: Option<String>,
    pub content: String,
    pub subtask_status: WorkStatus,
    pub public_state: bool,
    pub metadata: Option<serde_json::Value>,
}

/// Partial note update. `None` leaves a field unchanged; the nested options on
/// the subtask fields allow clearing them with `Some(None)`.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub agent_id: Option<String>,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    pub subtask_id: Option<Option<String>>,
    pub subtask_title: Option<Option<String>>,
    pub content: Option<String>,
    pub subtask_status: Option<WorkStatus>,
    pub public_state: Option<bool>,
}

/// Note search filters. All set filters must match.
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub task_id: Option<String>,
    pub subtask_id: Option<String>,
    pub agent_id: Option<String>,
    /// Case-insensitive substring of `content`.
    pub query: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// A top-level task, matching the `tasks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// `session_YYYYMMDD_NNN`
    pub task_id: String,
    pub agent_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub status: WorkStatus,
    /// Filled only when the task is fetched together with its notes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Vec<Note>>,
}

#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub task_id: Option<String>,
    pub agent_id: String,
    pub title: String,
    pub description: Option<String>,
    pub status: WorkStatus,
}

#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub agent_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub status: Option<WorkStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub agent_id: Option<String>,
    pub status: Option<WorkStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            WorkStatus::Pending,
            WorkStatus::InProgress,
            WorkStatus::Completed,
            WorkStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<WorkStatus>().unwrap(), status);
        }
        assert!("done".parse::<WorkStatus>().is_err());
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&WorkStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
