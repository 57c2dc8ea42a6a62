#![allow(dead_code)]

use rusqlite::Connection;
use srp_mcp::compaction::{CompactableItem, EvaluationContext, ItemKind, Priority};
use srp_mcp::db;
use srp_mcp::store::types::{NewNote, NewTask, WorkStatus};
use srp_mcp::store::{notes, tasks};

/// Open a fresh in-memory database with schema and migrations applied.
pub fn test_db() -> Connection {
    db::open_memory_database().unwrap()
}

/// Create a task for `agent` and return its id.
pub fn insert_task(conn: &mut Connection, agent: &str, title: &str) -> String {
    tasks::create_task(
        conn,
        &NewTask {
            task_id: None,
            agent_id: agent.into(),
            title: title.into(),
            description: None,
            status: WorkStatus::Pending,
        },
    )
    .unwrap()
    .task_id
}

/// Create a note on `task_id` and return its id.
pub fn insert_note(conn: &mut Connection, agent: &str, task_id: &str, content: &str) -> String {
    notes::create_note(conn, &note_for(agent, task_id, content))
        .unwrap()
        .note_id
}

/// A minimal note draft with no subtask.
pub fn note_for(agent: &str, task_id: &str, content: &str) -> NewNote {
    NewNote {
        note_id: None,
        agent_id: agent.into(),
        task_id: task_id.into(),
        task_title: "task".into(),
        subtask_id: None,
        subtask_title: None,
        content: content.into(),
        subtask_status: WorkStatus::InProgress,
        public_state: true,
        metadata: None,
    }
}

pub fn item(id: &str, priority: Priority) -> CompactableItem {
    CompactableItem::new(id, ItemKind::Note, format!("content of {id}"), priority)
}

/// Snapshot for session `s1`, agent `a1`.
pub fn context(items: Vec<CompactableItem>) -> EvaluationContext {
    EvaluationContext::new("s1", "a1", items)
}
