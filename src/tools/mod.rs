pub mod create_note;
pub mod create_task;
pub mod delete_note;
pub mod evaluate_compaction;
pub mod get_notes_by_task;
pub mod get_task;
pub mod list_tasks;
pub mod search_notes;
pub mod update_note_status;
pub mod update_task_status;

use create_note::CreateNoteParams;
use create_task::CreateTaskParams;
use delete_note::DeleteNoteParams;
use evaluate_compaction::EvaluateCompactionParams;
use get_notes_by_task::GetNotesByTaskParams;
use get_task::GetTaskParams;
use list_tasks::ListTasksParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use rusqlite::Connection;
use search_notes::SearchNotesParams;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use update_note_status::UpdateNoteStatusParams;
use update_task_status::UpdateTaskStatusParams;

use crate::compaction::CompactionEvaluator;
use crate::store::types::{NewNote, NewTask, NoteFilter, TaskFilter, WorkStatus};
use crate::store::{notes, tasks};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// The SRP MCP tool handler. Holds shared state (db connection, compaction
/// evaluator) and exposes all MCP tools via the `#[tool_router]` macro.
#[derive(Clone)]
pub struct SrpTools {
    tool_router: ToolRouter<Self>,
    db: Arc<Mutex<Connection>>,
    evaluator: Arc<CompactionEvaluator>,
}

#[tool_router]
impl SrpTools {
    pub fn new(db: Arc<Mutex<Connection>>, evaluator: Arc<CompactionEvaluator>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            db,
            evaluator,
        }
    }

    /// Run a sync DB operation on the blocking pool.
    async fn with_db<T, F>(&self, op: &'static str, f: F) -> Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> anyhow::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| anyhow::anyhow!("db lock poisoned: {e}"))?;
            f(&mut *conn)
        })
        .await
        .map_err(|e| format!("db task failed: {e}"))?
        .map_err(|e| {
            tracing::error!(op, error = %e, "tool failed");
            format!("{op} failed: {e}")
        })
    }

    /// Create a structured note for a task.
    #[tool(description = "Create a structured note that preserves task context for AI agents. Notes belong to a task (session_YYYYMMDD_NNN) and optionally a subtask.")]
    async fn create_note(
        &self,
        Parameters(params): Parameters<CreateNoteParams>,
    ) -> Result<String, String> {
        if params.content.is_empty() {
            return Err("content must not be empty".into());
        }
        let subtask_status = match &params.subtask_status {
            Some(s) => s.parse::<WorkStatus>()?,
            None => WorkStatus::InProgress,
        };

        tracing::debug!(
            agent_id = %params.agent_id,
            task_id = %params.task_id,
            content_len = params.content.len(),
            "create_note called"
        );

        let new = NewNote {
            note_id: None,
            agent_id: params.agent_id,
            task_id: params.task_id,
            task_title: params.task_title,
            subtask_id: params.subtask_id,
            subtask_title: params.subtask_title,
            content: params.content,
            subtask_status,
            public_state: params.public_state.unwrap_or(true),
            metadata: params.metadata,
        };
        let note = self
            .with_db("create_note", move |conn| notes::create_note(conn, &new))
            .await?;

        to_json(&serde_json::json!({
            "success": true,
            "note_id": note.note_id,
            "subtask_id": note.subtask_id,
            "message": "note created",
        }))
    }

    /// Fetch all notes of a task.
    #[tool(description = "Get all notes attached to a task, newest first. Optionally restrict to one agent.")]
    async fn get_notes_by_task(
        &self,
        Parameters(params): Parameters<GetNotesByTaskParams>,
    ) -> Result<String, String> {
        tracing::debug!(task_id = %params.task_id, "get_notes_by_task called");

        let task_id = params.task_id.clone();
        let found = self
            .with_db("get_notes_by_task", move |conn| {
                notes::find_notes_by_task(conn, &params.task_id, params.agent_id.as_deref())
            })
            .await?;

        to_json(&serde_json::json!({
            "success": true,
            "task_id": task_id,
            "count": found.len(),
            "notes": found,
        }))
    }

    /// Search notes by content and filters.
    #[tool(description = "Search notes by content text (case-insensitive), task, subtask, or agent. Paginated with limit/offset.")]
    async fn search_notes(
        &self,
        Parameters(params): Parameters<SearchNotesParams>,
    ) -> Result<String, String> {
        let limit = clamp_limit(params.limit);
        let offset = params.offset.unwrap_or(0);

        let filter = NoteFilter {
            task_id: params.task_id,
            subtask_id: params.subtask_id,
            agent_id: params.agent_id,
            query: params.query,
            limit: Some(limit),
            offset: Some(offset),
        };
        let echo = filter.clone();
        let found = self
            .with_db("search_notes", move |conn| notes::search_notes(conn, &filter))
            .await?;

        tracing::info!(query = ?echo.query, count = found.len(), "notes searched");

        to_json(&serde_json::json!({
            "success": true,
            "query": echo.query,
            "task_id": echo.task_id,
            "subtask_id": echo.subtask_id,
            "agent_id": echo.agent_id,
            "count": found.len(),
            "limit": limit,
            "offset": offset,
            "notes": found,
        }))
    }

    /// Change the subtask status recorded on a note.
    #[tool(description = "Update the subtask status of a note: pending, in_progress, completed, blocked.")]
    async fn update_note_status(
        &self,
        Parameters(params): Parameters<UpdateNoteStatusParams>,
    ) -> Result<String, String> {
        let status: WorkStatus = params.subtask_status.parse()?;
        tracing::debug!(
            note_id = %params.note_id,
            agent_id = %params.agent_id,
            status = %status,
            "update_note_status called"
        );

        let note_id = params.note_id.clone();
        let updated = self
            .with_db("update_note_status", move |conn| {
                notes::update_note_status(conn, &params.note_id, status)
            })
            .await?
            .ok_or_else(|| format!("note not found: {note_id}"))?;

        to_json(&serde_json::json!({
            "success": true,
            "note": updated,
            "message": format!("subtask status updated to {status}"),
        }))
    }

    /// Delete a note.
    #[tool(description = "Permanently delete a note by ID.")]
    async fn delete_note(
        &self,
        Parameters(params): Parameters<DeleteNoteParams>,
    ) -> Result<String, String> {
        let note_id = params.note_id.clone();
        let deleted = self
            .with_db("delete_note", move |conn| notes::delete_note(conn, &params.note_id))
            .await?;
        if !deleted {
            return Err(format!("note not found: {note_id}"));
        }

        to_json(&serde_json::json!({
            "success": true,
            "note_id": note_id,
        }))
    }

    /// Create a top-level task.
    #[tool(description = "Create a top-level task that groups notes and subtasks. Returns the allocated session_YYYYMMDD_NNN id.")]
    async fn create_task(
        &self,
        Parameters(params): Parameters<CreateTaskParams>,
    ) -> Result<String, String> {
        if params.title.is_empty() {
            return Err("title must not be empty".into());
        }
        tracing::debug!(agent_id = %params.agent_id, "create_task called");

        let new = NewTask {
            task_id: None,
            agent_id: params.agent_id,
            title: params.title,
            description: params.description,
            status: WorkStatus::Pending,
        };
        let task = self
            .with_db("create_task", move |conn| tasks::create_task(conn, &new))
            .await?;

        to_json(&serde_json::json!({
            "success": true,
            "task_id": task.task_id,
            "message": "task created",
        }))
    }

    /// Fetch a task with its notes.
    #[tool(description = "Get a task by ID together with all of its notes.")]
    async fn get_task(
        &self,
        Parameters(params): Parameters<GetTaskParams>,
    ) -> Result<String, String> {
        let task_id = params.task_id.clone();
        let task = self
            .with_db("get_task", move |conn| {
                tasks::find_task_with_notes(conn, &params.task_id, params.agent_id.as_deref())
            })
            .await?
            .ok_or_else(|| format!("task not found: {task_id}"))?;

        to_json(&serde_json::json!({
            "success": true,
            "task": task,
        }))
    }

    /// List an agent's tasks.
    #[tool(description = "List an agent's tasks, newest first, optionally filtered by status. Paginated with limit/offset.")]
    async fn list_tasks(
        &self,
        Parameters(params): Parameters<ListTasksParams>,
    ) -> Result<String, String> {
        let status = params
            .status
            .as_deref()
            .map(str::parse::<WorkStatus>)
            .transpose()?;
        let limit = clamp_limit(params.limit);
        let offset = params.offset.unwrap_or(0);

        let agent_id = params.agent_id.clone();
        let filter = TaskFilter {
            agent_id: Some(params.agent_id),
            status,
            limit: Some(limit),
            offset: Some(offset),
        };
        let found = self
            .with_db("list_tasks", move |conn| tasks::list_tasks(conn, &filter))
            .await?;

        tracing::info!(agent_id = %agent_id, count = found.len(), "tasks listed");

        to_json(&serde_json::json!({
            "success": true,
            "agent_id": agent_id,
            "status": status,
            "count": found.len(),
            "limit": limit,
            "offset": offset,
            "tasks": found,
        }))
    }

    /// Change a task's status.
    #[tool(description = "Update the status of a task: pending, in_progress, completed, blocked.")]
    async fn update_task_status(
        &self,
        Parameters(params): Parameters<UpdateTaskStatusParams>,
    ) -> Result<String, String> {
        let status: WorkStatus = params.status.parse()?;
        let task_id = params.task_id.clone();
        let task = self
            .with_db("update_task_status", move |conn| {
                tasks::update_task_status(conn, &params.task_id, status)
            })
            .await?
            .ok_or_else(|| format!("task not found: {task_id}"))?;

        to_json(&serde_json::json!({
            "success": true,
            "task": task,
        }))
    }

    /// Decide which items survive an upcoming context compaction.
    #[tool(description = "Before a context compaction, decide which items to preserve. Returns preservedContent and removedContent partitions; the configured retention policy decides by priority (high/medium/low).")]
    async fn evaluate_compaction(
        &self,
        Parameters(params): Parameters<EvaluateCompactionParams>,
    ) -> Result<String, String> {
        let context = params.into_context();
        // Pure and non-blocking: runs inline.
        let result = self.evaluator.evaluate(&context);
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for SrpTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "SRP keeps structured notes and tasks for AI agents. Use create_task and \
                 create_note to record progress, search_notes and get_task to recover it, \
                 and evaluate_compaction before a context compaction to decide what to keep."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

fn to_json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("serialization failed: {e}"))
}
