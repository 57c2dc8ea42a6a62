//! MCP `create_note` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `create_note` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateNoteParams {
    #[schemars(description = "ID of the agent writing the note")]
    pub agent_id: String,

    #[schemars(description = "ID of the parent task (format: session_YYYYMMDD_NNN)")]
    pub task_id: String,

    #[schemars(description = "Title of the parent task")]
    pub task_title: String,

    #[schemars(description = "ID of the subtask (format: subtask_YYYYMMDD_NNN). Allocated automatically when only subtask_title is given.")]
    pub subtask_id: Option<String>,

    #[schemars(description = "Title of the subtask")]
    pub subtask_title: Option<String>,

    #[schemars(description = "Descriptive note content with the relevant details")]
    pub content: String,

    #[schemars(description = "Subtask status: 'pending', 'in_progress', 'completed', 'blocked'. Defaults to 'in_progress'.")]
    pub subtask_status: Option<String>,

    #[schemars(description = "Whether the note is visible to other agents (true) or private to this agent (false). Defaults to true.")]
    pub public_state: Option<bool>,

    #[schemars(description = "Optional JSON metadata blob")]
    pub metadata: Option<serde_json::Value>,
}
