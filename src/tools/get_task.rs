//! MCP `get_task` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `get_task` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetTaskParams {
    #[schemars(description = "ID of the task to fetch (format: session_YYYYMMDD_NNN)")]
    pub task_id: String,

    /// When set, the task must belong to this agent.
    #[schemars(description = "Optional agent ID; the task must belong to this agent")]
    pub agent_id: Option<String>,
}
