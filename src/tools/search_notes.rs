//! MCP `search_notes` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search_notes` MCP tool. All given filters must match.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchNotesParams {
    /// Case-insensitive substring matched against note content.
    #[schemars(description = "Text to search for in note content (case-insensitive)")]
    pub query: Option<String>,

    #[schemars(description = "Filter by task ID")]
    pub task_id: Option<String>,

    #[schemars(description = "Filter by subtask ID")]
    pub subtask_id: Option<String>,

    #[schemars(description = "Filter by agent ID")]
    pub agent_id: Option<String>,

    /// Maximum number of results (1–100). Defaults to 10.
    #[schemars(description = "Maximum number of results to return (1-100). Defaults to 10.")]
    pub limit: Option<usize>,

    #[schemars(description = "Number of results to skip (pagination). Defaults to 0.")]
    pub offset: Option<usize>,
}
