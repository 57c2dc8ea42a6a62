use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GetNotesByTaskParams {
    #[schemars(description = "ID of the task whose notes to fetch (format: session_YYYYMMDD_NNN)")]
    pub task_id: String,

    #[schemars(description = "Optional agent ID to restrict notes to one agent")]
    pub agent_id: Option<String>,
}
