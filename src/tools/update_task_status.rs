use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateTaskStatusParams {
    #[schemars(description = "ID of the task to update (format: session_YYYYMMDD_NNN)")]
    pub task_id: String,

    #[schemars(description = "New status: 'pending', 'in_progress', 'completed', 'blocked'")]
    pub status: String,
}
