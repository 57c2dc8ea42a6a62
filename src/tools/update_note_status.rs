use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateNoteStatusParams {
    #[schemars(description = "ID of the note to update (format: note_YYYYMMDD_NNN)")]
    pub note_id: String,

    #[schemars(description = "New subtask status: 'pending', 'in_progress', 'completed', 'blocked'")]
    pub subtask_status: String,

    #[schemars(description = "ID of the agent performing the update")]
    pub agent_id: String,
}
