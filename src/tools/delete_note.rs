use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DeleteNoteParams {
    #[schemars(description = "ID of the note to delete (format: note_YYYYMMDD_NNN)")]
    pub note_id: String,
}
