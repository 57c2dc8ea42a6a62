use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CreateTaskParams {
    #[schemars(description = "ID of the agent creating the task")]
    pub agent_id: String,

    #[schemars(description = "Descriptive task title")]
    pub title: String,

    #[schemars(description = "Detailed task description")]
    pub description: Option<String>,
}
