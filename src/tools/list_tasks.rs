use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListTasksParams {
    #[schemars(description = "ID of the agent whose tasks to list")]
    pub agent_id: String,

    #[schemars(description = "Filter by status: 'pending', 'in_progress', 'completed', 'blocked'")]
    pub status: Option<String>,

    #[schemars(description = "Maximum number of results to return (1-100). Defaults to 10.")]
    pub limit: Option<usize>,

    #[schemars(description = "Number of results to skip (pagination). Defaults to 0.")]
    pub offset: Option<usize>,
}
