//! MCP `forget` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `forget` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ForgetParams {
    /// ID of the insight to remove.
    #[schemars(description = "ID of the insight to remove")]
    pub id: String,
}
