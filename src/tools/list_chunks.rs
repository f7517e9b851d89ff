//! MCP `list_chunks` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `list_chunks` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ListChunksParams {
    /// Filter by project name.
    #[schemars(description = "Filter by project name")]
    pub project: Option<String>,

    /// Filter by domain.
    #[schemars(description = "Filter by domain")]
    pub domain: Option<String>,

    /// Maximum number of chunks to return (default 20).
    #[schemars(description = "Maximum number of chunks to return. Defaults to 20.")]
    pub limit: Option<usize>,
}
