//! MCP `recall` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `recall` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RecallParams {
    /// Search term matched against insight content and tags.
    #[schemars(description = "Search term matched against insight content and tags")]
    pub query: Option<String>,

    /// Filter by category.
    #[schemars(description = "Filter by category: decision, fact, preference, finding, todo, general")]
    pub category: Option<String>,

    /// Filter by importance.
    #[schemars(description = "Filter by importance: low, medium, high, critical")]
    pub importance: Option<String>,

    /// Maximum number of insights to return (default 10).
    #[schemars(description = "Maximum number of insights to return. Defaults to 10.")]
    pub limit: Option<usize>,
}
