//! MCP `search` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `search` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Natural language search query.
    #[schemars(description = "Natural language search query")]
    pub query: String,

    /// Maximum results (default 10).
    #[schemars(description = "Maximum number of results. Defaults to 10.")]
    pub limit: Option<usize>,

    /// Filter by project name.
    #[schemars(description = "Filter by project name")]
    pub project: Option<String>,

    /// Filter by domain.
    #[schemars(description = "Filter by domain")]
    pub domain: Option<String>,

    /// Start date inclusive, YYYY-MM-DD.
    #[schemars(description = "Start date inclusive (YYYY-MM-DD)")]
    pub date_from: Option<String>,

    /// End date inclusive, YYYY-MM-DD.
    #[schemars(description = "End date inclusive (YYYY-MM-DD)")]
    pub date_to: Option<String>,

    /// Filter by entity (case-insensitive substring across all entity types).
    #[schemars(description = "Filter by entity name, case-insensitive substring")]
    pub entity: Option<String>,

    /// Include insights in the result set (default true).
    #[schemars(description = "Include insights in the result set. Defaults to true.")]
    pub include_insights: Option<bool>,
}
