//! MCP `sessions` and `domains` tool parameter definitions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `sessions` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionsParams {
    /// Filter by project name.
    #[schemars(description = "Filter by project name")]
    pub project: Option<String>,

    /// Filter by domain.
    #[schemars(description = "Filter by domain")]
    pub domain: Option<String>,

    /// Maximum number of sessions to return (default 10).
    #[schemars(description = "Maximum number of sessions to return. Defaults to 10.")]
    pub limit: Option<usize>,
}

/// Parameters for the `domains` MCP tool (none).
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct DomainsParams {}
