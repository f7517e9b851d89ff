//! MCP `remember` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `remember` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RememberParams {
    /// The insight or fact to remember.
    #[schemars(description = "The insight or fact to remember (concise but complete)")]
    pub content: String,

    /// Category: decision, fact, preference, finding, todo, or general.
    #[schemars(
        description = "Type of insight: decision, fact, preference, finding, todo, general. Defaults to general."
    )]
    pub category: Option<String>,

    /// Importance: low, medium, high, or critical.
    #[schemars(description = "Priority level: low, medium, high, critical. Defaults to medium.")]
    pub importance: Option<String>,

    /// Comma-separated keywords for easier retrieval.
    #[schemars(description = "Comma-separated keywords for easier retrieval (e.g. 'odoo,bug,migration')")]
    pub tags: Option<String>,
}
