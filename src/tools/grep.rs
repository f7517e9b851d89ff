//! MCP `grep` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `grep` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct GrepParams {
    /// Regex (default) or fuzzy text pattern.
    #[schemars(description = "Pattern to search for: case-insensitive regex, or plain text when fuzzy=true")]
    pub pattern: String,

    /// Maximum number of matches (default 10).
    #[schemars(description = "Maximum number of matches to return. Defaults to 10.")]
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

    /// Enable typo-tolerant matching.
    #[schemars(description = "Enable fuzzy matching (tolerates typos). Defaults to false.")]
    pub fuzzy: Option<bool>,

    /// Minimum fuzzy similarity 0-100 (default 80).
    #[schemars(description = "Minimum fuzzy similarity score 0-100. Defaults to 80.")]
    pub fuzzy_threshold: Option<u8>,
}
