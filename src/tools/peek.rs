//! MCP `peek` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `peek` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PeekParams {
    /// ID of the chunk to read.
    #[schemars(description = "ID of the chunk to read")]
    pub id: String,

    /// First line to return (1-based, inclusive).
    #[schemars(description = "First line to return (1-based, inclusive). Defaults to 1.")]
    pub start_line: Option<usize>,

    /// Last line to return (1-based, inclusive).
    #[schemars(description = "Last line to return (1-based, inclusive). Defaults to the last line.")]
    pub end_line: Option<usize>,
}
