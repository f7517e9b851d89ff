//! MCP `chunk` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `chunk` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChunkParams {
    /// The text content to externalize (max 2 MiB).
    #[schemars(description = "The text content to save as a chunk (max 2 MiB)")]
    pub content: String,

    /// Brief description; auto-generated from the first line when empty.
    #[schemars(description = "Brief description of the chunk. Auto-generated from the first line when empty.")]
    pub summary: Option<String>,

    /// Comma-separated keywords.
    #[schemars(description = "Comma-separated keywords for retrieval")]
    pub tags: Option<String>,

    /// Project name; auto-detected from RLM_PROJECT, git root, or CWD.
    #[schemars(description = "Project name. Auto-detected from RLM_PROJECT env, git root, or CWD when omitted.")]
    pub project: Option<String>,

    /// Optional ticket reference (e.g. "JJ-123").
    #[schemars(description = "Optional ticket reference, e.g. 'JJ-123'")]
    pub ticket: Option<String>,

    /// Optional domain (e.g. "dev", "seo", "r&d").
    #[schemars(description = "Optional domain, e.g. 'dev', 'seo', 'r&d'")]
    pub domain: Option<String>,
}
