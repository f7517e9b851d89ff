//! MCP retention tool parameter definitions
//! (`retention_preview`, `retention_run`, `restore`).

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Parameters for the `retention_preview` MCP tool (none).
#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct RetentionPreviewParams {}

/// Parameters for the `retention_run` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RetentionRunParams {
    /// Archive old unused chunks (default true).
    #[schemars(description = "Archive old unused chunks. Defaults to true.")]
    pub archive: Option<bool>,

    /// Purge very old archives (default false; requires explicit opt-in).
    #[schemars(description = "Purge very old archives. Defaults to false; must be requested explicitly.")]
    pub purge: Option<bool>,
}

/// Parameters for the `restore` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RestoreParams {
    /// ID of the archived chunk to restore.
    #[schemars(description = "ID of the archived chunk to restore to the active zone")]
    pub id: String,
}
