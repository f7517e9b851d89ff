//! MCP server initialization over stdio.
//!
//! Wires the storage root, embedding provider, and tool handler into a
//! running server. The process owns no exit code of its own; the host
//! exits nonzero on transport failure.

use std::sync::Arc;

use anyhow::Result;
use rmcp::ServiceExt;

use crate::config::RlmConfig;
use crate::embedding;
use crate::store::ContextStore;
use crate::tools::RlmTools;

/// Open the store and start serving MCP requests on stdio until the
/// client disconnects.
pub async fn serve_stdio(config: RlmConfig) -> Result<()> {
    tracing::info!("starting RLM MCP server on stdio");

    let config = Arc::new(config);
    let provider = embedding::create_provider(&config.embedding);

    let root = config.resolved_context_dir();
    let store = Arc::new(ContextStore::open(&root, provider, Arc::clone(&config))?);
    tracing::info!(root = %root.display(), "context store ready");

    let tools = RlmTools::new(store, config);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}
