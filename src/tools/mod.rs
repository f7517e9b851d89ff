//! MCP tool surface — fourteen flat tools dispatched over stdio.
//!
//! Each tool parses its parameters, runs the corresponding core operation
//! on a blocking thread, and returns a JSON payload. Errors cross the
//! boundary as tagged strings, never as raw I/O errors; the process keeps
//! running.

pub mod chunk;
pub mod forget;
pub mod grep;
pub mod list_chunks;
pub mod peek;
pub mod recall;
pub mod remember;
pub mod retention;
pub mod search;
pub mod sessions;
pub mod status;

use std::future::Future;
use std::sync::Arc;

use rmcp::handler::server::tool::Parameters;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};

use chunk::ChunkParams;
use forget::ForgetParams;
use grep::GrepParams;
use list_chunks::ListChunksParams;
use peek::PeekParams;
use recall::RecallParams;
use remember::RememberParams;
use retention::{RestoreParams, RetentionPreviewParams, RetentionRunParams};
use search::SearchParams;
use sessions::{DomainsParams, SessionsParams};
use status::StatusParams;

use crate::config::RlmConfig;
use crate::search as search_engine;
use crate::search::SearchOptions;
use crate::store::navigation::ChunkFilters;
use crate::store::types::{Category, Importance};
use crate::store::{self, chunks, insights, navigation, retention as retention_ops, sessions as session_ops, ContextStore};

/// The MCP tool handler. Holds the shared store handle and config; all
/// tools are registered through the `#[tool_router]` macro.
#[derive(Clone)]
pub struct RlmTools {
    tool_router: ToolRouter<Self>,
    store: Arc<ContextStore>,
    config: Arc<RlmConfig>,
}

/// Split a comma-separated tag string into trimmed, non-empty tags.
fn split_tags(tags: Option<&str>) -> Vec<String> {
    tags.map(|t| {
        t.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    })
    .unwrap_or_default()
}

/// Parse an optional enum-valued parameter, treating empty strings as unset.
fn parse_opt<T: std::str::FromStr<Err = String>>(value: Option<&str>) -> Result<Option<T>, String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .transpose()
}

fn filters_from(
    project: Option<String>,
    domain: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
    entity: Option<String>,
) -> ChunkFilters {
    ChunkFilters {
        project: project.filter(|s| !s.is_empty()),
        domain: domain.filter(|s| !s.is_empty()),
        date_from: date_from.filter(|s| !s.is_empty()),
        date_to: date_to.filter(|s| !s.is_empty()),
        entity: entity.filter(|s| !s.is_empty()),
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string(value).map_err(|e| format!("serialization failed: {e}"))
}

#[tool_router]
impl RlmTools {
    pub fn new(store: Arc<ContextStore>, config: Arc<RlmConfig>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            store,
            config,
        }
    }

    /// Run a blocking core operation on a worker thread.
    async fn blocking<R, F>(&self, f: F) -> Result<R, String>
    where
        R: Send + 'static,
        F: FnOnce(&ContextStore) -> Result<R, crate::error::MemoryError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| format!("task failed: {e}"))?
            .map_err(|e| e.to_string())
    }

    // ── Insight memory ────────────────────────────────────────────────────

    #[tool(description = "Save an important insight to persistent memory: decisions, facts, preferences, findings.")]
    async fn remember(
        &self,
        Parameters(params): Parameters<RememberParams>,
    ) -> Result<String, String> {
        let category = parse_opt::<Category>(params.category.as_deref())?
            .unwrap_or(Category::General);
        let importance = parse_opt::<Importance>(params.importance.as_deref())?
            .unwrap_or(Importance::Medium);
        if params.content.trim().is_empty() {
            return Err("content must not be empty".into());
        }
        let tags = split_tags(params.tags.as_deref());
        let content = params.content;

        tracing::info!(
            content_len = content.len(),
            category = %category,
            importance = %importance,
            "remember called"
        );

        let insight = self
            .blocking(move |store| insights::remember(store, &content, category, importance, tags))
            .await?;

        tracing::info!(id = %insight.id, "insight stored");

        to_json(&serde_json::json!({
            "status": "saved",
            "id": insight.id,
            "category": insight.category,
            "importance": insight.importance,
        }))
    }

    #[tool(description = "Retrieve insights from memory, ranked by query relevance when a query is given.")]
    async fn recall(
        &self,
        Parameters(params): Parameters<RecallParams>,
    ) -> Result<String, String> {
        let category = parse_opt::<Category>(params.category.as_deref())?;
        let importance = parse_opt::<Importance>(params.importance.as_deref())?;
        let limit = params.limit.unwrap_or(10);
        let query = params.query.clone();

        let results = self
            .blocking(move |store| {
                insights::recall(store, query.as_deref(), category, importance, limit)
            })
            .await?;

        to_json(&serde_json::json!({
            "count": results.len(),
            "insights": results,
        }))
    }

    #[tool(description = "Remove an insight from memory by ID.")]
    async fn forget(
        &self,
        Parameters(params): Parameters<ForgetParams>,
    ) -> Result<String, String> {
        let id = params.id;
        tracing::info!(id = %id, "forget called");

        let remaining = self.blocking(move |store| insights::forget(store, &id)).await?;

        tracing::info!(remaining, "insight removed");
        to_json(&serde_json::json!({
            "status": "deleted",
            "remaining_insights": remaining,
        }))
    }

    #[tool(description = "Status of the memory system: insight and chunk counts, embedding provider state.")]
    async fn status(
        &self,
        Parameters(_params): Parameters<StatusParams>,
    ) -> Result<String, String> {
        let report = self.blocking(store::status).await?;
        to_json(&report)
    }

    // ── Chunks ────────────────────────────────────────────────────────────

    #[tool(description = "Externalize conversation content as an immutable chunk. Returns the existing ID when identical content was already chunked.")]
    async fn chunk(
        &self,
        Parameters(params): Parameters<ChunkParams>,
    ) -> Result<String, String> {
        let request = chunks::ChunkRequest {
            content: params.content,
            summary: params.summary,
            tags: split_tags(params.tags.as_deref()),
            project: params.project.filter(|s| !s.is_empty()),
            ticket: params.ticket.filter(|s| !s.is_empty()),
            domain: params.domain.filter(|s| !s.is_empty()),
        };

        tracing::info!(
            content_len = request.content.len(),
            project = request.project.as_deref().unwrap_or("(auto)"),
            domain = request.domain.as_deref().unwrap_or(""),
            "chunk called"
        );

        let result = self
            .blocking(move |store| chunks::create_chunk(store, request))
            .await?;

        tracing::info!(
            chunk_id = %result.chunk_id,
            duplicate = result.duplicate,
            tokens = result.tokens_estimate,
            "chunk stored"
        );
        to_json(&result)
    }

    #[tool(description = "Read a chunk (or a 1-based inclusive line range of it). Archived chunks are restored transparently.")]
    async fn peek(&self, Parameters(params): Parameters<PeekParams>) -> Result<String, String> {
        let PeekParams {
            id,
            start_line,
            end_line,
        } = params;
        tracing::debug!(id = %id, ?start_line, ?end_line, "peek called");

        let result = self
            .blocking(move |store| chunks::peek(store, &id, start_line, end_line))
            .await?;
        to_json(&result)
    }

    #[tool(description = "Search a pattern across active chunks: case-insensitive regex, or fuzzy matching with fuzzy=true.")]
    async fn grep(&self, Parameters(params): Parameters<GrepParams>) -> Result<String, String> {
        let limit = params.limit.unwrap_or(10);
        let fuzzy = params.fuzzy.unwrap_or(false);
        let threshold = params
            .fuzzy_threshold
            .unwrap_or(self.config.search.fuzzy_threshold);
        let filters = filters_from(
            params.project,
            params.domain,
            params.date_from,
            params.date_to,
            params.entity,
        );
        let pattern = params.pattern;

        if fuzzy {
            let matches = self
                .blocking(move |store| {
                    navigation::grep_fuzzy(store, &pattern, threshold, &filters, limit)
                })
                .await?;
            to_json(&serde_json::json!({
                "fuzzy": true,
                "threshold": threshold,
                "match_count": matches.len(),
                "matches": matches,
            }))
        } else {
            let matches = self
                .blocking(move |store| navigation::grep(store, &pattern, &filters, limit))
                .await?;
            to_json(&serde_json::json!({
                "match_count": matches.len(),
                "matches": matches,
            }))
        }
    }

    #[tool(description = "List chunks (metadata only), newest first, with optional project/domain filters.")]
    async fn list_chunks(
        &self,
        Parameters(params): Parameters<ListChunksParams>,
    ) -> Result<String, String> {
        let limit = params.limit.unwrap_or(20);
        let project = params.project.filter(|s| !s.is_empty());
        let domain = params.domain.filter(|s| !s.is_empty());

        let listings = self
            .blocking(move |store| {
                navigation::list_chunks(store, project.as_deref(), domain.as_deref(), limit)
            })
            .await?;
        to_json(&serde_json::json!({
            "count": listings.len(),
            "chunks": listings,
        }))
    }

    #[tool(description = "Hybrid search over chunks and insights: BM25 keyword ranking fused with semantic similarity when available.")]
    async fn search(
        &self,
        Parameters(params): Parameters<SearchParams>,
    ) -> Result<String, String> {
        let options = SearchOptions {
            limit: params.limit.unwrap_or(self.config.search.default_limit),
            filters: filters_from(
                params.project,
                params.domain,
                params.date_from,
                params.date_to,
                params.entity,
            ),
            include_insights: params.include_insights.unwrap_or(true),
        };
        let query = params.query;
        tracing::debug!(
            query_len = query.len(),
            limit = options.limit,
            filtered = !options.filters.is_empty(),
            "search called"
        );

        let hits = self
            .blocking(move |store| search_engine::search(store, &query, &options))
            .await?;
        to_json(&serde_json::json!({
            "result_count": hits.len(),
            "results": hits,
        }))
    }

    // ── Browsing ──────────────────────────────────────────────────────────

    #[tool(description = "List sessions (per-day-per-project chunk groupings), newest first.")]
    async fn sessions(
        &self,
        Parameters(params): Parameters<SessionsParams>,
    ) -> Result<String, String> {
        let limit = params.limit.unwrap_or(10);
        let project = params.project.filter(|s| !s.is_empty());
        let domain = params.domain.filter(|s| !s.is_empty());

        let sessions = self
            .blocking(move |store| {
                session_ops::list_sessions(store, project.as_deref(), domain.as_deref(), limit)
            })
            .await?;
        to_json(&serde_json::json!({
            "count": sessions.len(),
            "sessions": sessions,
        }))
    }

    #[tool(description = "List suggested domains plus every domain observed on a chunk.")]
    async fn domains(
        &self,
        Parameters(_params): Parameters<DomainsParams>,
    ) -> Result<String, String> {
        let report = self.blocking(session_ops::list_domains).await?;
        to_json(&report)
    }

    // ── Retention ─────────────────────────────────────────────────────────

    #[tool(description = "Preview which chunks a retention pass would archive or purge. Read-only.")]
    async fn retention_preview(
        &self,
        Parameters(_params): Parameters<RetentionPreviewParams>,
    ) -> Result<String, String> {
        let preview = self.blocking(retention_ops::preview).await?;
        to_json(&preview)
    }

    #[tool(description = "Run retention: archive unused chunks older than 30 days; purge archives older than 180 days when purge=true.")]
    async fn retention_run(
        &self,
        Parameters(params): Parameters<RetentionRunParams>,
    ) -> Result<String, String> {
        let archive = params.archive.unwrap_or(true);
        let purge = params.purge.unwrap_or(false);
        tracing::info!(archive, purge, "retention_run called");

        let report = self
            .blocking(move |store| retention_ops::run(store, archive, purge))
            .await?;

        tracing::info!(
            archived = report.archived.len(),
            purged = report.purged.len(),
            errors = report.errors.len(),
            "retention_run finished"
        );
        to_json(&report)
    }

    #[tool(description = "Restore an archived chunk back to the active zone.")]
    async fn restore(
        &self,
        Parameters(params): Parameters<RestoreParams>,
    ) -> Result<String, String> {
        let id = params.id;
        tracing::info!(id = %id, "restore called");

        self.blocking(move |store| retention_ops::restore_chunk(store, &id))
            .await?;

        tracing::info!("chunk restored to active zone");
        to_json(&serde_json::json!({ "status": "restored" }))
    }
}

#[tool_handler]
impl ServerHandler for RlmTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Persistent context memory for coding agents. Use remember/recall for \
                 insights, chunk/peek/search for externalized conversation fragments, \
                 and retention_* to manage the archive lifecycle."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}
