//! Text embedding providers for hybrid search.
//!
//! Two interchangeable back-ends sit behind [`EmbeddingProvider`]:
//! a static-embedding model (`model2vec` feature, 256 dims, fast cold
//! start) and a transformer embedder (`fastembed` feature, 384 dims).
//! `RLM_EMBEDDING_PROVIDER` selects one at startup; when the requested
//! back-end is not compiled in or fails to load, the server degrades to
//! [`DisabledProvider`] and search falls back to BM25-only. That
//! degradation is a normal mode, not an error.

#[cfg(feature = "fastembed")]
pub mod fastembed;
#[cfg(feature = "model2vec")]
pub mod model2vec;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::config::EmbeddingConfig;

/// Trait for embedding text into dense vectors.
///
/// All methods are synchronous — callers in async contexts should use
/// `tokio::task::spawn_blocking`.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts. Returns one row per input.
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Number of dimensions this provider produces. `0` means disabled.
    fn dim(&self) -> usize;

    /// Stable tag persisted alongside stored vectors.
    fn name(&self) -> &'static str;
}

/// The no-provider mode: advertises dimension 0 and produces empty rows.
/// Search skips every semantic step when this provider is active.
pub struct DisabledProvider;

impl EmbeddingProvider for DisabledProvider {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(vec![Vec::new(); texts.len()])
    }

    fn dim(&self) -> usize {
        0
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// `true` when semantic search can run at all.
pub fn is_enabled(provider: &dyn EmbeddingProvider) -> bool {
    provider.dim() > 0
}

/// Create the provider selected by config/env.
///
/// `"auto"` (the default) picks the best compiled-in back-end; an explicit
/// name that is unavailable logs a warning and degrades to disabled.
pub fn create_provider(config: &EmbeddingConfig) -> Arc<dyn EmbeddingProvider> {
    let requested = config.provider.to_lowercase();
    let provider: Arc<dyn EmbeddingProvider> = match requested.as_str() {
        "model2vec" => load_model2vec().unwrap_or_else(unavailable(&requested)),
        "fastembed" => load_fastembed().unwrap_or_else(unavailable(&requested)),
        _ => load_model2vec()
            .or_else(load_fastembed)
            .unwrap_or_else(|| Arc::new(DisabledProvider)),
    };
    if is_enabled(provider.as_ref()) {
        info!(provider = provider.name(), dim = provider.dim(), "embedding provider ready");
    } else {
        info!("no embedding provider available — search runs BM25-only");
    }
    provider
}

fn unavailable(requested: &str) -> impl FnOnce() -> Arc<dyn EmbeddingProvider> + '_ {
    move || {
        warn!(
            provider = requested,
            "requested embedding provider unavailable, degrading to BM25-only"
        );
        Arc::new(DisabledProvider)
    }
}

#[cfg(feature = "model2vec")]
fn load_model2vec() -> Option<Arc<dyn EmbeddingProvider>> {
    match model2vec::Model2VecProvider::new() {
        Ok(p) => Some(Arc::new(p)),
        Err(e) => {
            warn!(error = %e, "failed to load model2vec backend");
            None
        }
    }
}

#[cfg(not(feature = "model2vec"))]
fn load_model2vec() -> Option<Arc<dyn EmbeddingProvider>> {
    None
}

#[cfg(feature = "fastembed")]
fn load_fastembed() -> Option<Arc<dyn EmbeddingProvider>> {
    match fastembed::FastEmbedProvider::new() {
        Ok(p) => Some(Arc::new(p)),
        Err(e) => {
            warn!(error = %e, "failed to load fastembed backend");
            None
        }
    }
}

#[cfg(not(feature = "fastembed"))]
fn load_fastembed() -> Option<Arc<dyn EmbeddingProvider>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_provider_is_inert() {
        let provider = DisabledProvider;
        assert_eq!(provider.dim(), 0);
        assert_eq!(provider.name(), "disabled");
        assert!(!is_enabled(&provider));
        let rows = provider.encode(&["a", "b"]).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.is_empty()));
    }
}
