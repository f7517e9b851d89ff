//! Transformer embedding backend (fastembed / ONNX).
//!
//! paraphrase-multilingual-MiniLM-L12-v2, 384 dimensions. Heavier than the
//! static backend but more accurate; used as the fallback.

use std::sync::Mutex;

use anyhow::{Context, Result};
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::EmbeddingProvider;

const DIM: usize = 384;

pub struct FastEmbedProvider {
    // Inference sessions are not guaranteed Sync; serialize access.
    model: Mutex<TextEmbedding>,
}

impl FastEmbedProvider {
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
                .with_show_download_progress(false),
        )
        .context("failed to load fastembed model")?;
        Ok(Self {
            model: Mutex::new(model),
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut model = self
            .model
            .lock()
            .map_err(|e| anyhow::anyhow!("embedding model lock poisoned: {e}"))?;
        let rows = model
            .embed(texts.to_vec(), None)
            .context("fastembed inference failed")?;
        Ok(rows)
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn name(&self) -> &'static str {
        "fastembed"
    }
}
