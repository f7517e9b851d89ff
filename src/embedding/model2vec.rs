//! Static-embedding backend (Model2Vec).
//!
//! Multilingual potion model, 256 dimensions, sub-100 ms cold start. The
//! primary backend when compiled in.

use anyhow::{Context, Result};
use model2vec_rs::model::StaticModel;

use super::EmbeddingProvider;

const MODEL_NAME: &str = "minishlab/potion-multilingual-128M";
const DIM: usize = 256;

pub struct Model2VecProvider {
    model: StaticModel,
}

impl Model2VecProvider {
    pub fn new() -> Result<Self> {
        let model = StaticModel::from_pretrained(MODEL_NAME, None, None, None)
            .context("failed to load model2vec static model")?;
        Ok(Self { model })
    }
}

impl EmbeddingProvider for Model2VecProvider {
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let owned: Vec<String> = texts.iter().map(|t| t.to_string()).collect();
        Ok(self.model.encode(&owned))
    }

    fn dim(&self) -> usize {
        DIM
    }

    fn name(&self) -> &'static str {
        "model2vec"
    }
}
