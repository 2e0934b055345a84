//! Local embeddings via fastembed (ONNX Runtime, in-process).
//!
//! Default embedding provider. Runs sentence-embedding models in-process, so
//! a correlation graph can be built without any embedding server. The model
//! is downloaded into the cache directory on first use.
//!
//! Default model: `all-MiniLM-L6-v2` (384d).

use super::traits::EmbeddingProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use fastembed::{EmbeddingModel, TextEmbedding, TextInitOptions};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const DEFAULT_MODEL: &str = "all-minilm-l6-v2";

/// Model name → `EmbeddingModel` variant mapping.
///
/// Accepts short lowercase identifiers and their Hugging Face repository
/// names. Falls back to `AllMiniLML6V2` for unknown names.
fn parse_model_name(name: &str) -> EmbeddingModel {
    let lower = name.to_lowercase();
    let short = lower
        .strip_prefix("sentence-transformers/")
        .or_else(|| lower.strip_prefix("baai/"))
        .or_else(|| lower.strip_prefix("intfloat/"))
        .unwrap_or(&lower);

    match short {
        "all-minilm-l6-v2" => EmbeddingModel::AllMiniLML6V2,
        "all-minilm-l12-v2" => EmbeddingModel::AllMiniLML12V2,
        "bge-small-en-v1.5" => EmbeddingModel::BGESmallENV15,
        "bge-base-en-v1.5" => EmbeddingModel::BGEBaseENV15,
        "bge-large-en-v1.5" => EmbeddingModel::BGELargeENV15,
        "multilingual-e5-small" => EmbeddingModel::MultilingualE5Small,
        "multilingual-e5-base" => EmbeddingModel::MultilingualE5Base,
        "multilingual-e5-large" => EmbeddingModel::MultilingualE5Large,
        "nomic-embed-text-v1.5" => EmbeddingModel::NomicEmbedTextV15,
        _ => {
            tracing::warn!(
                model = name,
                "Unknown embedding model, falling back to all-MiniLM-L6-v2 (384d)"
            );
            EmbeddingModel::AllMiniLML6V2
        }
    }
}

/// Vector length of `model`, 384 when fastembed has no metadata for it.
fn model_dimensions(model: &EmbeddingModel) -> usize {
    TextEmbedding::get_model_info(model)
        .map(|info| info.dim)
        .unwrap_or(384)
}

/// In-process sentence embeddings.
///
/// `TextEmbedding::embed` takes `&mut self`, so the model sits behind a mutex
/// and every batch runs on the blocking pool.
pub struct FastEmbedProvider {
    model: Arc<Mutex<TextEmbedding>>,
    model_name: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load `model_name` (see [`DEFAULT_MODEL`]), caching ONNX files in
    /// `cache_dir` when given.
    ///
    /// Fails when the model cannot be downloaded or loaded.
    pub fn new(model_name: &str, cache_dir: Option<PathBuf>) -> Result<Self> {
        let variant = parse_model_name(model_name);
        let dimensions = model_dimensions(&variant);
        let model_name = format!("{:?}", variant);

        let mut options = TextInitOptions::new(variant).with_show_download_progress(false);
        if let Some(dir) = cache_dir {
            options = options.with_cache_dir(dir);
        }

        let embedding =
            TextEmbedding::try_new(options).with_context(|| format!("Failed to load {}", model_name))?;

        tracing::info!(
            model = %model_name,
            dimensions,
            "Local embedding model loaded"
        );

        Ok(Self {
            model: Arc::new(Mutex::new(embedding)),
            model_name,
            dimensions,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors.pop().context("FastEmbed returned no vector")
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let owned = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || model.blocking_lock().embed(owned, None))
            .await
            .context("FastEmbed inference task panicked")?
            .with_context(|| format!("FastEmbed failed on a batch of {}", texts.len()))?;

        tracing::debug!(texts = texts.len(), model = %self.model_name, "Embedded batch locally");
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}
