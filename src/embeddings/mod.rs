//! Embedding generation module
//!
//! Turns note text into fixed-length vectors for the correlation graph.
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `EmbeddingProvider` trait: async interface for embedding generation
//! - `FastEmbedProvider`: in-process ONNX models (default)
//! - `HttpEmbeddingProvider`: any OpenAI-compatible API (Ollama, OpenAI, LiteLLM, vLLM, etc.)
//! - `MockEmbeddingProvider`: deterministic mock for tests
//! - `CachedEmbeddingProvider`: caller-owned TTL cache around any provider

pub mod cache;
pub mod local;
pub mod mock;
pub mod provider;
pub mod traits;

pub use cache::CachedEmbeddingProvider;
pub use local::FastEmbedProvider;
pub use mock::MockEmbeddingProvider;
pub use provider::HttpEmbeddingProvider;
pub use traits::EmbeddingProvider;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Which embedding backend to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Fastembed,
    Http,
    Mock,
}

impl std::str::FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fastembed" | "local" => Ok(Self::Fastembed),
            "http" | "openai" | "ollama" => Ok(Self::Http),
            "mock" => Ok(Self::Mock),
            other => anyhow::bail!("unknown embedding provider '{}'", other),
        }
    }
}

/// Embedding configuration section (`embedding:` in YAML).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: ProviderKind,
    /// Model identifier; the provider's own default when absent
    pub model: Option<String>,
    /// Endpoint for the `http` provider
    pub url: String,
    pub api_key: Option<String>,
    /// Expected vector length for the `http` and `mock` providers
    pub dimensions: usize,
    /// ONNX model cache directory for the `fastembed` provider
    pub cache_dir: Option<PathBuf>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Fastembed,
            model: None,
            url: "http://localhost:11434/v1/embeddings".into(),
            api_key: None,
            dimensions: 384,
            cache_dir: None,
        }
    }
}

/// Construct the provider selected by `config`.
///
/// The model is chosen once here; builders cannot switch it per call.
pub fn from_config(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.provider {
        ProviderKind::Fastembed => Arc::new(FastEmbedProvider::new(
            config.model.as_deref().unwrap_or(local::DEFAULT_MODEL),
            config.cache_dir.clone(),
        )?),
        ProviderKind::Http => Arc::new(
            HttpEmbeddingProvider::new(
                config.url.clone(),
                config.model.clone().unwrap_or_else(|| "all-minilm".into()),
                config.api_key.clone(),
                config.dimensions,
            )
            .context("Failed to create HTTP embedding provider")?,
        ),
        ProviderKind::Mock => Arc::new(MockEmbeddingProvider::new(config.dimensions)),
    };

    tracing::info!(
        provider = ?config.provider,
        model = provider.model_name(),
        dimensions = provider.dimensions(),
        "Embedding provider ready"
    );
    Ok(provider)
}
