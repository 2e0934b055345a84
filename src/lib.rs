//! Notes Graph
//!
//! Turns a database of notes into an interactive graph, either:
//! - a directed relation graph following explicit parent → child links, or
//! - an undirected correlation graph linking notes whose embedded content is
//!   more similar than a cutoff.
//!
//! Notes come from a [`NoteSource`](notes::NoteSource) (Notion or a mock),
//! embeddings from an [`EmbeddingProvider`](embeddings::EmbeddingProvider)
//! (local fastembed, an OpenAI-compatible HTTP endpoint, or a mock), and the
//! result is written as a self-contained HTML document.

pub mod embeddings;
pub mod error;
pub mod graph;
pub mod notes;
pub mod render;

pub use error::{Error, Result};
pub use graph::{
    CorrelationGraphBuilder, CorrelationOptions, GraphBuilder, GraphKind, NotesGraphEngine,
    RelationGraphBuilder, RelationOptions,
};
pub use notes::{IdTitleMap, NoteRecord};
pub use render::LayoutOptions;

use embeddings::EmbeddingConfig;
use notes::NotionConfig;
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Default configuration file, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "notes-graph.yaml";

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub notion: NotionConfig,
    pub embedding: EmbeddingConfig,
    pub correlation: CorrelationOptions,
    pub layout: LayoutOptions,
    pub cache: CacheConfig,
}

/// Cache section, shared by the note and embedding caches
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            max_capacity: 10_000,
        }
    }
}

// ============================================================================
// Runtime config
// ============================================================================

/// Configuration after env var overrides have been applied
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub notion: NotionConfig,
    pub embedding: EmbeddingConfig,
    pub correlation: CorrelationOptions,
    pub layout: LayoutOptions,
    pub cache: CacheConfig,
}

impl Config {
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries [`DEFAULT_CONFIG_FILE`] in CWD. A missing
    /// or malformed file falls back to defaults. Env values that do not parse
    /// are ignored with a warning.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> anyhow::Result<Self> {
        let yaml = Self::load_yaml(yaml_path);
        let YamlConfig {
            mut notion,
            mut embedding,
            mut correlation,
            mut layout,
            mut cache,
        } = yaml;

        if let Ok(token) = std::env::var("NOTION_TOKEN") {
            notion.token = Some(token);
        }
        notion.base_url = std::env::var("NOTION_BASE_URL").unwrap_or(notion.base_url);
        if let Ok(database) = std::env::var("NOTION_DATABASE") {
            notion.database = Some(database);
        }
        notion.children_property =
            std::env::var("NOTION_CHILDREN_PROPERTY").unwrap_or(notion.children_property);

        embedding.provider = env_parse("EMBEDDING_PROVIDER").unwrap_or(embedding.provider);
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            embedding.model = Some(model);
        }
        embedding.url = std::env::var("EMBEDDING_URL").unwrap_or(embedding.url);
        if let Ok(key) = std::env::var("EMBEDDING_API_KEY") {
            embedding.api_key = Some(key);
        }
        embedding.dimensions = env_parse("EMBEDDING_DIMENSIONS").unwrap_or(embedding.dimensions);

        correlation.cutoff = env_parse("CORRELATION_CUTOFF").unwrap_or(correlation.cutoff);
        layout.overlap = env_parse("LAYOUT_OVERLAP").unwrap_or(layout.overlap);
        cache.ttl_secs = env_parse("CACHE_TTL_SECS").unwrap_or(cache.ttl_secs);

        Ok(Self {
            notion,
            embedding,
            correlation,
            layout,
            cache,
        })
    }

    /// Parse the YAML file at `yaml_path` (or [`DEFAULT_CONFIG_FILE`]).
    /// Any failure yields defaults.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let path = yaml_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => {
                tracing::debug!(path = %path.display(), "No config file, using env vars / defaults");
                return YamlConfig::default();
            }
        };

        serde_yaml::from_str(&contents)
            .map(|config| {
                tracing::info!(path = %path.display(), "Loaded config");
                config
            })
            .unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Invalid config file, using defaults");
                YamlConfig::default()
            })
    }
}

/// Parse an env var, warning when it is set but malformed.
fn env_parse<T: FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "Ignoring unparsable env override");
            None
        }
    }
}

/// Install a fmt subscriber filtered by `RUST_LOG`
/// (default `info,notes_graph=debug`).
///
/// Call once at startup; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,notes_graph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod config_tests {
    use super::*;
    use crate::embeddings::ProviderKind;
    use std::io::Write;

    #[test]
    fn test_yaml_config_loading() {
        let yaml = r#"
notion:
  token: secret_abc
  database: Reading list
  children_property: Sub-items

embedding:
  provider: http
  model: nomic-embed-text
  url: http://embed:11434/v1/embeddings
  dimensions: 768

correlation:
  cutoff: 0.75

layout:
  overlap: -250.0
  iterations: 50

cache:
  enabled: false
  ttl_secs: 60
"#;

        let config: YamlConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.notion.token.as_deref(), Some("secret_abc"));
        assert_eq!(config.notion.database.as_deref(), Some("Reading list"));
        assert_eq!(config.notion.children_property, "Sub-items");
        // Unset fields keep their defaults
        assert_eq!(config.notion.title_property, "Name");
        assert_eq!(config.notion.summary_property, "AI summary");
        assert_eq!(config.embedding.provider, ProviderKind::Http);
        assert_eq!(config.embedding.dimensions, 768);
        assert_eq!(config.correlation.cutoff, 0.75);
        assert_eq!(config.layout.overlap, -250.0);
        assert_eq!(config.layout.iterations, 50);
        assert_eq!(config.layout.spring_length, 100.0);
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 60);
        assert_eq!(config.cache.max_capacity, 10_000);
    }

    #[test]
    fn test_yaml_defaults() {
        let config = YamlConfig::default();
        assert_eq!(config.notion.base_url, "https://api.notion.com");
        assert!(config.notion.token.is_none());
        assert_eq!(config.embedding.provider, ProviderKind::Fastembed);
        assert_eq!(config.embedding.dimensions, 384);
        assert_eq!(config.correlation.cutoff, 0.5);
        assert_eq!(config.layout.overlap, -1000.0);
        assert!(config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 3600);
    }

    /// Combined test for YAML file loading, env var overrides, and fallback.
    /// Runs as a single test to avoid parallel env var race conditions.
    #[test]
    fn test_yaml_and_env_lifecycle() {
        fn clear_env() {
            for var in &[
                "NOTION_TOKEN",
                "NOTION_BASE_URL",
                "NOTION_DATABASE",
                "NOTION_CHILDREN_PROPERTY",
                "EMBEDDING_PROVIDER",
                "EMBEDDING_MODEL",
                "EMBEDDING_URL",
                "EMBEDDING_API_KEY",
                "EMBEDDING_DIMENSIONS",
                "CORRELATION_CUTOFF",
                "LAYOUT_OVERLAP",
                "CACHE_TTL_SECS",
            ] {
                std::env::remove_var(var);
            }
        }

        // --- Phase 1: YAML values loaded correctly ---
        let yaml = r#"
notion:
  database: yaml-db
  token: yaml-token
embedding:
  provider: mock
  dimensions: 16
correlation:
  cutoff: 0.6
"#;
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("notes-graph.yaml");
        let mut file = std::fs::File::create(&file_path).unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        clear_env();

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.notion.database.as_deref(), Some("yaml-db"));
        assert_eq!(config.notion.token.as_deref(), Some("yaml-token"));
        assert_eq!(config.embedding.provider, ProviderKind::Mock);
        assert_eq!(config.embedding.dimensions, 16);
        assert_eq!(config.correlation.cutoff, 0.6);

        // --- Phase 2: Env vars override YAML ---
        std::env::set_var("NOTION_DATABASE", "env-db");
        std::env::set_var("EMBEDDING_PROVIDER", "openai");
        std::env::set_var("CORRELATION_CUTOFF", "0.9");
        std::env::set_var("LAYOUT_OVERLAP", "-42");
        std::env::set_var("CACHE_TTL_SECS", "5");
        // Unparsable values are ignored
        std::env::set_var("EMBEDDING_DIMENSIONS", "lots");

        let config = Config::from_yaml_and_env(Some(&file_path)).unwrap();
        assert_eq!(config.notion.database.as_deref(), Some("env-db"));
        assert_eq!(config.embedding.provider, ProviderKind::Http);
        assert_eq!(config.correlation.cutoff, 0.9);
        assert_eq!(config.layout.overlap, -42.0);
        assert_eq!(config.cache.ttl_secs, 5);
        assert_eq!(config.embedding.dimensions, 16);
        // YAML value still used where no env override
        assert_eq!(config.notion.token.as_deref(), Some("yaml-token"));

        clear_env();

        // --- Phase 3: Malformed YAML → defaults ---
        let broken = dir.path().join("broken.yaml");
        std::fs::write(&broken, "notion: [unclosed").unwrap();
        let config = Config::from_yaml_and_env(Some(&broken)).unwrap();
        assert_eq!(config.correlation.cutoff, 0.5);

        // --- Phase 4: No YAML file → defaults ---
        let nonexistent = dir.path().join("nonexistent.yaml");
        let config = Config::from_yaml_and_env(Some(&nonexistent)).unwrap();
        assert_eq!(config.embedding.provider, ProviderKind::Fastembed);
        assert!(config.notion.database.is_none());
        assert_eq!(config.layout.overlap, -1000.0);
    }

    #[test]
    fn test_init_tracing_is_idempotent() {
        init_tracing();
        init_tracing();
    }
}
