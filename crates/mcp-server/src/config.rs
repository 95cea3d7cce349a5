//! Environment-driven server configuration.

use anyhow::{Context as AnyhowContext, Result};
use recall_vector_store::{
    EmbeddingMode, EmbeddingProvider, HttpEmbedder, HttpEmbedderConfig, PersistentVectorStore,
    RecordFile, StubEmbedder, VectorRecordStore, DEFAULT_DIMENSION, DEFAULT_STORE_FILE,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_STORE_PATH: &str = "MEMORY_FILE_PATH";
pub const ENV_EMBEDDING_MODE: &str = "RECALL_EMBEDDING_MODE";
pub const ENV_EMBEDDING_DIMENSION: &str = "RECALL_EMBEDDING_DIMENSION";
pub const ENV_EMBEDDING_URL: &str = "RECALL_EMBEDDING_URL";
pub const ENV_EMBEDDING_MODEL: &str = "RECALL_EMBEDDING_MODEL";
pub const ENV_EMBEDDING_API_KEY: &str = "RECALL_EMBEDDING_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SAMPLE_SEED: &str = "RECALL_SAMPLE_SEED";

const DEFAULT_EMBEDDING_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub mode: EmbeddingMode,
    pub dimension: usize,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub store_path: PathBuf,
    pub embedding: EmbeddingConfig,
    pub sample_seed: Option<u64>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mode = match get(ENV_EMBEDDING_MODE) {
            Some(raw) => EmbeddingMode::parse(&raw)
                .with_context(|| format!("Invalid {ENV_EMBEDDING_MODE}"))?,
            None => EmbeddingMode::Stub,
        };
        let dimension = match get(ENV_EMBEDDING_DIMENSION) {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .with_context(|| {
                    format!("{ENV_EMBEDDING_DIMENSION} must be a positive integer, got '{raw}'")
                })?,
            None => DEFAULT_DIMENSION,
        };
        let sample_seed = match get(ENV_SAMPLE_SEED) {
            Some(raw) => Some(
                raw.parse::<u64>()
                    .with_context(|| format!("{ENV_SAMPLE_SEED} must be a u64, got '{raw}'"))?,
            ),
            None => None,
        };

        Ok(Self {
            store_path: get(ENV_STORE_PATH)
                .map_or_else(|| PathBuf::from(DEFAULT_STORE_FILE), PathBuf::from),
            embedding: EmbeddingConfig {
                mode,
                dimension,
                base_url: get(ENV_EMBEDDING_URL)
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_URL.to_string()),
                model: get(ENV_EMBEDDING_MODEL)
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                api_key: get(ENV_EMBEDDING_API_KEY).or_else(|| get(ENV_OPENAI_API_KEY)),
            },
            sample_seed,
        })
    }

    pub fn build_embedder(&self) -> Result<Arc<dyn EmbeddingProvider>> {
        let embedding = &self.embedding;
        match embedding.mode {
            EmbeddingMode::Stub => Ok(Arc::new(StubEmbedder::new(embedding.dimension))),
            EmbeddingMode::Http => {
                let embedder = HttpEmbedder::new(HttpEmbedderConfig {
                    base_url: embedding.base_url.clone(),
                    model: embedding.model.clone(),
                    api_key: embedding.api_key.clone(),
                    dimension: embedding.dimension,
                    timeout: HTTP_TIMEOUT,
                })
                .context("Failed to build HTTP embedder")?;
                Ok(Arc::new(embedder))
            }
        }
    }

    /// File-backed store described by this config. Not yet hydrated.
    pub fn build_store(&self) -> Result<PersistentVectorStore> {
        let embedder = self.build_embedder()?;
        let core = match self.sample_seed {
            Some(seed) => VectorRecordStore::with_seed(embedder, seed),
            None => VectorRecordStore::new(embedder),
        };
        log::info!(
            "Memory store at {:?} ({} embeddings, {} dims)",
            self.store_path,
            self.embedding.mode.as_str(),
            self.embedding.dimension
        );
        Ok(PersistentVectorStore::new(
            core,
            RecordFile::new(&self.store_path),
        ))
    }
}
