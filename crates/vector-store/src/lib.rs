//! # Recall Vector Store
//!
//! Small semantic memory store: text is embedded into fixed-dimension vectors,
//! stored with metadata, and retrieved by similarity.
//!
//! ## Features
//!
//! - **Direct metric search** by cosine similarity or euclidean distance
//! - **DTS search** (distance-to-samples): every vector is re-expressed as its
//!   distances to five reference samples and profiles are compared instead of vectors
//! - **Pluggable embeddings**: deterministic offline stub or an OpenAI-compatible HTTP endpoint
//! - **Persistent storage** as a JSON array, rewritten after every mutation
//!
//! ## Architecture
//!
//! ```text
//! add(text) / search(query)
//!     │
//!     ├──> EmbeddingProvider (stub | http)
//!     │      └─> Vector[D]
//!     │
//!     ├──> VectorRecordStore
//!     │      ├─> cosine / euclidean scan
//!     │      └─> SampleProfileIndexer ─> profile[5]
//!     │
//!     └──> PersistentVectorStore
//!            └─> RecordFile (JSON)
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use recall_vector_store::{
//!     MemoryStore, PersistentVectorStore, RecordFile, SearchMethod, SearchOptions,
//!     StubEmbedder, VectorRecordStore,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> recall_vector_store::Result<()> {
//!     let core = VectorRecordStore::new(Arc::new(StubEmbedder::default()));
//!     let mut store = PersistentVectorStore::new(core, RecordFile::new("memory_store.json"));
//!     if store.capabilities().warm_up {
//!         store.initialize().await?;
//!     }
//!
//!     store.add("the cat sleeps on the mat", None).await?;
//!
//!     let options = SearchOptions::method(SearchMethod::Cosine).with_limit(3);
//!     for hit in store.search("cat", options).await? {
//!         println!("{}: {:.3}", hit.record.content, hit.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod distance;
mod dts;
mod embeddings;
mod error;
mod memory;
mod persistence;
mod persistent;
mod store;
mod types;

pub use dts::{SampleProfileIndexer, SAMPLE_TARGET};
pub use embeddings::{
    EmbeddingMode, EmbeddingProvider, HttpEmbedder, HttpEmbedderConfig, StubEmbedder,
    DEFAULT_DIMENSION,
};
pub use error::{Result, VectorStoreError};
pub use memory::{MemoryStore, StoreCapabilities};
pub use persistence::{RecordFile, DEFAULT_STORE_FILE};
pub use persistent::PersistentVectorStore;
pub use store::VectorRecordStore;
pub use types::{
    Metadata, Record, SearchHit, SearchMethod, SearchOptions, DEFAULT_SEARCH_LIMIT,
};
