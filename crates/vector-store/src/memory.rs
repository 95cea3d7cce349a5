use crate::error::Result;
use crate::store::VectorRecordStore;
use crate::types::{Metadata, Record, SearchHit, SearchOptions};
use async_trait::async_trait;

/// Optional behaviors a [`MemoryStore`] advertises to its callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCapabilities {
    /// The store must be warmed with [`MemoryStore::initialize`] before first use.
    pub warm_up: bool,
}

/// Store surface shared by the in-memory and file-backed stores.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn add(&mut self, content: &str, metadata: Option<Metadata>) -> Result<Record>;

    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>>;

    async fn forget(&mut self, id: &str) -> Result<()>;

    async fn clear(&mut self) -> Result<()>;

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities::default()
    }

    /// Warm-up hook; only meaningful when `capabilities().warm_up` is set.
    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl MemoryStore for VectorRecordStore {
    async fn add(&mut self, content: &str, metadata: Option<Metadata>) -> Result<Record> {
        VectorRecordStore::add(self, content, metadata).await
    }

    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        VectorRecordStore::search(self, query, options).await
    }

    async fn forget(&mut self, id: &str) -> Result<()> {
        VectorRecordStore::forget(self, id);
        Ok(())
    }

    async fn clear(&mut self) -> Result<()> {
        VectorRecordStore::clear(self);
        Ok(())
    }
}
