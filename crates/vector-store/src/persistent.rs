use crate::error::{Result, VectorStoreError};
use crate::memory::{MemoryStore, StoreCapabilities};
use crate::persistence::RecordFile;
use crate::store::VectorRecordStore;
use crate::types::{Metadata, Record, SearchHit, SearchOptions};
use async_trait::async_trait;

/// File-backed store: a [`VectorRecordStore`] plus a [`RecordFile`] that is rewritten
/// after every successful mutation.
pub struct PersistentVectorStore {
    inner: VectorRecordStore,
    file: RecordFile,
    initialized: bool,
}

impl PersistentVectorStore {
    pub fn new(inner: VectorRecordStore, file: RecordFile) -> Self {
        Self {
            inner,
            file,
            initialized: false,
        }
    }

    #[must_use]
    pub const fn inner(&self) -> &VectorRecordStore {
        &self.inner
    }

    #[must_use]
    pub const fn file(&self) -> &RecordFile {
        &self.file
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Mutations load the file first so they never overwrite records they have not seen.
    async fn ensure_loaded(&mut self) -> Result<()> {
        if !self.initialized {
            self.initialize().await?;
        }
        Ok(())
    }

    async fn save(&self) -> Result<()> {
        self.file.save(self.inner.records()).await
    }
}

#[async_trait]
impl MemoryStore for PersistentVectorStore {
    async fn add(&mut self, content: &str, metadata: Option<Metadata>) -> Result<Record> {
        self.ensure_loaded().await?;
        let record = self.inner.add(content, metadata).await?;
        self.save().await?;
        Ok(record)
    }

    async fn search(&self, query: &str, options: SearchOptions) -> Result<Vec<SearchHit>> {
        if !self.initialized {
            return Err(VectorStoreError::NotInitialized {
                path: self.file.path().to_path_buf(),
            });
        }
        self.inner.search(query, options).await
    }

    async fn forget(&mut self, id: &str) -> Result<()> {
        self.ensure_loaded().await?;
        self.inner.forget(id);
        self.save().await
    }

    async fn clear(&mut self) -> Result<()> {
        self.ensure_loaded().await?;
        self.inner.clear();
        self.save().await
    }

    fn capabilities(&self) -> StoreCapabilities {
        StoreCapabilities { warm_up: true }
    }

    /// Hydrate from the store file. Runs once; later calls are no-ops.
    async fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        let records = self.file.load().await?;
        self.inner.hydrate(records)?;
        self.initialized = true;
        Ok(())
    }
}
