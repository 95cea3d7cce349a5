use crate::error::{Result, VectorStoreError};
use crate::types::Record;
use std::path::{Path, PathBuf};

pub const DEFAULT_STORE_FILE: &str = "memory_store.json";

/// JSON file holding the full record collection as an array.
#[derive(Debug, Clone)]
pub struct RecordFile {
    path: PathBuf,
}

impl RecordFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record. A missing file is an empty collection; an unreadable one is an error.
    pub async fn load(&self) -> Result<Vec<Record>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No store file at {:?}, starting empty", self.path);
                return Ok(Vec::new());
            }
            Err(err) => return Err(self.corrupt(err)),
        };
        let records: Vec<Record> = serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e))?;
        log::info!("Loaded {} records from {:?}", records.len(), self.path);
        Ok(records)
    }

    /// Overwrite the file with `records` (write to a temp sibling, then rename).
    pub async fn save(&self, records: &[Record]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let bytes = serde_json::to_vec_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        log::debug!("Saved {} records to {:?}", records.len(), self.path);
        Ok(())
    }

    fn corrupt(&self, reason: impl std::fmt::Display) -> VectorStoreError {
        VectorStoreError::CorruptStore {
            path: self.path.clone(),
            reason: reason.to_string(),
        }
    }
}
