//! File-backed snapshots: one pretty-printed JSON file per tier.
//!
//! Storage location: `~/.ctxforge/memory/{working,episodic,semantic,procedural}.json`
//!
//! Files are read whole and written whole. The directory is created on the
//! first write.

use crate::snapshot::{SnapshotStore, Tier};
use async_trait::async_trait;
use ctxforge_core::error::MemoryError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct FileSnapshots {
    dir: PathBuf,
}

impl FileSnapshots {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, tier: Tier) -> PathBuf {
        self.dir.join(tier.file_name())
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshots {
    fn name(&self) -> &str {
        "file"
    }

    async fn read(&self, tier: Tier) -> Result<Option<String>, MemoryError> {
        let path = self.path_for(tier);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(tier = %tier, path = %path.display(), bytes = content.len(), "Snapshot read");
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn write(&self, tier: Tier, document: String) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create memory directory: {e}"))
        })?;

        let path = self.path_for(tier);
        tokio::fs::write(&path, document).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to write {}: {e}", path.display()))
        })?;
        debug!(tier = %tier, path = %path.display(), "Snapshot written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshots::new(dir.path());
        assert!(store.read(Tier::Semantic).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshots::new(dir.path().join("nested").join("memory"));
        store
            .write(Tier::Working, "{\"items\":[]}".into())
            .await
            .unwrap();

        let path = store.path_for(Tier::Working);
        assert!(path.ends_with("working.json"));
        assert!(path.exists());
        assert_eq!(
            store.read(Tier::Working).await.unwrap().as_deref(),
            Some("{\"items\":[]}")
        );
    }

    #[tokio::test]
    async fn write_into_a_file_path_fails() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        // The "directory" is a regular file, so create_dir_all must fail.
        let store = FileSnapshots::new(tmp.path());
        let err = store.write(Tier::Episodic, "{}".into()).await.unwrap_err();
        assert!(matches!(err, MemoryError::Storage(_)));
    }
}
