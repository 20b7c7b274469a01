//! Scoped object download with guaranteed cleanup

use crate::error::{Result, WorkerError};
use crate::queue::ObjectReference;
use crate::store::ObjectStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A downloaded object on local disk.
///
/// The file is removed when this guard drops, on every exit path of a
/// processing cycle. Removal failure is logged and never affects the message
/// outcome.
#[derive(Debug)]
pub struct FetchedObject {
    path: PathBuf,
}

impl FetchedObject {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FetchedObject {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove {}: {}", self.path.display(), e);
        }
    }
}

/// Downloads objects into unique files under a scratch directory.
pub struct ObjectFetcher {
    store: Arc<dyn ObjectStore>,
    scratch_dir: PathBuf,
}

impl ObjectFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, scratch_dir: impl Into<PathBuf>) -> Result<Self> {
        let scratch_dir = scratch_dir.into();
        std::fs::create_dir_all(&scratch_dir)?;
        Ok(Self { store, scratch_dir })
    }

    /// Download the referenced object into a unique local file.
    ///
    /// Paths never collide across in-flight fetches, so concurrent message
    /// processing is safe. On any error the partial local state is already
    /// released by the guard.
    pub async fn fetch(&self, reference: &ObjectReference) -> Result<FetchedObject> {
        let bytes = self.store.get(reference).await?;

        let file = tempfile::Builder::new()
            .prefix("download-")
            .tempfile_in(&self.scratch_dir)?;
        let (handle, path) = file.keep().map_err(|e| WorkerError::Fs(e.error))?;
        drop(handle);

        // Cleanup is the guard's responsibility from this point on, including
        // when the write below fails.
        let fetched = FetchedObject { path };
        tokio::fs::write(fetched.path(), &bytes).await?;

        debug!(
            "Wrote {} bytes for {} to {}",
            bytes.len(),
            reference.key,
            fetched.path().display()
        );
        Ok(fetched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct StaticStore {
        bytes: Vec<u8>,
    }

    #[async_trait]
    impl ObjectStore for StaticStore {
        async fn get(&self, _reference: &ObjectReference) -> Result<Vec<u8>> {
            Ok(self.bytes.clone())
        }
    }

    fn reference() -> ObjectReference {
        ObjectReference {
            bucket: "uploads".to_string(),
            key: "cat.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_writes_object_bytes() {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(StaticStore { bytes: b"image-bytes".to_vec() });
        let fetcher = ObjectFetcher::new(store, scratch.path()).unwrap();

        let fetched = fetcher.fetch(&reference()).await.unwrap();
        let content = std::fs::read(fetched.path()).unwrap();
        assert_eq!(content, b"image-bytes");
    }

    #[tokio::test]
    async fn test_file_is_removed_on_drop() {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(StaticStore { bytes: vec![1, 2, 3] });
        let fetcher = ObjectFetcher::new(store, scratch.path()).unwrap();

        let fetched = fetcher.fetch(&reference()).await.unwrap();
        let path = fetched.path().to_path_buf();
        assert!(path.exists());

        drop(fetched);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_concurrent_fetches_get_unique_paths() {
        let scratch = tempfile::tempdir().unwrap();
        let store = Arc::new(StaticStore { bytes: vec![0; 16] });
        let fetcher = ObjectFetcher::new(store, scratch.path()).unwrap();

        let first = fetcher.fetch(&reference()).await.unwrap();
        let second = fetcher.fetch(&reference()).await.unwrap();
        assert_ne!(first.path(), second.path());
    }
}
