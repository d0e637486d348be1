use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use tokio::fs;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockContentSource;

/// Raw beatmap file access, needed when difficulty is calculated on the fly.
///
/// A missing beatmap file is returned as empty content rather than an
/// error; deciding whether that is fatal is up to the caller.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn content(&self, beatmap_id: u32) -> Result<Vec<u8>>;
}

/// Beatmap files stored as `<root>/<beatmap id>.osu`.
#[derive(Debug, Clone)]
pub struct LocalContentSource {
    root: PathBuf,
}
impl LocalContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, beatmap_id: u32) -> PathBuf {
        self.root.join(format!("{beatmap_id}.osu"))
    }
}

#[async_trait]
impl ContentSource for LocalContentSource {
    async fn content(&self, beatmap_id: u32) -> Result<Vec<u8>> {
        match fs::read(self.path(beatmap_id)).await {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            result => result.or_raise(|| ErrorKind::TransientFetchFailure),
        }
    }
}

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::ContentSource;
    use crate::error::Result;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::RwLock;

    /// In-memory beatmap files for testing.
    #[derive(Debug, Default)]
    pub struct MockContentSource {
        files: RwLock<HashMap<u32, Vec<u8>>>,
        reads: AtomicUsize,
    }

    impl MockContentSource {
        pub fn with_files(files: impl IntoIterator<Item = (u32, impl Into<Vec<u8>>)>) -> Self {
            Self {
                files: RwLock::new(files.into_iter().map(|(id, data)| (id, data.into())).collect()),
                reads: AtomicUsize::new(0),
            }
        }

        pub fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentSource for MockContentSource {
        async fn content(&self, beatmap_id: u32) -> Result<Vec<u8>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.files.read().await.get(&beatmap_id).cloned().unwrap_or_default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("12.osu"), b"osu file format v14").unwrap();
        let source = LocalContentSource::new(temp_dir.path());
        assert_eq!(source.content(12).await.unwrap(), b"osu file format v14");
        assert!(source.content(13).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_content_read_failure_is_transient() {
        let temp_dir = tempfile::tempdir().unwrap();
        // A directory where a file is expected can't be read as one.
        std::fs::create_dir(temp_dir.path().join("12.osu")).unwrap();
        let source = LocalContentSource::new(temp_dir.path());
        let err = source.content(12).await.unwrap_err();
        assert_eq!(*err, ErrorKind::TransientFetchFailure);
    }

    #[tokio::test]
    async fn test_mock_content() {
        let source = MockContentSource::with_files([(1, b"data".to_vec())]);
        assert_eq!(source.content(1).await.unwrap(), b"data");
        assert!(source.content(2).await.unwrap().is_empty());
        assert_eq!(source.reads(), 2);
    }
}
