use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::FailureReason;

/// Hands out collision-free temp file paths for strategy attempts.
///
/// Paths combine the process id, a nanosecond timestamp and an atomic
/// counter, so concurrent requests never collide without any locking.
pub struct ScratchFactory {
    base: PathBuf,
    counter: AtomicU64,
}

impl ScratchFactory {
    pub fn new(prefix: &str) -> Self {
        Self {
            base: std::env::temp_dir().join(prefix),
            counter: AtomicU64::new(0),
        }
    }

    /// Reserve a unique path with the given extension. The file itself
    /// is created by whoever owns the handle (e.g. a downloader).
    pub fn acquire(&self, ext: &str) -> Result<ScopedFile, FailureReason> {
        fs::create_dir_all(&self.base)
            .map_err(|e| FailureReason::ResourceError(format!("{}: {}", self.base.display(), e)))?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let name = format!("{}-{}-{}.{}", std::process::id(), nanos, n, ext);

        Ok(ScopedFile {
            path: self.base.join(name),
            released: false,
        })
    }
}

/// A temp file owned by exactly one strategy attempt.
///
/// `release` is idempotent, and `Drop` calls it too, so the backing
/// file is gone on every exit path — including an attempt whose future
/// is dropped by a timeout.
pub struct ScopedFile {
    path: PathBuf,
    released: bool,
}

impl ScopedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                eprintln!("Warning: could not remove {}: {}", self.path.display(), e);
            }
        }
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn release_removes_the_file_and_is_idempotent() {
        let factory = ScratchFactory::new("scratch-test");
        let mut file = factory.acquire("mp3").unwrap();
        fs::write(file.path(), b"audio").unwrap();
        assert!(file.path().exists());

        file.release();
        assert!(!file.path.exists());
        // Second release is a no-op
        file.release();
    }

    #[test]
    fn drop_removes_the_file() {
        let factory = ScratchFactory::new("scratch-test");
        let path;
        {
            let file = factory.acquire("mp3").unwrap();
            fs::write(file.path(), b"audio").unwrap();
            path = file.path().to_path_buf();
        }
        assert!(!path.exists());
    }

    #[test]
    fn drop_is_fine_when_the_file_was_never_created() {
        let factory = ScratchFactory::new("scratch-test");
        let file = factory.acquire("mp3").unwrap();
        drop(file);
    }

    #[tokio::test]
    async fn concurrent_acquisitions_never_collide() {
        let factory = Arc::new(ScratchFactory::new("scratch-test"));
        let mut handles = Vec::new();

        for _ in 0..16 {
            let factory = Arc::clone(&factory);
            handles.push(tokio::spawn(async move {
                let file = factory.acquire("mp3").unwrap();
                file.path().to_path_buf()
            }));
        }

        let mut paths = HashSet::new();
        for handle in handles {
            assert!(paths.insert(handle.await.unwrap()));
        }
        assert_eq!(paths.len(), 16);
    }
}
