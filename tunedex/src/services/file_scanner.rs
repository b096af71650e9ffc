//! Media file scanner
//!
//! Recursive discovery of every regular file under a root directory. Per-entry failures
//! (permission errors, symlink loops, entries vanishing mid-walk) are logged, counted and
//! skipped; they never abort the walk.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use walkdir::WalkDir;

/// File scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Counters shared between the walk and whoever reports on it
#[derive(Debug, Default)]
pub struct ScanStats {
    discovered: AtomicUsize,
    walk_errors: AtomicUsize,
}

impl ScanStats {
    /// Regular files emitted so far
    pub fn discovered(&self) -> usize {
        self.discovered.load(Ordering::Relaxed)
    }

    /// Entries skipped because they could not be read
    pub fn walk_errors(&self) -> usize {
        self.walk_errors.load(Ordering::Relaxed)
    }
}

/// Lazy sequence of regular files under a root
///
/// Not restartable: a new scan builds a new walk.
pub struct FileWalk {
    inner: walkdir::IntoIter,
    stats: Arc<ScanStats>,
}

impl FileWalk {
    pub fn stats(&self) -> Arc<ScanStats> {
        Arc::clone(&self.stats)
    }
}

impl Iterator for FileWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    // With follow_links, file_type() already describes the link target
                    if entry.file_type().is_file() {
                        self.stats.discovered.fetch_add(1, Ordering::Relaxed);
                        return Some(entry.into_path());
                    }
                }
                Err(e) => {
                    self.stats.walk_errors.fetch_add(1, Ordering::Relaxed);
                    if e.loop_ancestor().is_some() {
                        tracing::warn!("Symlink loop detected: {}", e);
                    } else {
                        tracing::warn!("Error accessing entry: {}", e);
                    }
                    // Continue scanning, don't abort
                }
            }
        }
    }
}

/// Directory tree scanner
#[derive(Debug, Clone, Default)]
pub struct FileScanner {
    follow_links: bool,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Follow symbolic links; walkdir then reports cycles as per-entry errors
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Check the root before walking it
    pub fn validate_root(&self, root_path: &Path) -> Result<(), ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        Ok(())
    }

    /// Lazily walk `root_path`, yielding regular files only
    pub fn walk(&self, root_path: &Path) -> Result<FileWalk, ScanError> {
        self.validate_root(root_path)?;

        Ok(FileWalk {
            inner: WalkDir::new(root_path)
                .follow_links(self.follow_links)
                .into_iter(),
            stats: Arc::new(ScanStats::default()),
        })
    }

    /// Walk on the blocking pool, feeding discovered paths into `tx`
    ///
    /// The walk stops early when `cancel` fires or when the receiver is dropped. The channel
    /// closes once the returned task finishes, which is how consumers learn the walk is done.
    pub fn spawn(
        &self,
        root_path: &Path,
        tx: mpsc::Sender<PathBuf>,
        cancel: CancellationToken,
    ) -> Result<(Arc<ScanStats>, JoinHandle<()>), ScanError> {
        let walk = self.walk(root_path)?;
        let stats = walk.stats();
        let root = root_path.to_path_buf();

        let handle = tokio::task::spawn_blocking(move || {
            for path in walk {
                if cancel.is_cancelled() {
                    tracing::info!(root = %root.display(), "Scan cancelled, traversal stopped");
                    return;
                }
                if tx.blocking_send(path).is_err() {
                    tracing::debug!("Path receiver dropped, traversal stopped");
                    return;
                }
            }
        });

        Ok((stats, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    #[test]
    fn test_scan_nonexistent_path() {
        let scanner = FileScanner::new();
        match scanner.walk(Path::new("/nonexistent/path")) {
            Err(ScanError::PathNotFound(_)) => {}
            _ => panic!("Expected PathNotFound error"),
        }
    }

    #[test]
    fn test_scan_file_as_directory() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("song.mp3");
        fs::write(&file, b"x").unwrap();

        match FileScanner::new().walk(&file) {
            Err(ScanError::NotADirectory(_)) => {}
            _ => panic!("Expected NotADirectory error"),
        }
    }

    #[test]
    fn test_scan_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let walk = FileScanner::new().walk(dir.path()).unwrap();
        assert_eq!(walk.count(), 0);
    }

    #[test]
    fn test_walk_is_exhaustive_and_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a/b/c")).unwrap();
        fs::create_dir_all(dir.path().join("empty")).unwrap();
        fs::write(dir.path().join("top.mp3"), b"1").unwrap();
        fs::write(dir.path().join("a/cover.jpg"), b"2").unwrap();
        fs::write(dir.path().join("a/b/c/deep track.flac"), b"3").unwrap();

        let walk = FileScanner::new().walk(dir.path()).unwrap();
        let stats = walk.stats();
        let found: HashSet<PathBuf> = walk.collect();

        let expected: HashSet<PathBuf> = [
            dir.path().join("top.mp3"),
            dir.path().join("a/cover.jpg"),
            dir.path().join("a/b/c/deep track.flac"),
        ]
        .into_iter()
        .collect();

        assert_eq!(found, expected);
        assert_eq!(stats.discovered(), 3);
        assert_eq!(stats.walk_errors(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_abort_walk() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("a/song.mp3"), b"1").unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("a/loop")).unwrap();

        let walk = FileScanner::new()
            .follow_links(true)
            .walk(dir.path())
            .unwrap();
        let stats = walk.stats();
        let found: Vec<PathBuf> = walk.collect();

        assert_eq!(found, vec![dir.path().join("a/song.mp3")]);
        assert_eq!(stats.walk_errors(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_not_emitted_without_follow() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("song.mp3"), b"1").unwrap();
        std::os::unix::fs::symlink(dir.path().join("song.mp3"), dir.path().join("alias.mp3"))
            .unwrap();

        let found: Vec<PathBuf> = FileScanner::new().walk(dir.path()).unwrap().collect();
        assert_eq!(found, vec![dir.path().join("song.mp3")]);
    }

    #[tokio::test]
    async fn test_spawn_feeds_channel_and_closes() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..5 {
            fs::write(dir.path().join(format!("{}.mp3", i)), [i as u8]).unwrap();
        }

        let (tx, mut rx) = mpsc::channel(2);
        let (stats, handle) = FileScanner::new()
            .spawn(dir.path(), tx, CancellationToken::new())
            .unwrap();

        let mut received = Vec::new();
        while let Some(path) = rx.recv().await {
            received.push(path);
        }
        handle.await.unwrap();

        assert_eq!(received.len(), 5);
        assert_eq!(stats.discovered(), 5);
    }

    #[tokio::test]
    async fn test_spawn_respects_cancellation() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..10 {
            fs::write(dir.path().join(format!("{}.mp3", i)), [i as u8]).unwrap();
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tx, mut rx) = mpsc::channel(16);
        let (_stats, handle) = FileScanner::new().spawn(dir.path(), tx, cancel).unwrap();
        handle.await.unwrap();

        assert!(rx.recv().await.is_none());
    }
}
