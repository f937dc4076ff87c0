//! Advisory file lock that keeps sync runs from overlapping across
//! processes, e.g. a cron-driven `contactsync sync` and a running daemon.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Failed to lock '{path}': {source}", path = .path.display())]
pub struct LockError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Exclusive lock on a lock file, released on drop.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Takes the lock if it is free. Returns `Ok(None)` when another
    /// holder has it.
    pub fn try_acquire(path: &Path) -> Result<Option<Self>, LockError> {
        let wrap = |source| LockError {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(wrap)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(path)
            .map_err(wrap)?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self {
                file,
                path: path.to_path_buf(),
            })),
            Err(e) if is_contended(&e) => Ok(None),
            Err(e) => Err(wrap(e)),
        }
    }

    /// Waits for the lock, checking every `poll`.
    pub async fn acquire(path: &Path, poll: Duration) -> Result<Self, LockError> {
        let mut logged = false;
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            if !logged {
                tracing::info!(
                    "Waiting for sync run in another process ({})",
                    path.display()
                );
                logged = true;
            }
            tokio::time::sleep(poll).await;
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_holder_is_refused() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contacts.lock");

        let first = RunLock::try_acquire(&path).unwrap();
        assert!(first.is_some());
        assert!(RunLock::try_acquire(&path).unwrap().is_none());

        drop(first);
        assert!(RunLock::try_acquire(&path).unwrap().is_some());
    }

    #[test]
    fn test_creates_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("contacts.lock");

        let lock = RunLock::try_acquire(&path).unwrap().unwrap();
        assert_eq!(lock.path(), path.as_path());
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_acquire_waits_for_release() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contacts.lock");

        let held = RunLock::try_acquire(&path).unwrap().unwrap();
        let releaser = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(held);
        });

        let lock = RunLock::acquire(&path, Duration::from_millis(10)).await;
        assert!(lock.is_ok());
        releaser.await.unwrap();
    }
}
