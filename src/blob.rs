//! Files attached to records (product images).
//!
//! A record only stores the blob key; the file itself belongs to a
//! [`BlobStore`], and removing it is a separate step the caller performs
//! after the record is gone.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob key `{0}`")]
    InvalidKey(String),
    #[error("blob storage error: {0}")]
    Io(#[from] io::Error),
}

/// What happened to an attached blob when it was released.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobRemoval {
    Removed,
    /// The key was set but no file was stored under it.
    Missing,
    /// The file could not be removed and is left behind.
    Failed(String),
}

/// Removes `key`, turning a storage failure into [`BlobRemoval::Failed`].
/// Callers release blobs after the owning record has already changed.
pub fn release<B: BlobStore + ?Sized>(blobs: &B, key: &str) -> BlobRemoval {
    match blobs.remove(key) {
        Ok(removal) => removal,
        Err(err) => {
            log::warn!("blob `{key}` was not removed: {err}");
            BlobRemoval::Failed(err.to_string())
        }
    }
}

pub trait BlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError>;
    fn exists(&self, key: &str) -> Result<bool, BlobError>;
    fn remove(&self, key: &str) -> Result<BlobRemoval, BlobError>;
}

/// Blobs as files below a media root directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let plain = !key.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !plain {
            return Err(BlobError::InvalidKey(key.to_owned()));
        }
        Ok(self.root.join(relative))
    }
}

impl BlobStore for FsBlobStore {
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.path_for(key)?.is_file())
    }

    fn remove(&self, key: &str) -> Result<BlobRemoval, BlobError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(BlobRemoval::Removed),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BlobRemoval::Missing),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        blobs.put("products/a112t4.jpg", b"jpeg").unwrap();
        assert!(blobs.exists("products/a112t4.jpg").unwrap());
        assert_eq!(blobs.remove("products/a112t4.jpg").unwrap(), BlobRemoval::Removed);
        assert_eq!(blobs.remove("products/a112t4.jpg").unwrap(), BlobRemoval::Missing);
    }

    #[test]
    fn release_reports_failures_instead_of_erroring() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("products/folder.jpg")).unwrap();
        let blobs = FsBlobStore::new(dir.path());
        assert!(matches!(
            release(&blobs, "products/folder.jpg"),
            BlobRemoval::Failed(_)
        ));
        assert!(matches!(release(&blobs, "../x.jpg"), BlobRemoval::Failed(_)));
        assert_eq!(release(&blobs, "products/none.jpg"), BlobRemoval::Missing);
    }

    #[test]
    fn keys_cannot_escape_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let blobs = FsBlobStore::new(dir.path());
        assert!(matches!(
            blobs.remove("../etc/passwd"),
            Err(BlobError::InvalidKey(_))
        ));
        assert!(matches!(blobs.put("/abs.jpg", b""), Err(BlobError::InvalidKey(_))));
    }
}
