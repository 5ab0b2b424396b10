//! Filesystem backend
//!
//! One file per canonical key, no metadata sidecar. With a root directory
//! configured, a key maps to `root/canonical-key`; without one, the
//! canonical key itself is taken as the path.

use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{Result, StorageError};

/// File-backed storage driver operating over encoded byte payloads
#[derive(Debug, Clone, Default)]
pub struct FileStore {
    root: Option<PathBuf>,
}

impl FileStore {
    /// Create a store rooted at a directory; keys become file names under it
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// Create an unrooted store; canonical keys are used as paths directly
    pub fn unrooted() -> Self {
        Self { root: None }
    }

    /// Resolve the on-disk location for a canonical key
    pub fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() {
            return Err(StorageError::UnresolvableLocation(
                "empty canonical key".to_string(),
            ));
        }
        Ok(match &self.root {
            Some(root) => root.join(key),
            None => PathBuf::from(key),
        })
    }

    /// Read the payload for a key; a missing entry surfaces the not-found
    /// I/O error
    pub fn read(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.resolve(key)?;
        let bytes = std::fs::read(&path)?;
        debug!("Read {} bytes from {:?}", bytes.len(), path);
        Ok(bytes)
    }

    /// Write the payload for a key, creating the root directory as needed
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, bytes)?;
        debug!("Wrote {} bytes to {:?}", bytes.len(), path);
        Ok(())
    }

    /// Delete the entry for a key; absent entries are a no-op
    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether an entry exists for a key
    pub fn exists(&self, key: &str) -> bool {
        self.resolve(key).map(|path| path.exists()).unwrap_or(false)
    }
}
