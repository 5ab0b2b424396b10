//! Preference-store backend
//!
//! The host preference namespace is abstracted behind the narrow
//! [`PreferenceStore`] capability so the facade logic stays testable
//! against an in-memory fake. The shipped implementation keeps one
//! versioned JSON document per namespace, written atomically through a
//! temp-file rename.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::value::Value;

/// Narrow capability over a host preference namespace
///
/// Entries hold native values; each call is assumed atomic with respect to
/// the underlying medium. Absent keys read as empty results, not errors.
pub trait PreferenceStore {
    /// Read the entry for a key
    fn get(&self, key: &str) -> Option<Value>;

    /// Write the entry for a key
    fn set(&mut self, key: &str, value: Value) -> Result<()>;

    /// Delete the entry for a key; absent entries are a no-op
    fn remove(&mut self, key: &str) -> Result<()>;

    /// Whether an entry exists for a key
    fn contains(&self, key: &str) -> bool;
}

/// File format for a persisted preference namespace
#[derive(Debug, Serialize, Deserialize)]
struct PreferenceFile {
    version: u32,
    entries: HashMap<String, Value>,
}

/// Preference store persisted as a single JSON document
pub struct JsonPreferences {
    path: PathBuf,
    entries: HashMap<String, Value>,
}

impl JsonPreferences {
    /// Open the default namespace in the platform config directory
    pub fn open(namespace: &str) -> Result<Self> {
        let dir = ProjectDirs::from("com", "symbia-labs", "polystore")
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                StorageError::UnresolvableLocation(
                    "could not determine the platform config directory".to_string(),
                )
            })?;
        Self::open_at(dir.join(format!("{}.json", namespace)))
    }

    /// Open a namespace at an explicit file path
    pub fn open_at(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;

        debug!("Opened preference namespace at {:?}", path);
        Ok(Self { path, entries })
    }

    fn load(path: &Path) -> Result<HashMap<String, Value>> {
        if !path.exists() {
            debug!("No existing preference file found");
            return Ok(HashMap::new());
        }

        let contents = std::fs::read_to_string(path)?;
        let file: PreferenceFile = serde_json::from_str(&contents)?;
        Ok(file.entries)
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = PreferenceFile {
            version: 1,
            entries: self.entries.clone(),
        };
        let contents = serde_json::to_string_pretty(&file)?;

        // Write atomically using a temp file
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, &contents)?;
        std::fs::rename(&temp_path, &self.path)?;

        debug!("Saved {} preference entries", self.entries.len());
        Ok(())
    }
}

impl PreferenceStore for JsonPreferences {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }

    fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
