//! Storage facade
//!
//! One [`Storage`] instance pairs a backend with a data policy, both fixed
//! at construction, and routes every operation through key normalization
//! and the codec. The error contract is deliberately asymmetric: `get` and
//! `set` surface failures, `remove` and `contains` never do.

use std::collections::HashMap;

use tracing::warn;

use crate::backend::{
    Backend, CredentialApi, FileStore, KeychainStore, MemoryStore, PreferenceStore,
};
use crate::codec::DataPolicy;
use crate::error::Result;
use crate::key::StorageKey;
use crate::value::{FromValue, StorageValue, Value};

/// Which medium a facade instance is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process map
    Memory,
    /// Host preference namespace
    Preferences,
    /// Files on disk
    Files,
    /// OS secure-credential store
    Keychain,
}

/// Unified key-value storage over one backend and one data policy
///
/// Memory-backed instances carry no internal synchronization; share one
/// across threads only under external mutual exclusion.
pub struct Storage {
    backend: Backend,
    policy: DataPolicy,
}

impl Storage {
    fn new(backend: Backend, policy: DataPolicy) -> Self {
        Self { backend, policy }
    }

    // Constructors

    /// In-process map backend
    pub fn memory() -> Self {
        Self::new(Backend::Memory(MemoryStore::new()), DataPolicy::Raw)
    }

    /// In-process map backend seeded with initial entries
    pub fn memory_with<K: StorageKey>(initial: impl IntoIterator<Item = (K, Value)>) -> Self {
        let entries: HashMap<String, Value> = initial
            .into_iter()
            .map(|(k, v)| (k.canonical(), v))
            .collect();
        Self::new(
            Backend::Memory(MemoryStore::with_entries(entries)),
            DataPolicy::Raw,
        )
    }

    /// Preference-store backend over any [`PreferenceStore`] implementation
    pub fn preferences(store: impl PreferenceStore + 'static) -> Self {
        Self::new(Backend::Preferences(Box::new(store)), DataPolicy::Raw)
    }

    /// File backend rooted at a directory
    pub fn files(root: impl Into<std::path::PathBuf>, policy: DataPolicy) -> Self {
        Self::new(Backend::Files(FileStore::rooted(root)), policy)
    }

    /// File backend without a root; canonical keys are used as paths
    pub fn files_at_paths(policy: DataPolicy) -> Self {
        Self::new(Backend::Files(FileStore::unrooted()), policy)
    }

    /// Platform keychain backend
    pub fn keychain(policy: DataPolicy) -> Self {
        Self::new(Backend::Keychain(KeychainStore::system()), policy)
    }

    /// Keychain backend over an explicit credential API
    pub fn keychain_with(api: Box<dyn CredentialApi>, policy: DataPolicy) -> Self {
        Self::new(Backend::Keychain(KeychainStore::new(api)), policy)
    }

    /// The backend this facade was constructed with
    pub fn kind(&self) -> BackendKind {
        match &self.backend {
            Backend::Memory(_) => BackendKind::Memory,
            Backend::Preferences(_) => BackendKind::Preferences,
            Backend::Files(_) => BackendKind::Files,
            Backend::Keychain(_) => BackendKind::Keychain,
        }
    }

    /// The data policy this facade was constructed with
    pub fn policy(&self) -> DataPolicy {
        self.policy
    }

    // Getters

    /// Retrieve the value for a key
    ///
    /// Memory and preference backends report an absent key as `Ok(None)`;
    /// the file backend surfaces the not-found I/O error and the keychain
    /// backend the translated store error.
    pub fn get(&self, key: impl StorageKey) -> Result<Option<Value>> {
        let key = key.canonical();
        match &self.backend {
            Backend::Memory(store) => Ok(store.get(&key).cloned()),
            Backend::Preferences(store) => Ok(store.get(&key)),
            Backend::Files(store) => {
                let bytes = store.read(&key)?;
                Ok(Some(self.policy.decode(&bytes)?))
            }
            Backend::Keychain(store) => {
                let bytes = store.get(&key)?;
                Ok(Some(self.policy.decode(&bytes)?))
            }
        }
    }

    /// Retrieve and coerce the value for a key; a type mismatch reads as
    /// `Ok(None)`
    pub fn get_typed<T: FromValue>(&self, key: impl StorageKey) -> Result<Option<T>> {
        Ok(self.get(key)?.and_then(|v| T::from_value(&v)))
    }

    /// Retrieve a string for a key
    ///
    /// Under the raw policy, byte payloads from the file and keychain
    /// backends are transcoded from UTF-8; native strings from the memory
    /// and preference backends pass through.
    pub fn get_string(&self, key: impl StorageKey) -> Result<Option<String>> {
        Ok(self.get(key)?.and_then(|value| match value {
            Value::String(s) => Some(s),
            Value::Bytes(b) => String::from_utf8(b).ok(),
            _ => None,
        }))
    }

    /// Non-throwing typed view over the value for a key; any failure reads
    /// as empty
    pub fn value(&self, key: impl StorageKey) -> StorageValue {
        StorageValue::new(self.get(key).ok().flatten())
    }

    // Setters

    /// Store a value for a key
    ///
    /// Memory and preference backends hold the native value; the file and
    /// keychain backends receive the policy-encoded byte payload. Keychain
    /// writes go through the probe → add-or-update protocol.
    pub fn set(&mut self, key: impl StorageKey, value: impl Into<Value>) -> Result<()> {
        let key = key.canonical();
        let value = value.into();
        let policy = self.policy;
        match &mut self.backend {
            Backend::Memory(store) => {
                store.set(key, value);
                Ok(())
            }
            Backend::Preferences(store) => store.set(&key, value),
            Backend::Files(store) => {
                let bytes = policy.encode(&value)?;
                store.write(&key, &bytes)
            }
            Backend::Keychain(store) => {
                let bytes = policy.encode(&value)?;
                store.set(&key, &bytes)
            }
        }
    }

    // Operations

    /// Delete the entry for a key
    ///
    /// Best-effort: an absent key is a no-op and backend failures are
    /// logged and swallowed.
    pub fn remove(&mut self, key: impl StorageKey) {
        let key = key.canonical();
        let result = match &mut self.backend {
            Backend::Memory(store) => {
                store.remove(&key);
                Ok(())
            }
            Backend::Preferences(store) => store.remove(&key),
            Backend::Files(store) => store.remove(&key),
            Backend::Keychain(store) => store.remove(&key),
        };

        if let Err(e) = result {
            warn!("Ignoring removal failure for key {}: {}", key, e);
        }
    }

    /// Whether an entry exists for a key
    ///
    /// Never fails: a backend query failure reads as "not present". The
    /// keychain path issues a probe that requests no payload.
    pub fn contains(&self, key: impl StorageKey) -> bool {
        let key = key.canonical();
        match &self.backend {
            Backend::Memory(store) => store.contains(&key),
            Backend::Preferences(store) => store.contains(&key),
            Backend::Files(store) => store.exists(&key),
            Backend::Keychain(store) => store.contains(&key),
        }
    }
}
