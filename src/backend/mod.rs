//! Backend drivers
//!
//! Four interchangeable storage media behind one facade:
//! 1. In-process map (native values, no persistence)
//! 2. Preference store (native values in a host preference namespace)
//! 3. Files on disk (one file per canonical key)
//! 4. OS secure-credential store (generic-password records)

pub(crate) mod credentials;
mod files;
mod memory;
mod preferences;

pub use credentials::{
    CredentialApi, CredentialError, CredentialMatch, CredentialQuery, CredentialRecord,
    CredentialSearch, KeychainStore, SystemCredentials, ACCESSIBLE_WHEN_UNLOCKED,
    CLASS_GENERIC_PASSWORD,
};
pub use files::FileStore;
pub use memory::MemoryStore;
pub use preferences::{JsonPreferences, PreferenceStore};

/// A concrete storage medium, fixed for the lifetime of a facade
///
/// Each variant carries exactly the state it needs: the memory driver owns
/// its map, the file driver its optional root, and the preference and
/// credential drivers only a handle to the external medium.
pub(crate) enum Backend {
    Memory(MemoryStore),
    Preferences(Box<dyn PreferenceStore>),
    Files(FileStore),
    Keychain(KeychainStore),
}
