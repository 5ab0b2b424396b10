//! # polystore
//!
//! Unified key-value storage facade including:
//! - One typed interface over four pluggable backends: in-process map,
//!   preference store, files on disk, and the OS secure-credential store
//! - Key normalization from strings, integers, and paths into one
//!   canonical form
//! - Raw and safelisted-archival data policies for byte-oriented backends
//! - A probe → add-or-update credential protocol with structured
//!   OS-status error translation
//!
//! All operations are synchronous and block until their effect on the
//! backing medium is final.

pub mod backend;
pub mod codec;
pub mod error;
pub mod key;
mod storage;
pub mod value;

pub use backend::{
    CredentialApi, CredentialError, CredentialMatch, CredentialQuery, CredentialRecord,
    CredentialSearch, FileStore, JsonPreferences, KeychainStore, MemoryStore, PreferenceStore,
    SystemCredentials,
};
pub use codec::DataPolicy;
pub use error::{BackingStoreError, Result, StorageError};
pub use key::StorageKey;
pub use storage::{BackendKind, Storage};
pub use value::{FromValue, StorageValue, Value};
