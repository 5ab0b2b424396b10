//! Key normalization
//!
//! Every backend addresses entries by one canonical string form. Any
//! key-like type can opt in by implementing [`StorageKey`]; normalization
//! is pure and never fails, so two representations of the same logical key
//! always collapse to the same canonical form.

use std::path::{Path, PathBuf};

/// A key that can be normalized into the canonical form shared by every
/// backend.
pub trait StorageKey {
    /// The canonical string form of this key
    fn canonical(&self) -> String;
}

impl StorageKey for String {
    fn canonical(&self) -> String {
        self.clone()
    }
}

impl StorageKey for &str {
    fn canonical(&self) -> String {
        (*self).to_string()
    }
}

impl StorageKey for Path {
    fn canonical(&self) -> String {
        self.to_string_lossy().into_owned()
    }
}

impl StorageKey for PathBuf {
    fn canonical(&self) -> String {
        self.as_path().canonical()
    }
}

impl StorageKey for &Path {
    fn canonical(&self) -> String {
        (*self).canonical()
    }
}

macro_rules! impl_storage_key_for_int {
    ($($ty:ty),*) => {
        $(
            impl StorageKey for $ty {
                fn canonical(&self) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

impl_storage_key_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
