//! Error types for polystore

use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage error types
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("cannot resolve a file location for key: {0}")]
    UnresolvableLocation(String),

    #[error("unexpected value type: {0}")]
    UnexpectedValueType(String),

    #[error(transparent)]
    BackingStore(#[from] BackingStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive error: {0}")]
    Archive(#[from] serde_json::Error),
}

/// Failure reported by the platform credential store, carrying the native
/// status code when the platform exposes one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackingStoreError {
    /// Native status code, when the platform reports one
    pub code: Option<i32>,
    /// Human-readable description
    pub message: String,
}

impl BackingStoreError {
    /// Create an error without a native status code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create an error carrying a native status code
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackingStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "backing store error (status {}): {}", code, self.message),
            None => write!(f, "backing store error: {}", self.message),
        }
    }
}

impl std::error::Error for BackingStoreError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backing_store_display() {
        let with_code = BackingStoreError::with_code(-25300, "item not found");
        assert_eq!(
            with_code.to_string(),
            "backing store error (status -25300): item not found"
        );

        let without = BackingStoreError::new("access denied");
        assert_eq!(without.to_string(), "backing store error: access denied");
    }
}
