//! # Release Storage
//!
//! The Helm release store seen as an opaque key-value store with an
//! observable write path.
//!
//! ## Sub-modules
//!
//! - `memory` - In-memory driver
//! - `observer` - Driver wrapper reporting every write to a callback

mod memory;
mod observer;

pub use memory::MemoryDriver;
pub use observer::Observer;

use crate::action::Release;
use crate::constants::RELEASE_STORAGE_KEY_PREFIX;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by a storage driver
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("release: not found: {0}")]
    NotFound(String),
    #[error("release: already exists: {0}")]
    AlreadyExists(String),
    #[error("release storage driver error: {0}")]
    Driver(String),
}

/// Storage key of a release revision
pub fn storage_key(name: &str, version: i32) -> String {
    format!("{RELEASE_STORAGE_KEY_PREFIX}.{name}.v{version}")
}

/// Backend persisting release records
pub trait Driver: Send + Sync {
    /// Record stored under the key
    fn get(&self, key: &str) -> Result<Release, StorageError>;

    /// Store a new record; fails if the key is taken
    fn create(&self, key: &str, release: &Release) -> Result<(), StorageError>;

    /// Replace an existing record
    fn update(&self, key: &str, release: &Release) -> Result<(), StorageError>;

    /// Remove a record, returning what was stored
    fn delete(&self, key: &str) -> Result<Release, StorageError>;

    /// All records of the named release, in key order
    fn list(&self, name: &str) -> Result<Vec<Release>, StorageError>;
}

impl<D: Driver + ?Sized> Driver for Arc<D> {
    fn get(&self, key: &str) -> Result<Release, StorageError> {
        (**self).get(key)
    }

    fn create(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        (**self).create(key, release)
    }

    fn update(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        (**self).update(key, release)
    }

    fn delete(&self, key: &str) -> Result<Release, StorageError> {
        (**self).delete(key)
    }

    fn list(&self, name: &str) -> Result<Vec<Release>, StorageError> {
        (**self).list(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("podinfo", 3), "sh.helm.release.v1.podinfo.v3");
    }
}
