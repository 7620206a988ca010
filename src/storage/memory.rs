//! # Memory Driver
//!
//! Release storage kept in process memory.

use super::{Driver, StorageError};
use crate::action::Release;
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

/// Driver storing release records in a map
#[derive(Debug, Default)]
pub struct MemoryDriver {
    records: Mutex<BTreeMap<String, Release>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn records(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Release>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Driver for MemoryDriver {
    fn get(&self, key: &str) -> Result<Release, StorageError> {
        self.records()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn create(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        let mut records = self.records();
        if records.contains_key(key) {
            return Err(StorageError::AlreadyExists(key.to_string()));
        }
        records.insert(key.to_string(), release.clone());
        Ok(())
    }

    fn update(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        match self.records().get_mut(key) {
            Some(existing) => {
                *existing = release.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<Release, StorageError> {
        self.records()
            .remove(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    fn list(&self, name: &str) -> Result<Vec<Release>, StorageError> {
        Ok(self
            .records()
            .values()
            .filter(|r| r.name == name)
            .cloned()
            .collect())
    }
}
