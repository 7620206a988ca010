//! # Storage Observer
//!
//! Wraps a driver and reports every successful write to a callback.
//! Reads pass through unobserved.

use super::{Driver, StorageError};
use crate::action::{ObserveFn, Release};
use std::fmt;

/// Driver wrapper reporting writes
pub struct Observer<D> {
    driver: D,
    observe: ObserveFn,
}

impl<D: Driver> Observer<D> {
    pub fn new(driver: D, observe: ObserveFn) -> Self {
        Self { driver, observe }
    }

    pub fn into_inner(self) -> D {
        self.driver
    }
}

impl<D: fmt::Debug> fmt::Debug for Observer<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("driver", &self.driver)
            .finish_non_exhaustive()
    }
}

impl<D: Driver> Driver for Observer<D> {
    fn get(&self, key: &str) -> Result<Release, StorageError> {
        self.driver.get(key)
    }

    fn create(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        self.driver.create(key, release)?;
        (self.observe)(release);
        Ok(())
    }

    fn update(&self, key: &str, release: &Release) -> Result<(), StorageError> {
        self.driver.update(key, release)?;
        (self.observe)(release);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<Release, StorageError> {
        let mut release = self.driver.delete(key)?;
        release.deleted.get_or_insert_with(chrono::Utc::now);
        (self.observe)(&release);
        Ok(release)
    }

    fn list(&self, name: &str) -> Result<Vec<Release>, StorageError> {
        self.driver.list(name)
    }
}
