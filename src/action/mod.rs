//! # Release Actions
//!
//! Contract with the external Helm action engine, plus the pieces the
//! reconcilers inject into it: a bounded diagnostic log and a storage-write
//! observer.
//!
//! ## Sub-modules
//!
//! - `release` - Release records as written to the Helm storage
//! - `log` - Bounded buffer of the engine's diagnostic log lines
//! - `digest` - Content digests of values and release records

pub mod digest;
pub mod log;
pub mod release;

pub use digest::{digest_release, digest_values};
pub use log::LogBuffer;
pub use release::{
    Chart, ChartMetadata, Hook, HookEvent, HookExecution, HookPhase, Release, ReleaseStatus,
};

use crate::crd::HelmRelease;
use crate::storage::{Driver, Observer, StorageError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Sink for the engine's diagnostic log lines
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// Callback invoked with every release the engine writes to storage
pub type ObserveFn = Arc<dyn Fn(&Release) + Send + Sync>;

/// Error returned by the action engine
#[derive(Debug, Error)]
pub enum ActionError {
    /// The action ran and failed
    #[error("{0}")]
    Failed(String),
    /// The action was cancelled before it completed
    #[error("action cancelled")]
    Cancelled,
    /// The release storage rejected an operation
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Configuration for a single action run
///
/// Built per reconciliation and never shared across calls.
#[derive(Clone)]
pub struct ActionConfig {
    /// Namespace of the Helm release storage
    pub storage_namespace: String,
    log: LogFn,
    observe: ObserveFn,
}

impl ActionConfig {
    pub fn new(storage_namespace: impl Into<String>, log: LogFn, observe: ObserveFn) -> Self {
        Self {
            storage_namespace: storage_namespace.into(),
            log,
            observe,
        }
    }

    /// Write a diagnostic log line
    pub fn log(&self, line: &str) {
        (self.log)(line);
    }

    /// Report a storage write
    pub fn observe(&self, release: &Release) {
        (self.observe)(release);
    }

    /// Wrap a storage driver so every write made through it is observed
    pub fn observed_storage<D: Driver>(&self, driver: D) -> Observer<D> {
        Observer::new(driver, Arc::clone(&self.observe))
    }
}

impl fmt::Debug for ActionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionConfig")
            .field("storage_namespace", &self.storage_namespace)
            .finish_non_exhaustive()
    }
}

/// Executes Helm actions against a cluster
///
/// Implementations must perform every storage write through the observer
/// carried by the [`ActionConfig`] so reconcilers can account for it.
#[async_trait]
pub trait ActionEngine: Send + Sync {
    /// Install the chart with the given values as a new release
    async fn install(
        &self,
        config: &ActionConfig,
        obj: &HelmRelease,
        chart: &Chart,
        values: &serde_json::Value,
    ) -> Result<Release, ActionError>;
}
