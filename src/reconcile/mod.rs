//! # Action Reconcilers
//!
//! Reconcilers that each drive one Helm action for a `HelmRelease` and fold
//! its outcome into the object status.
//!
//! ## Sub-modules
//!
//! - `install` - First-time release of a chart
//! - `observed` - Accumulator of storage writes made during one action
//! - `summarize` - Derivation of the Ready condition
//! - `events` - Event recording

pub mod events;
pub mod install;
pub mod observed;
pub mod summarize;

pub use events::{
    event_message_with_log, EventMetadata, EventRecorder, EventReporter, EventSeverity,
    KubeEventRecorder,
};
pub use install::Install;
pub use observed::{observe_release, ObservedReleases};
pub use summarize::{summarize, summarize_conditions};

use crate::action::{ActionError, Chart};
use crate::crd::HelmRelease;
use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Input of one reconciliation pass
#[derive(Debug, Clone)]
pub struct Request {
    /// Object being reconciled; its status is updated in place
    pub object: HelmRelease,
    /// Chart resolved for this pass
    pub chart: Chart,
    /// Values resolved for this pass
    pub values: serde_json::Value,
}

impl Request {
    pub fn new(object: HelmRelease, chart: Chart, values: serde_json::Value) -> Self {
        Self {
            object,
            chart,
            values,
        }
    }
}

/// Kind of an action reconciler
///
/// Lets the scheduler decide whether an error from a reconciler must stop
/// further actions in the same pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerType {
    /// Makes a new release (install, upgrade)
    Release,
    /// Remediates a failed release (rollback, uninstall)
    Remediate,
    /// Runs tests against a release without changing it
    Test,
}

impl ReconcilerType {
    /// Whether reconcilers of this type write to the release storage
    pub fn mutates_release(&self) -> bool {
        matches!(self, ReconcilerType::Release | ReconcilerType::Remediate)
    }
}

/// Error returned by an action reconciler
///
/// Only returned when the action left no trace in the release storage, so
/// the whole reconciliation can be retried as-is.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Action(#[from] ActionError),
}

/// Reconciler for one Helm action
///
/// `reconcile` may be called repeatedly with the same request. Failures that
/// modified the release storage are recorded in the object status and
/// reported as `Ok(())`, leaving the response to the remediation strategy.
#[async_trait]
pub trait ActionReconciler: Send + Sync {
    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        req: &mut Request,
    ) -> Result<(), ReconcileError>;

    /// Stable action name used in logs and events
    fn name(&self) -> &'static str;

    fn reconciler_type(&self) -> ReconcilerType;
}
