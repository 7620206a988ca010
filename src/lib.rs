//! Helm Release Controller Library
//!
//! Reconciliation core of a release-lifecycle controller: drives Helm
//! actions against a `HelmRelease`, records the writes they make to release
//! storage, and folds the outcome into the object's status.
//!
//! Tests live beside the code in each module and under `tests/`.

pub mod action;
pub mod conditions;
pub mod config;
pub mod constants;
pub mod crd;
pub mod observability;
pub mod reconcile;
pub mod storage;

// Re-export CRD types for convenience
pub use crd::*;
