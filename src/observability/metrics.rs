//! # Release Action Metrics
//!
//! Metrics for release action reconciliations and remediation accounting.

use anyhow::Result;
use prometheus::{Encoder, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

/// Global Prometheus metrics registry
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static ACTION_RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "helm_release_action_reconciliations_total",
            "Total number of release action reconciliations by outcome",
        ),
        &["action", "result"],
    )
    .expect("Failed to create ACTION_RECONCILIATIONS_TOTAL metric - this should never happen")
});

static REMEDIATION_FAILURES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "helm_release_remediation_failures_total",
            "Total number of failures counted towards a remediation strategy",
        ),
        &["action"],
    )
    .expect("Failed to create REMEDIATION_FAILURES_TOTAL metric - this should never happen")
});

/// Outcome of a release action reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionResult {
    /// The action succeeded
    Success,
    /// The action failed after writing to storage
    Failure,
    /// The action failed without touching storage
    Error,
}

impl ActionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionResult::Success => "success",
            ActionResult::Failure => "failure",
            ActionResult::Error => "error",
        }
    }
}

/// Register all metrics with the Prometheus registry
///
/// Prometheus metrics internally use Arc, so the clones handed to the
/// registry share state with the statics.
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(ACTION_RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REMEDIATION_FAILURES_TOTAL.clone()))?;
    Ok(())
}

/// Render the registry in the Prometheus text format
pub fn gather_metrics() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn increment_action_reconciliations(action: &str, result: ActionResult) {
    ACTION_RECONCILIATIONS_TOTAL
        .with_label_values(&[action, result.as_str()])
        .inc();
}

pub fn increment_remediation_failures(action: &str) {
    REMEDIATION_FAILURES_TOTAL
        .with_label_values(&[action])
        .inc();
}
