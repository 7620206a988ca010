//! # Remediation Strategies
//!
//! Policies deciding whether and when a failed release action is retried or
//! remediated (rolled back or uninstalled).

use super::status::HelmReleaseStatus;
use serde::{Deserialize, Serialize};

/// Remediation strategy for a release action
///
/// The failure counter lives in the object status so it survives controller
/// restarts; each strategy owns a dedicated counter.
pub trait Remediation {
    /// Number of retries before giving up; negative means unlimited
    fn retries(&self) -> i64;

    /// Whether test failures should be ignored
    fn must_ignore_test_failures(&self, default: bool) -> bool;

    /// Whether the last failure should be remediated once retries are exhausted
    fn must_remediate_last_failure(&self) -> bool;

    /// Current failure count of this strategy
    fn failure_count(&self, status: &HelmReleaseStatus) -> i64;

    /// Count one more failure for this strategy
    fn increment_failure_count(&self, status: &mut HelmReleaseStatus);

    /// Whether all retries have been used up
    fn retries_exhausted(&self, status: &HelmReleaseStatus) -> bool {
        let retries = self.retries();
        retries >= 0 && self.failure_count(status) > retries
    }
}

/// Remediation strategy for failed installs
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallRemediation {
    /// Number of retries before giving up; negative means unlimited
    #[serde(default)]
    pub retries: i64,
    /// Ignore test failures when deciding whether to remediate
    /// Defaults to `test.ignoreFailures`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_test_failures: Option<bool>,
    /// Remediate the last failure once retries are exhausted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediate_last_failure: Option<bool>,
}

impl Remediation for InstallRemediation {
    fn retries(&self) -> i64 {
        self.retries
    }

    fn must_ignore_test_failures(&self, default: bool) -> bool {
        self.ignore_test_failures.unwrap_or(default)
    }

    fn must_remediate_last_failure(&self) -> bool {
        self.remediate_last_failure.unwrap_or(false)
    }

    fn failure_count(&self, status: &HelmReleaseStatus) -> i64 {
        status.install_failures
    }

    fn increment_failure_count(&self, status: &mut HelmReleaseStatus) {
        status.install_failures += 1;
    }
}
