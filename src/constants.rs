//! # Constants
//!
//! Shared names, reasons and defaults used across the controller.

/// API group of the `HelmRelease` resource
pub const API_GROUP: &str = "helm.microscaler.io";

/// Default reporting controller for Kubernetes events
pub const DEFAULT_EVENT_REPORTER: &str = "helm-release-controller";

/// Default capacity of the per-action diagnostic log buffer
pub const DEFAULT_LOG_BUFFER_SIZE: usize = 10;

/// Namespace used when neither the spec nor the object carries one
pub const DEFAULT_RELEASE_NAMESPACE: &str = "default";

/// Prefix of Helm release storage keys (`sh.helm.release.v1.<name>.v<version>`)
pub const RELEASE_STORAGE_KEY_PREFIX: &str = "sh.helm.release.v1";

/// Event annotation carrying the chart version
pub const META_REVISION_KEY: &str = "helm.microscaler.io/revision";

/// Event annotation carrying the values digest
pub const META_TOKEN_KEY: &str = "helm.microscaler.io/token";

// Condition reasons

/// Install action failed
pub const INSTALL_FAILED_REASON: &str = "InstallFailed";
/// Install action succeeded
pub const INSTALL_SUCCEEDED_REASON: &str = "InstallSucceeded";
/// Release was made, test hooks have not run yet
pub const AWAITING_TESTS_REASON: &str = "AwaitingTests";
/// Upgrade action failed
pub const UPGRADE_FAILED_REASON: &str = "UpgradeFailed";
/// Upgrade action succeeded
pub const UPGRADE_SUCCEEDED_REASON: &str = "UpgradeSucceeded";
/// Test hooks succeeded
pub const TEST_SUCCEEDED_REASON: &str = "TestSucceeded";
/// Test hooks failed
pub const TEST_FAILED_REASON: &str = "TestFailed";
/// Rollback remediation succeeded
pub const ROLLBACK_SUCCEEDED_REASON: &str = "RollbackSucceeded";
/// Uninstall remediation failed
pub const UNINSTALL_FAILED_REASON: &str = "UninstallFailed";
