//! # HelmRelease Status
//!
//! Status types for tracking release history, failure counters and conditions.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Status of the HelmRelease resource
///
/// The durable state of the reconciliation core. Every field must
/// round-trip through the API server unchanged.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseStatus {
    /// Last generation the controller reconciled
    #[serde(default)]
    pub observed_generation: i64,
    /// Last release action the controller attempted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempted_release_action: Option<ReleaseAction>,
    /// Total number of failed release actions
    /// Reset by policy outside the action reconcilers
    #[serde(default)]
    pub failures: i64,
    /// Failed install attempts counted by the install remediation strategy
    #[serde(default)]
    pub install_failures: i64,
    /// Failed upgrade attempts counted by the upgrade remediation strategy
    #[serde(default)]
    pub upgrade_failures: i64,
    /// Releases made for this object, most recent last
    #[serde(default)]
    pub history: Snapshots,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl HelmReleaseStatus {
    /// Forget all recorded releases
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Release action attempted against the Helm storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ReleaseAction {
    Install,
    Upgrade,
    Test,
    Rollback,
    Uninstall,
}

impl ReleaseAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseAction::Install => "install",
            ReleaseAction::Upgrade => "upgrade",
            ReleaseAction::Test => "test",
            ReleaseAction::Rollback => "rollback",
            ReleaseAction::Uninstall => "uninstall",
        }
    }
}

impl fmt::Display for ReleaseAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered release history, most recent last
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(transparent)]
pub struct Snapshots(pub Vec<Snapshot>);

impl Snapshots {
    /// Most recent snapshot
    pub fn latest(&self) -> Option<&Snapshot> {
        self.0.last()
    }

    /// Snapshot of the given release revision
    pub fn get(&self, name: &str, namespace: &str, version: i32) -> Option<&Snapshot> {
        self.0.iter().find(|s| s.targets(name, namespace, version))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Keep only the newest `max` snapshots
    pub fn truncate(&mut self, max: usize) {
        if self.0.len() > max {
            let excess = self.0.len() - max;
            self.0.drain(..excess);
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Snapshot> {
        self.0.iter()
    }
}

/// Snapshot of a release as written to the Helm storage
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Digest of the stored release record
    pub digest: String,
    /// Release name
    pub name: String,
    /// Release namespace
    pub namespace: String,
    /// Release revision
    pub version: i32,
    /// Release status (deployed, failed, pending-install, ...)
    pub status: String,
    /// Chart name
    pub chart_name: String,
    /// Chart version
    pub chart_version: String,
    /// Chart application version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
    /// Digest of the values the release was made with
    pub config_digest: String,
    /// First deployment time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_deployed: Option<String>,
    /// Last deployment time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<String>,
    /// Deletion time (RFC3339), set when the record was removed from storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<String>,
    /// Test hooks by name; present once the release has been tested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_hooks: Option<BTreeMap<String, TestHookStatus>>,
}

impl Snapshot {
    /// `namespace/name.vVERSION`
    pub fn full_release_name(&self) -> String {
        format!("{}/{}.v{}", self.namespace, self.name, self.version)
    }

    /// `chart@version`
    pub fn versioned_chart_name(&self) -> String {
        format!("{}@{}", self.chart_name, self.chart_version)
    }

    pub fn has_been_tested(&self) -> bool {
        self.test_hooks.is_some()
    }

    /// Whether this snapshot describes the given release revision
    pub fn targets(&self, name: &str, namespace: &str, version: i32) -> bool {
        self.name == name && self.namespace == namespace && self.version == version
    }
}

/// Last run of a test hook
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestHookStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_started: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Condition types set on a HelmRelease
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ConditionType {
    /// Derived readiness, written only by the summarizer
    Ready,
    /// Outcome of the last release action
    Released,
    /// Outcome of the test hooks of the latest release
    TestSuccess,
    /// Outcome of the last remediation
    Remediated,
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionType::Ready => "Ready",
            ConditionType::Released => "Released",
            ConditionType::TestSuccess => "TestSuccess",
            ConditionType::Remediated => "Remediated",
        };
        f.write_str(s)
    }
}

/// Status of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConditionStatus::True => "True",
            ConditionStatus::False => "False",
            ConditionStatus::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: ConditionType,
    /// Status of the condition (True, False, Unknown)
    pub status: ConditionStatus,
    /// Reason for the condition
    #[serde(default)]
    pub reason: String,
    /// Message describing the condition
    #[serde(default)]
    pub message: String,
    /// Generation the condition was computed against
    #[serde(default)]
    pub observed_generation: i64,
    /// Last transition time (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

impl Condition {
    pub fn new(
        r#type: ConditionType,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        observed_generation: i64,
    ) -> Self {
        Self {
            r#type,
            status,
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation,
            last_transition_time: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(version: i32) -> Snapshot {
        Snapshot {
            name: "podinfo".to_string(),
            namespace: "apps".to_string(),
            version,
            chart_name: "podinfo".to_string(),
            chart_version: "6.5.4".to_string(),
            ..Snapshot::default()
        }
    }

    #[test]
    fn test_snapshot_names() {
        let snap = snapshot(3);
        assert_eq!(snap.full_release_name(), "apps/podinfo.v3");
        assert_eq!(snap.versioned_chart_name(), "podinfo@6.5.4");
        assert!(!snap.has_been_tested());
    }

    #[test]
    fn test_snapshots_truncate_keeps_newest() {
        let mut history = Snapshots((1..=5).map(snapshot).collect());
        history.truncate(2);
        let versions: Vec<i32> = history.iter().map(|s| s.version).collect();
        assert_eq!(versions, vec![4, 5]);
        assert_eq!(history.latest().map(|s| s.version), Some(5));
        assert!(history.get("podinfo", "apps", 4).is_some());
        assert!(history.get("podinfo", "apps", 1).is_none());
    }

    #[test]
    fn test_status_round_trip() {
        let status = HelmReleaseStatus {
            observed_generation: 2,
            last_attempted_release_action: Some(ReleaseAction::Install),
            failures: 1,
            install_failures: 1,
            upgrade_failures: 0,
            history: Snapshots(vec![snapshot(1)]),
            conditions: vec![Condition::new(
                ConditionType::Released,
                ConditionStatus::False,
                "InstallFailed",
                "boom",
                2,
            )],
        };
        let json = serde_json::to_value(&status).expect("status should serialize");
        assert_eq!(json["lastAttemptedReleaseAction"], "Install");
        assert_eq!(json["installFailures"], 1);
        assert_eq!(json["history"][0]["chartVersion"], "6.5.4");
        assert_eq!(json["conditions"][0]["type"], "Released");
        assert_eq!(json["conditions"][0]["observedGeneration"], 2);

        let back: HelmReleaseStatus = serde_json::from_value(json).expect("status should parse");
        assert_eq!(back, status);
    }

    #[test]
    fn test_status_defaults_on_missing_fields() {
        let status: HelmReleaseStatus =
            serde_json::from_str("{}").expect("empty status should parse");
        assert_eq!(status, HelmReleaseStatus::default());
    }
}
