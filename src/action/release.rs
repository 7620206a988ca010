//! # Release Records
//!
//! Charts handed to the action engine and the release records it writes to
//! the Helm storage.

use super::digest::{digest_release, digest_values};
use crate::crd::{Snapshot, TestHookStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Chart resolved for a reconciliation
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Chart {
    pub metadata: ChartMetadata,
}

impl Chart {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            metadata: ChartMetadata {
                name: name.into(),
                version: version.into(),
                app_version: None,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Chart metadata (Chart.yaml)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

/// Release record as stored by Helm
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Release {
    pub name: String,
    pub namespace: String,
    /// Revision of the release
    pub version: i32,
    pub chart: ChartMetadata,
    /// Values the release was made with
    pub config: serde_json::Value,
    pub status: ReleaseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_deployed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_deployed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<DateTime<Utc>>,
    #[serde(default)]
    pub hooks: Vec<Hook>,
}

impl Release {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        version: i32,
        chart: &Chart,
        config: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            version,
            chart: chart.metadata.clone(),
            config,
            status: ReleaseStatus::Unknown,
            first_deployed: None,
            last_deployed: None,
            deleted: None,
            hooks: Vec::new(),
        }
    }

    /// Snapshot of this record for the object history
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            digest: digest_release(self),
            name: self.name.clone(),
            namespace: self.namespace.clone(),
            version: self.version,
            status: self.status.as_str().to_string(),
            chart_name: self.chart.name.clone(),
            chart_version: self.chart.version.clone(),
            app_version: self.chart.app_version.clone(),
            config_digest: digest_values(&self.config),
            first_deployed: self.first_deployed.map(|t| t.to_rfc3339()),
            last_deployed: self.last_deployed.map(|t| t.to_rfc3339()),
            deleted: self.deleted.map(|t| t.to_rfc3339()),
            test_hooks: self.test_hooks(),
        }
    }

    /// Test hooks that have run, by name
    ///
    /// `None` while none of the release's test hooks has been executed.
    fn test_hooks(&self) -> Option<BTreeMap<String, TestHookStatus>> {
        let hooks: BTreeMap<String, TestHookStatus> = self
            .hooks
            .iter()
            .filter(|h| h.events.contains(&HookEvent::Test))
            .filter_map(|h| {
                h.last_run.as_ref().map(|run| {
                    (
                        h.name.clone(),
                        TestHookStatus {
                            last_started: run.started_at.map(|t| t.to_rfc3339()),
                            last_completed: run.completed_at.map(|t| t.to_rfc3339()),
                            phase: Some(run.phase.as_str().to_string()),
                        },
                    )
                })
            })
            .collect();
        (!hooks.is_empty()).then_some(hooks)
    }
}

/// Status of a release record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReleaseStatus {
    Unknown,
    Deployed,
    Uninstalled,
    Superseded,
    Failed,
    Uninstalling,
    PendingInstall,
    PendingUpgrade,
    PendingRollback,
}

impl ReleaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReleaseStatus::Unknown => "unknown",
            ReleaseStatus::Deployed => "deployed",
            ReleaseStatus::Uninstalled => "uninstalled",
            ReleaseStatus::Superseded => "superseded",
            ReleaseStatus::Failed => "failed",
            ReleaseStatus::Uninstalling => "uninstalling",
            ReleaseStatus::PendingInstall => "pending-install",
            ReleaseStatus::PendingUpgrade => "pending-upgrade",
            ReleaseStatus::PendingRollback => "pending-rollback",
        }
    }
}

/// Chart hook attached to a release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hook {
    pub name: String,
    pub events: Vec<HookEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run: Option<HookExecution>,
}

/// Lifecycle event a hook is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HookEvent {
    PreInstall,
    PostInstall,
    PreUpgrade,
    PostUpgrade,
    PreRollback,
    PostRollback,
    PreDelete,
    PostDelete,
    Test,
}

/// Last execution of a hook
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookExecution {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub phase: HookPhase,
}

/// Outcome of a hook execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum HookPhase {
    Unknown,
    Running,
    Succeeded,
    Failed,
}

impl HookPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookPhase::Unknown => "Unknown",
            HookPhase::Running => "Running",
            HookPhase::Succeeded => "Succeeded",
            HookPhase::Failed => "Failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn release() -> Release {
        let mut chart = Chart::new("podinfo", "6.5.4");
        chart.metadata.app_version = Some("6.5.4".to_string());
        let mut rel = Release::new("podinfo", "apps", 1, &chart, json!({ "replicaCount": 2 }));
        rel.status = ReleaseStatus::Deployed;
        rel
    }

    #[test]
    fn test_to_snapshot() {
        let rel = release();
        let snap = rel.to_snapshot();
        assert_eq!(snap.full_release_name(), "apps/podinfo.v1");
        assert_eq!(snap.versioned_chart_name(), "podinfo@6.5.4");
        assert_eq!(snap.status, "deployed");
        assert_eq!(snap.app_version.as_deref(), Some("6.5.4"));
        assert_eq!(snap.config_digest, digest_values(&json!({ "replicaCount": 2 })));
        assert_eq!(snap.digest, digest_release(&rel));
        assert!(!snap.has_been_tested());
    }

    #[test]
    fn test_snapshot_digest_tracks_record_changes() {
        let pending = {
            let mut rel = release();
            rel.status = ReleaseStatus::PendingInstall;
            rel
        };
        assert_ne!(pending.to_snapshot().digest, release().to_snapshot().digest);
    }

    #[test]
    fn test_snapshot_records_executed_test_hooks() {
        let mut rel = release();
        rel.hooks = vec![
            Hook {
                name: "podinfo-grpc-test".to_string(),
                events: vec![HookEvent::Test],
                last_run: Some(HookExecution {
                    started_at: None,
                    completed_at: None,
                    phase: HookPhase::Succeeded,
                }),
            },
            Hook {
                name: "podinfo-migrate".to_string(),
                events: vec![HookEvent::PreInstall],
                last_run: None,
            },
        ];
        let snap = rel.to_snapshot();
        assert!(snap.has_been_tested());
        let hooks = snap.test_hooks.expect("test hooks should be recorded");
        assert_eq!(hooks.len(), 1);
        assert_eq!(
            hooks["podinfo-grpc-test"].phase.as_deref(),
            Some("Succeeded")
        );
    }

    #[test]
    fn test_test_hooks_absent_until_run() {
        let mut rel = release();
        rel.hooks = vec![Hook {
            name: "podinfo-grpc-test".to_string(),
            events: vec![HookEvent::Test],
            last_run: None,
        }];
        assert!(!rel.to_snapshot().has_been_tested());
    }
}
