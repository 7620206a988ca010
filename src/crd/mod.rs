//! # Custom Resource Definitions
//!
//! CRD types for the Helm Release Controller.
//!
//! This module contains the `HelmRelease` custom resource, its status and
//! the remediation strategies that govern failed release actions.

mod remediation;
mod status;

pub use remediation::{InstallRemediation, Remediation};
pub use status::{
    Condition, ConditionStatus, ConditionType, HelmReleaseStatus, ReleaseAction, Snapshot,
    Snapshots, TestHookStatus,
};

use crate::constants::DEFAULT_RELEASE_NAMESPACE;
use kube::CustomResource;
use schemars::{json_schema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};

/// HelmRelease Custom Resource Definition
///
/// Declares a chart and the values to release it with. The controller
/// installs, upgrades, tests and remediates the release to match.
///
/// # Example
///
/// ```yaml
/// apiVersion: helm.microscaler.io/v1
/// kind: HelmRelease
/// metadata:
///   name: podinfo
///   namespace: apps
/// spec:
///   chart:
///     name: podinfo
///     version: 6.5.4
///   install:
///     remediation:
///       retries: 3
///   test:
///     enable: true
///   values:
///     replicaCount: 2
/// ```
#[derive(CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "HelmRelease",
    group = "helm.microscaler.io",
    version = "v1",
    namespaced,
    status = "HelmReleaseStatus",
    shortname = "hr",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Status", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].message"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct HelmReleaseSpec {
    /// Chart to release
    pub chart: ChartRef,
    /// Name of the Helm release
    /// Defaults to `<targetNamespace>-<name>` when a target namespace is set,
    /// otherwise to the object name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_name: Option<String>,
    /// Namespace the release is installed into
    /// Defaults to the namespace of the HelmRelease
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,
    /// Namespace of the Helm release storage
    /// Defaults to the namespace of the HelmRelease
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_namespace: Option<String>,
    /// Install action configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install: Option<InstallSpec>,
    /// Test action configuration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestSpec>,
    /// Values passed to the chart
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(schema_with = "preserve_unknown_fields")]
    pub values: Option<serde_json::Value>,
    /// Suspend reconciliation of this release
    #[serde(default)]
    pub suspend: bool,
}

/// Reference to a chart by name and version
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartRef {
    /// Chart name
    pub name: String,
    /// Chart version or semver range
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Install action configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InstallSpec {
    /// Remediation strategy for failed installs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<InstallRemediation>,
    /// Create the target namespace if it does not exist
    #[serde(default)]
    pub create_namespace: bool,
}

impl InstallSpec {
    /// Active remediation strategy, defaulted when not configured
    pub fn remediation(&self) -> InstallRemediation {
        self.remediation.clone().unwrap_or_default()
    }
}

/// Test action configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestSpec {
    /// Run the chart's test hooks after install and upgrade
    #[serde(default)]
    pub enable: bool,
    /// Do not let test failures affect readiness or trigger remediation
    #[serde(default)]
    pub ignore_failures: bool,
}

fn preserve_unknown_fields(_gen: &mut SchemaGenerator) -> Schema {
    json_schema!({
        "type": "object",
        "x-kubernetes-preserve-unknown-fields": true,
        "description": "Values passed to the chart"
    })
}

impl HelmRelease {
    /// Name of the Helm release managed by this object
    pub fn release_name(&self) -> String {
        if let Some(name) = self.spec.release_name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }
        let name = self.metadata.name.as_deref().unwrap_or_default();
        match self.spec.target_namespace.as_deref().filter(|ns| !ns.is_empty()) {
            Some(target) => format!("{target}-{name}"),
            None => name.to_string(),
        }
    }

    /// Namespace the Helm release is installed into
    pub fn release_namespace(&self) -> String {
        self.spec
            .target_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .or(self.metadata.namespace.as_deref())
            .unwrap_or(DEFAULT_RELEASE_NAMESPACE)
            .to_string()
    }

    /// Namespace of the Helm release storage
    pub fn storage_namespace(&self) -> String {
        self.spec
            .storage_namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .or(self.metadata.namespace.as_deref())
            .unwrap_or(DEFAULT_RELEASE_NAMESPACE)
            .to_string()
    }

    /// Install configuration, defaulted when absent
    pub fn install(&self) -> InstallSpec {
        self.spec.install.clone().unwrap_or_default()
    }

    /// Test configuration, defaulted when absent
    pub fn test(&self) -> TestSpec {
        self.spec.test.clone().unwrap_or_default()
    }

    /// Current generation of the object spec
    pub fn generation(&self) -> i64 {
        self.metadata.generation.unwrap_or_default()
    }

    /// Mutable status, created on first access
    pub fn status_mut(&mut self) -> &mut HelmReleaseStatus {
        self.status.get_or_insert_with(HelmReleaseStatus::default)
    }
}
