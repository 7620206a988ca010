//! # Events
//!
//! Diagnostic events emitted by the action reconcilers.

use crate::action::LogBuffer;
use crate::config::ControllerConfig;
use crate::constants::{META_REVISION_KEY, META_TOKEN_KEY};
use crate::crd::HelmRelease;
use async_trait::async_trait;
use chrono::Utc;
use k8s_openapi::api::events::v1::Event;
use kube::api::{Api, ObjectMeta, PostParams};
use kube::{Client, Resource};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, warn};

/// Maximum size of an event note accepted by the API server
const MAX_EVENT_NOTE_BYTES: usize = 1024;

/// Severity of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSeverity {
    Normal,
    Warning,
}

impl EventSeverity {
    /// Event type as accepted by the API server
    pub fn as_str(&self) -> &'static str {
        match self {
            EventSeverity::Normal => "Normal",
            EventSeverity::Warning => "Warning",
        }
    }
}

/// Structured metadata attached to release events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventMetadata {
    /// Chart version of the release
    pub revision: String,
    /// Digest of the values the release was made with
    pub token: String,
}

impl EventMetadata {
    pub fn new(revision: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            token: token.into(),
        }
    }

    /// Metadata as event annotations
    pub fn annotations(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (META_REVISION_KEY.to_string(), self.revision.clone()),
            (META_TOKEN_KEY.to_string(), self.token.clone()),
        ])
    }
}

/// Sink for events about a HelmRelease
///
/// Emitting never fails from the caller's point of view; implementations
/// log delivery problems themselves.
#[async_trait]
pub trait EventRecorder: Send + Sync {
    async fn emit(
        &self,
        obj: &HelmRelease,
        metadata: &EventMetadata,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    );
}

/// Append the buffered action log to an event message
pub fn event_message_with_log(message: &str, buffer: &LogBuffer) -> String {
    if buffer.is_empty() {
        return message.to_string();
    }
    format!("{message}\n\nLast Helm logs:\n\n{buffer}")
}

/// Reporting identity stamped on published events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventReporter {
    /// Reporting controller name
    pub controller: String,
    /// Reporting controller instance, the pod name when known
    pub instance: String,
}

impl EventReporter {
    pub fn from_config(config: &ControllerConfig) -> Self {
        Self {
            controller: config.event_reporter.clone(),
            instance: std::env::var("POD_NAME").unwrap_or_else(|_| config.event_reporter.clone()),
        }
    }

    /// `events.k8s.io/v1` event about the object, annotated with the metadata
    pub fn event(
        &self,
        obj: &HelmRelease,
        metadata: &EventMetadata,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    ) -> Result<Event, serde_json::Error> {
        let name = obj.metadata.name.as_deref().unwrap_or_default();
        Ok(Event {
            metadata: ObjectMeta {
                generate_name: Some(format!("{name}.")),
                namespace: obj.metadata.namespace.clone(),
                annotations: Some(metadata.annotations()),
                ..ObjectMeta::default()
            },
            // MicroTime is serialized as RFC 3339 with microsecond precision
            event_time: serde_json::from_value(serde_json::Value::String(
                Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string(),
            ))?,
            type_: Some(severity.as_str().to_string()),
            reason: Some(reason.to_string()),
            action: Some(reason.to_string()),
            note: Some(truncate_note(message).to_string()),
            regarding: Some(obj.object_ref(&())),
            reporting_controller: Some(self.controller.clone()),
            reporting_instance: Some(self.instance.clone()),
            ..Event::default()
        })
    }
}

/// Publishes events to the Kubernetes API
pub struct KubeEventRecorder {
    client: Client,
    reporter: EventReporter,
}

impl KubeEventRecorder {
    pub fn new(client: Client, config: &ControllerConfig) -> Self {
        Self {
            client,
            reporter: EventReporter::from_config(config),
        }
    }
}

impl fmt::Debug for KubeEventRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeEventRecorder")
            .field("reporter", &self.reporter)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventRecorder for KubeEventRecorder {
    async fn emit(
        &self,
        obj: &HelmRelease,
        metadata: &EventMetadata,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    ) {
        let namespace = obj.metadata.namespace.as_deref().unwrap_or_default();
        let name = obj.metadata.name.as_deref().unwrap_or_default();
        let event = match self.reporter.event(obj, metadata, severity, reason, message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    "Failed to build {} event for HelmRelease {}/{}: {}",
                    reason, namespace, name, e
                );
                return;
            }
        };
        debug!(
            annotations = ?metadata.annotations(),
            reason = reason,
            "Publishing event"
        );
        let api: Api<Event> = Api::namespaced(self.client.clone(), namespace);
        if let Err(e) = api.create(&PostParams::default(), &event).await {
            warn!(
                "Failed to publish {} event for HelmRelease {}/{}: {}",
                reason, namespace, name, e
            );
        }
    }
}

/// Cut a note down to the API limit on a character boundary
fn truncate_note(message: &str) -> &str {
    if message.len() <= MAX_EVENT_NOTE_BYTES {
        return message;
    }
    let mut end = MAX_EVENT_NOTE_BYTES;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_logs() {
        let buffer = LogBuffer::new(10);
        assert_eq!(event_message_with_log("install failed", &buffer), "install failed");
    }

    #[test]
    fn test_message_with_logs() {
        let buffer = LogBuffer::new(2);
        for i in 1..=3 {
            buffer.log(&format!("line {i}"));
        }
        assert_eq!(
            event_message_with_log("install failed", &buffer),
            "install failed\n\nLast Helm logs:\n\nline 2\nline 3"
        );
    }

    #[test]
    fn test_annotations() {
        let meta = EventMetadata::new("6.5.4", "sha256:abc");
        let annotations = meta.annotations();
        assert_eq!(annotations["helm.microscaler.io/revision"], "6.5.4");
        assert_eq!(annotations["helm.microscaler.io/token"], "sha256:abc");
    }

    #[test]
    fn test_event_carries_metadata_annotations() {
        let mut obj = HelmRelease::new("podinfo", crate::crd::HelmReleaseSpec::default());
        obj.metadata.namespace = Some("apps".to_string());
        let reporter = EventReporter {
            controller: "helm-release-controller".to_string(),
            instance: "helm-release-controller-0".to_string(),
        };

        let event = reporter
            .event(
                &obj,
                &EventMetadata::new("6.5.4", "sha256:abc"),
                EventSeverity::Warning,
                "InstallFailed",
                &"x".repeat(MAX_EVENT_NOTE_BYTES + 10),
            )
            .expect("event should build");

        let annotations = event.metadata.annotations.expect("annotations");
        assert_eq!(annotations["helm.microscaler.io/revision"], "6.5.4");
        assert_eq!(annotations["helm.microscaler.io/token"], "sha256:abc");
        assert_eq!(event.metadata.generate_name.as_deref(), Some("podinfo."));
        assert_eq!(event.metadata.namespace.as_deref(), Some("apps"));
        assert_eq!(event.type_.as_deref(), Some("Warning"));
        assert_eq!(event.reason.as_deref(), Some("InstallFailed"));
        assert_eq!(event.note.map(|n| n.len()), Some(MAX_EVENT_NOTE_BYTES));
        assert_eq!(
            event.reporting_controller.as_deref(),
            Some("helm-release-controller")
        );
        let regarding = event.regarding.expect("regarding");
        assert_eq!(regarding.kind.as_deref(), Some("HelmRelease"));
        assert_eq!(regarding.name.as_deref(), Some("podinfo"));
    }

    #[test]
    fn test_truncate_note() {
        assert_eq!(truncate_note("short"), "short");
        let long = "é".repeat(MAX_EVENT_NOTE_BYTES);
        let cut = truncate_note(&long);
        assert!(cut.len() <= MAX_EVENT_NOTE_BYTES);
        assert!(cut.chars().all(|c| c == 'é'));
    }
}
