//! Shared fixtures for the reconciler integration tests.

#![allow(dead_code, reason = "Not every test binary uses every fixture")]

use async_trait::async_trait;
use helm_release_controller::action::{
    ActionConfig, ActionEngine, ActionError, Chart, Hook, HookEvent, HookExecution, HookPhase,
    Release, ReleaseStatus,
};
use helm_release_controller::crd::{
    ChartRef, Condition, HelmRelease, HelmReleaseSpec, InstallRemediation, InstallSpec, TestSpec,
};
use helm_release_controller::reconcile::{EventMetadata, EventRecorder, EventSeverity, Request};
use helm_release_controller::storage::{storage_key, Driver, MemoryDriver};
use kube::api::ObjectMeta;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub const RELEASE_NAME: &str = "podinfo";
pub const RELEASE_NAMESPACE: &str = "apps";
pub const CHART_NAME: &str = "podinfo";
pub const CHART_VERSION: &str = "6.5.4";

/// How the fake engine behaves on install
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Store a pending release, then mark it deployed
    Succeed,
    /// Like `Succeed`, with the chart's test hooks already executed
    SucceedTested,
    /// Fail before anything is written to storage
    FailBeforeStorage(String),
    /// Store a pending release, mark it failed and return the error
    FailAfterStorage(String),
    /// Store a pending release, cancel the token and never return
    HangAfterStorage(CancellationToken),
    /// Cancel the token and never return, without writing anything
    HangBeforeStorage(CancellationToken),
}

/// Action engine writing to an in-memory Helm storage
#[derive(Debug)]
pub struct FakeEngine {
    pub storage: Arc<MemoryDriver>,
    behavior: Behavior,
    calls: Mutex<usize>,
}

impl FakeEngine {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            storage: Arc::new(MemoryDriver::new()),
            behavior,
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().expect("lock")
    }
}

#[async_trait]
impl ActionEngine for FakeEngine {
    async fn install(
        &self,
        config: &ActionConfig,
        obj: &HelmRelease,
        chart: &Chart,
        values: &serde_json::Value,
    ) -> Result<Release, ActionError> {
        *self.calls.lock().expect("lock") += 1;
        let storage = config.observed_storage(Arc::clone(&self.storage));
        let name = obj.release_name();

        config.log(&format!("preparing install for {name}"));
        match &self.behavior {
            Behavior::FailBeforeStorage(msg) => {
                config.log("failed to render chart");
                return Err(ActionError::Failed(msg.clone()));
            }
            Behavior::HangBeforeStorage(token) => {
                token.cancel();
                std::future::pending::<()>().await;
            }
            _ => {}
        }

        let version = i32::try_from(storage.list(&name)?.len()).unwrap_or(i32::MAX) + 1;
        let key = storage_key(&name, version);
        let mut release = Release::new(
            name.as_str(),
            obj.release_namespace(),
            version,
            chart,
            values.clone(),
        );
        release.status = ReleaseStatus::PendingInstall;
        storage.create(&key, &release)?;
        config.log("creating 1 resource(s)");

        match &self.behavior {
            Behavior::FailAfterStorage(msg) => {
                config.log("post-install hook failed");
                release.status = ReleaseStatus::Failed;
                storage.update(&key, &release)?;
                Err(ActionError::Failed(msg.clone()))
            }
            Behavior::HangAfterStorage(token) => {
                token.cancel();
                std::future::pending::<()>().await;
                Err(ActionError::Failed("unreachable".to_string()))
            }
            Behavior::SucceedTested => {
                release.status = ReleaseStatus::Deployed;
                release.hooks = vec![Hook {
                    name: format!("{name}-test"),
                    events: vec![HookEvent::Test],
                    last_run: Some(HookExecution {
                        started_at: None,
                        completed_at: None,
                        phase: HookPhase::Succeeded,
                    }),
                }];
                storage.update(&key, &release)?;
                Ok(release)
            }
            _ => {
                release.status = ReleaseStatus::Deployed;
                release.first_deployed = Some(chrono::Utc::now());
                release.last_deployed = release.first_deployed;
                storage.update(&key, &release)?;
                Ok(release)
            }
        }
    }
}

/// Event as handed to the recorder
#[derive(Debug, Clone)]
pub struct RecordedEvent {
    pub metadata: EventMetadata,
    pub severity: EventSeverity,
    pub reason: String,
    pub message: String,
}

/// Recorder keeping every emitted event in memory
#[derive(Debug, Default)]
pub struct RecordingRecorder {
    events: Mutex<Vec<RecordedEvent>>,
}

impl RecordingRecorder {
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EventRecorder for RecordingRecorder {
    async fn emit(
        &self,
        _obj: &HelmRelease,
        metadata: &EventMetadata,
        severity: EventSeverity,
        reason: &str,
        message: &str,
    ) {
        self.events.lock().expect("lock").push(RecordedEvent {
            metadata: metadata.clone(),
            severity,
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }
}

/// HelmRelease at generation 1 with the given test and remediation settings
pub fn helm_release(tests_enabled: bool) -> HelmRelease {
    HelmRelease {
        metadata: ObjectMeta {
            name: Some(RELEASE_NAME.to_string()),
            namespace: Some(RELEASE_NAMESPACE.to_string()),
            generation: Some(1),
            ..ObjectMeta::default()
        },
        spec: HelmReleaseSpec {
            chart: ChartRef {
                name: CHART_NAME.to_string(),
                version: Some(CHART_VERSION.to_string()),
            },
            install: Some(InstallSpec {
                remediation: Some(InstallRemediation {
                    retries: 3,
                    ..InstallRemediation::default()
                }),
                ..InstallSpec::default()
            }),
            test: Some(TestSpec {
                enable: tests_enabled,
                ignore_failures: false,
            }),
            ..HelmReleaseSpec::default()
        },
        status: None,
    }
}

pub fn request(tests_enabled: bool) -> Request {
    Request::new(
        helm_release(tests_enabled),
        Chart::new(CHART_NAME, CHART_VERSION),
        serde_json::json!({ "replicaCount": 2 }),
    )
}

/// Conditions without their transition times, for comparison
pub fn without_times(conditions: &[Condition]) -> Vec<Condition> {
    conditions
        .iter()
        .cloned()
        .map(|mut c| {
            c.last_transition_time = None;
            c
        })
        .collect()
}
