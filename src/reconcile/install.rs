//! # Install Reconciler
//!
//! Makes the first release of a chart for a HelmRelease.
//!
//! Before installing, the release history of the object is cleared: an
//! install starts a new release lineage, and a later rollback must never
//! target a release made before it.
//!
//! Every write the install makes to the Helm storage is observed and merged
//! into the history, whether the install succeeded or not. Only a failure
//! that left a release in storage counts towards the install remediation
//! strategy; a failure without storage effect is returned to the caller to
//! retry.
//!
//! The Ready condition is recomputed on every exit path, including the
//! reconcile future being dropped before it completes.

use super::events::{event_message_with_log, EventMetadata, EventRecorder, EventSeverity};
use super::observed::{observe_release, ObservedReleases};
use super::summarize::summarize;
use super::{ActionReconciler, ReconcileError, ReconcilerType, Request};
use crate::action::{digest_values, ActionConfig, ActionEngine, ActionError, LogBuffer, Release};
use crate::conditions;
use crate::config::ControllerConfig;
use crate::constants::{AWAITING_TESTS_REASON, INSTALL_FAILED_REASON, INSTALL_SUCCEEDED_REASON};
use crate::crd::{ConditionType, ReleaseAction, Remediation};
use crate::observability::metrics::{self, ActionResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Action reconciler installing a Helm release
pub struct Install {
    engine: Arc<dyn ActionEngine>,
    recorder: Arc<dyn EventRecorder>,
    config: ControllerConfig,
}

impl Install {
    pub fn new(engine: Arc<dyn ActionEngine>, recorder: Arc<dyn EventRecorder>) -> Self {
        Self::with_config(engine, recorder, ControllerConfig::default())
    }

    pub fn with_config(
        engine: Arc<dyn ActionEngine>,
        recorder: Arc<dyn EventRecorder>,
        config: ControllerConfig,
    ) -> Self {
        Self {
            engine,
            recorder,
            config,
        }
    }

    async fn install(
        &self,
        cancel: &CancellationToken,
        req: &mut Request,
    ) -> Result<(), ReconcileError> {
        let log_buffer = LogBuffer::new(self.config.log_buffer_size);
        let observed = Arc::new(Mutex::new(ObservedReleases::new()));
        let cfg = ActionConfig::new(
            req.object.storage_namespace(),
            log_buffer.log_fn(),
            observe_release(Arc::clone(&observed)),
        );

        let status = req.object.status_mut();
        status.last_attempted_release_action = Some(ReleaseAction::Install);
        status.clear_history();

        let result = tokio::select! {
            res = self.engine.install(&cfg, &req.object, &req.chart, &req.values) => res,
            () = cancel.cancelled() => Err(ActionError::Cancelled),
        };

        // Writes made before a failure or cancellation already happened and
        // must end up in the history.
        let observed = std::mem::take(&mut *observed.lock().unwrap_or_else(PoisonError::into_inner));
        observed.record_on_object(&mut req.object);

        match result {
            Err(err) if observed.is_empty() => {
                debug!(
                    "Install of {}/{} failed without modifying storage: {}",
                    req.object.release_namespace(),
                    req.object.release_name(),
                    err
                );
                metrics::increment_action_reconciliations(self.name(), ActionResult::Error);
                Err(err.into())
            }
            Err(err) => {
                self.failure(req, &log_buffer, &err).await;

                // Only failures that left a release in storage count towards
                // remediation; anything else can be retried without drift.
                let remediation = req.object.install().remediation();
                remediation.increment_failure_count(req.object.status_mut());
                metrics::increment_remediation_failures(self.name());
                metrics::increment_action_reconciliations(self.name(), ActionResult::Failure);
                Ok(())
            }
            Ok(release) => {
                self.success(req, &release).await;
                metrics::increment_action_reconciliations(self.name(), ActionResult::Success);
                Ok(())
            }
        }
    }

    /// Record a failed install: Released=False, one more failure, and a
    /// warning event carrying the last action log lines
    async fn failure(&self, req: &mut Request, buffer: &LogBuffer, err: &ActionError) {
        let msg = format!(
            "Helm install failed for release {}/{} with chart {}@{}: {}",
            req.object.release_namespace(),
            req.object.release_name(),
            req.chart.name(),
            req.chart.metadata.version,
            err.to_string().trim()
        );

        req.object.status_mut().failures += 1;
        conditions::mark_false(
            &mut req.object,
            ConditionType::Released,
            INSTALL_FAILED_REASON,
            &msg,
        );
        warn!("{}", msg);

        self.recorder
            .emit(
                &req.object,
                &EventMetadata::new(&req.chart.metadata.version, digest_values(&req.values)),
                EventSeverity::Warning,
                INSTALL_FAILED_REASON,
                &event_message_with_log(&msg, buffer),
            )
            .await;
    }

    /// Record a successful install: Released=True, TestSuccess=Unknown when
    /// tests are due, and a normal event
    async fn success(&self, req: &mut Request, release: &Release) {
        let cur = req
            .object
            .status
            .as_ref()
            .and_then(|s| s.history.latest())
            .cloned()
            .unwrap_or_else(|| release.to_snapshot());
        let msg = format!(
            "Helm install succeeded for release {} with chart {}",
            cur.full_release_name(),
            cur.versioned_chart_name()
        );

        conditions::mark_true(
            &mut req.object,
            ConditionType::Released,
            INSTALL_SUCCEEDED_REASON,
            &msg,
        );
        if req.object.test().enable && !cur.has_been_tested() {
            conditions::mark_unknown(
                &mut req.object,
                ConditionType::TestSuccess,
                AWAITING_TESTS_REASON,
                &format!(
                    "Release {} with chart {} has not been tested yet",
                    cur.full_release_name(),
                    cur.versioned_chart_name()
                ),
            );
        }
        info!("{}", msg);

        self.recorder
            .emit(
                &req.object,
                &EventMetadata::new(&cur.chart_version, &cur.config_digest),
                EventSeverity::Normal,
                INSTALL_SUCCEEDED_REASON,
                &msg,
            )
            .await;
    }
}

/// Recomputes Ready when dropped, so every exit of a reconciliation ends
/// with a fresh summary: returns, panics, and the future being dropped
struct SummarizeOnExit<'a>(&'a mut Request);

impl Drop for SummarizeOnExit<'_> {
    fn drop(&mut self) {
        summarize(&mut self.0.object);
    }
}

impl fmt::Debug for Install {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Install")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ActionReconciler for Install {
    async fn reconcile(
        &self,
        cancel: &CancellationToken,
        req: &mut Request,
    ) -> Result<(), ReconcileError> {
        let span = info_span!(
            "reconcile.action",
            action = self.name(),
            resource.name = req.object.metadata.name.as_deref().unwrap_or_default(),
            resource.namespace = req.object.metadata.namespace.as_deref().unwrap_or_default(),
        );
        let mut guard = SummarizeOnExit(req);
        #[allow(
            clippy::let_and_return,
            reason = "The future borrows the guard and must be dropped before it"
        )]
        let result = self.install(cancel, &mut *guard.0).instrument(span).await;
        result
    }

    fn name(&self) -> &'static str {
        "install"
    }

    fn reconciler_type(&self) -> ReconcilerType {
        ReconcilerType::Release
    }
}
