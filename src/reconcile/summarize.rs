//! # Ready Summary
//!
//! Reduces the release conditions of a HelmRelease into its Ready condition.

use crate::conditions;
use crate::crd::{Condition, ConditionStatus, ConditionType, HelmRelease};

/// Recompute the Ready condition of the object
///
/// Test results count towards readiness when tests are enabled and their
/// failures are not ignored. Called once at the end of every action
/// reconciliation.
pub fn summarize(obj: &mut HelmRelease) {
    let generation = obj.generation();
    let test = obj.test();
    let tests_enabled = test.enable && !test.ignore_failures;
    if let Some(status) = obj.status.as_mut() {
        summarize_conditions(&mut status.conditions, generation, tests_enabled);
    }
}

/// Recompute the Ready condition from the other conditions in the set
///
/// First match wins:
/// 1. Remediated present: Ready is False with its reason and message.
/// 2. Tests enabled and TestSuccess present: Ready mirrors TestSuccess.
/// 3. Released present: Ready mirrors Released.
/// 4. Otherwise the set is left untouched.
///
/// Ready always carries `generation`. It is replaced in place when present
/// and inserted at the front otherwise; no other condition is modified.
pub fn summarize_conditions(conditions: &mut Vec<Condition>, generation: i64, tests_enabled: bool) {
    let Some((status, source)) = ready_source(conditions, tests_enabled) else {
        return;
    };
    let ready = Condition::new(
        ConditionType::Ready,
        status,
        &source.reason,
        &source.message,
        generation,
    );
    conditions::set_first(conditions, ready);
}

/// Condition Ready is derived from, with the status Ready takes
fn ready_source(
    conditions: &[Condition],
    tests_enabled: bool,
) -> Option<(ConditionStatus, &Condition)> {
    if let Some(remediated) = conditions::get(conditions, ConditionType::Remediated) {
        return Some((ConditionStatus::False, remediated));
    }
    if tests_enabled {
        if let Some(tested) = conditions::get(conditions, ConditionType::TestSuccess) {
            return Some((tested.status, tested));
        }
    }
    conditions::get(conditions, ConditionType::Released).map(|released| (released.status, released))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{INSTALL_SUCCEEDED_REASON, TEST_FAILED_REASON};
    use crate::crd::{HelmReleaseSpec, HelmReleaseStatus, TestSpec};

    fn condition(r#type: ConditionType, status: ConditionStatus, reason: &str) -> Condition {
        Condition::new(r#type, status, reason, &format!("{reason} message"), 1)
    }

    #[test]
    fn test_no_source_conditions_leaves_set_untouched() {
        let mut conditions = Vec::new();
        summarize_conditions(&mut conditions, 1, true);
        assert!(conditions.is_empty());
    }

    #[test]
    fn test_ignored_test_failures_do_not_affect_readiness() {
        let mut obj = HelmRelease::new(
            "podinfo",
            HelmReleaseSpec {
                test: Some(TestSpec {
                    enable: true,
                    ignore_failures: true,
                }),
                ..HelmReleaseSpec::default()
            },
        );
        obj.status = Some(HelmReleaseStatus {
            conditions: vec![
                condition(ConditionType::Released, ConditionStatus::True, INSTALL_SUCCEEDED_REASON),
                condition(ConditionType::TestSuccess, ConditionStatus::False, TEST_FAILED_REASON),
            ],
            ..HelmReleaseStatus::default()
        });

        summarize(&mut obj);

        let conditions = &obj.status.as_ref().expect("status").conditions;
        let ready = conditions::get(conditions, ConditionType::Ready).expect("ready");
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, INSTALL_SUCCEEDED_REASON);
    }

    #[test]
    fn test_summarize_without_status_is_noop() {
        let mut obj = HelmRelease::new("podinfo", HelmReleaseSpec::default());
        summarize(&mut obj);
        assert!(obj.status.is_none());
    }
}
