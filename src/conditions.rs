//! # Conditions
//!
//! Helpers for reading and writing the condition set of a HelmRelease.
//!
//! A condition set holds at most one condition per type. Setting a condition
//! replaces an existing one of the same type in place, so the order of the
//! set only changes when a new type is added.

use crate::crd::{Condition, ConditionStatus, ConditionType, HelmRelease};

/// Condition of the given type
pub fn get(conditions: &[Condition], r#type: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.r#type == r#type)
}

/// Whether the given condition type is present with status True
pub fn is_true(conditions: &[Condition], r#type: ConditionType) -> bool {
    get(conditions, r#type).is_some_and(|c| c.status == ConditionStatus::True)
}

/// Set a condition, replacing one of the same type in place or appending it
///
/// The last transition time only moves when the status changes.
pub fn set(conditions: &mut Vec<Condition>, condition: Condition) {
    upsert(conditions, condition, false);
}

/// Set a condition, inserting it at the front when not yet present
pub fn set_first(conditions: &mut Vec<Condition>, condition: Condition) {
    upsert(conditions, condition, true);
}

fn upsert(conditions: &mut Vec<Condition>, mut condition: Condition, front: bool) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        condition.last_transition_time = transition_time(existing, &condition);
        *existing = condition;
        return;
    }
    condition
        .last_transition_time
        .get_or_insert_with(|| chrono::Utc::now().to_rfc3339());
    if front {
        conditions.insert(0, condition);
    } else {
        conditions.push(condition);
    }
}

/// Remove the condition of the given type
pub fn delete(conditions: &mut Vec<Condition>, r#type: ConditionType) {
    conditions.retain(|c| c.r#type != r#type);
}

fn transition_time(existing: &Condition, next: &Condition) -> Option<String> {
    if existing.status == next.status && existing.last_transition_time.is_some() {
        existing.last_transition_time.clone()
    } else {
        next.last_transition_time
            .clone()
            .or_else(|| Some(chrono::Utc::now().to_rfc3339()))
    }
}

/// Mark a condition True on the object, at its current generation
pub fn mark_true(obj: &mut HelmRelease, r#type: ConditionType, reason: &str, message: &str) {
    mark(obj, r#type, ConditionStatus::True, reason, message);
}

/// Mark a condition False on the object, at its current generation
pub fn mark_false(obj: &mut HelmRelease, r#type: ConditionType, reason: &str, message: &str) {
    mark(obj, r#type, ConditionStatus::False, reason, message);
}

/// Mark a condition Unknown on the object, at its current generation
pub fn mark_unknown(obj: &mut HelmRelease, r#type: ConditionType, reason: &str, message: &str) {
    mark(obj, r#type, ConditionStatus::Unknown, reason, message);
}

fn mark(
    obj: &mut HelmRelease,
    r#type: ConditionType,
    status: ConditionStatus,
    reason: &str,
    message: &str,
) {
    let generation = obj.generation();
    set(
        &mut obj.status_mut().conditions,
        Condition::new(r#type, status, reason, message, generation),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(r#type: ConditionType, status: ConditionStatus, reason: &str) -> Condition {
        Condition::new(r#type, status, reason, "message", 1)
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut conditions = vec![
            condition(ConditionType::Released, ConditionStatus::True, "A"),
            condition(ConditionType::TestSuccess, ConditionStatus::True, "B"),
        ];
        set(
            &mut conditions,
            condition(ConditionType::Released, ConditionStatus::False, "C"),
        );
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].r#type, ConditionType::Released);
        assert_eq!(conditions[0].reason, "C");
        assert_eq!(conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn test_set_keeps_transition_time_when_status_unchanged() {
        let mut first = condition(ConditionType::Released, ConditionStatus::True, "A");
        first.last_transition_time = Some("2024-01-01T00:00:00+00:00".to_string());
        let mut conditions = vec![first];
        set(
            &mut conditions,
            condition(ConditionType::Released, ConditionStatus::True, "B"),
        );
        assert_eq!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );

        set(
            &mut conditions,
            condition(ConditionType::Released, ConditionStatus::False, "C"),
        );
        assert_ne!(
            conditions[0].last_transition_time.as_deref(),
            Some("2024-01-01T00:00:00+00:00")
        );
    }

    #[test]
    fn test_set_first_inserts_at_front() {
        let mut conditions = vec![condition(
            ConditionType::Released,
            ConditionStatus::True,
            "A",
        )];
        set_first(
            &mut conditions,
            condition(ConditionType::Ready, ConditionStatus::True, "A"),
        );
        assert_eq!(conditions[0].r#type, ConditionType::Ready);
        assert_eq!(conditions[1].r#type, ConditionType::Released);
    }

    #[test]
    fn test_get_and_delete() {
        let mut conditions = vec![condition(
            ConditionType::Remediated,
            ConditionStatus::True,
            "A",
        )];
        assert!(is_true(&conditions, ConditionType::Remediated));
        assert!(get(&conditions, ConditionType::Released).is_none());
        delete(&mut conditions, ConditionType::Remediated);
        assert!(conditions.is_empty());
    }
}
