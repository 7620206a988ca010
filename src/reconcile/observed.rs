//! # Observed Releases
//!
//! Collects the release records an action writes to storage, so they can be
//! merged into the object history once the action returns.

use crate::action::{ObserveFn, Release};
use crate::crd::{HelmRelease, Snapshot};
use crate::storage::storage_key;
use std::sync::{Arc, Mutex, PoisonError};

/// Snapshots of storage writes made during one action, by storage key
///
/// A later write for the same key replaces the earlier snapshot but keeps
/// its position, so entries stay in the order they were first observed.
#[derive(Debug, Clone, Default)]
pub struct ObservedReleases {
    entries: Vec<(String, Snapshot)>,
}

impl ObservedReleases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the state of a release at the moment it was written
    pub fn record(&mut self, snapshot: Snapshot) {
        let key = storage_key(&snapshot.name, snapshot.version);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = snapshot,
            None => self.entries.push((key, snapshot)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Snapshot> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, snapshot)| snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshots in the order first observed
    pub fn snapshots(&self) -> impl Iterator<Item = &Snapshot> {
        self.entries.iter().map(|(_, snapshot)| snapshot)
    }

    /// Merge the observed snapshots into the object history
    ///
    /// A snapshot of a release revision already in the history replaces it
    /// in place, unless both carry the same digest. New revisions are
    /// appended. Unrelated history entries are left alone.
    pub fn record_on_object(&self, obj: &mut HelmRelease) {
        let history = &mut obj.status_mut().history.0;
        for snapshot in self.snapshots() {
            match history
                .iter_mut()
                .find(|s| s.targets(&snapshot.name, &snapshot.namespace, snapshot.version))
            {
                Some(existing) if existing.digest == snapshot.digest => {}
                Some(existing) => *existing = snapshot.clone(),
                None => history.push(snapshot.clone()),
            }
        }
    }
}

/// Observe callback recording every written release into the set
pub fn observe_release(observed: Arc<Mutex<ObservedReleases>>) -> ObserveFn {
    Arc::new(move |release: &Release| {
        observed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(release.to_snapshot());
    })
}
