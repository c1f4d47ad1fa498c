use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// Freshest probe pair seen for a cook.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatestReading {
    pub meat: Option<f64>,
    pub smoker: Option<f64>,
}

/// Latest readings per cook id, shared between the message handler and the
/// snapshotter. Entries are overwritten, never cleared.
#[derive(Clone, Default)]
pub struct LatestTempCache {
    inner: Arc<RwLock<HashMap<i64, LatestReading>>>,
}

impl LatestTempCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, cook_id: i64, reading: LatestReading) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.insert(cook_id, reading);
    }

    pub fn get(&self, cook_id: i64) -> Option<LatestReading> {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(&cook_id).copied()
    }

    /// Point-in-time copy, sorted by cook id.
    pub fn snapshot(&self) -> Vec<(i64, LatestReading)> {
        let guard = match self.inner.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let mut entries: Vec<_> = guard.iter().map(|(id, reading)| (*id, *reading)).collect();
        drop(guard);

        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    pub fn len(&self) -> usize {
        match self.inner.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
