//! The counter registry

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;

/// Process-scoped map of named integer counters
///
/// Counters spring into existence on first increment.
#[derive(Debug, Default)]
pub struct StatsRegistry {
    counters: Mutex<HashMap<String, i64>>,
}

impl StatsRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one to the named counter
    pub fn increment(&self, key: &str) {
        let mut counters = self.counters.lock();
        *counters.entry(key.to_owned()).or_insert(0) += 1;
    }

    /// Current value of the named counter; zero when never incremented
    pub fn get(&self, key: &str) -> i64 {
        self.counters.lock().get(key).copied().unwrap_or(0)
    }

    /// Drop every counter
    pub fn reset(&self) {
        self.counters.lock().clear();
    }

    /// Copy of all counters, sorted by key for stable reporting
    pub fn snapshot(&self) -> BTreeMap<String, i64> {
        self.counters
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }
}
