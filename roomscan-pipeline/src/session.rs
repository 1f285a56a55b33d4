//! Keyed store of the latest result per scan session

use crate::result::ScanResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// How concurrent `process` calls for the same scan identifier interact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPolicy {
    /// Calls run concurrently; the one that completes last overwrites the
    /// stored result
    #[default]
    LastWriterWins,
    /// Calls for one identifier run one at a time, in lock acquisition order
    SerializedPerScan,
}

/// Latest [`ScanResult`] per scan identifier.
///
/// Safe to share between threads. Under [`SessionPolicy::SerializedPerScan`]
/// each identifier in flight has its own mutex, so different scans never wait
/// on each other. A scan's mutex is dropped once no call holds or waits for it.
#[derive(Debug, Default)]
pub struct SessionStore {
    policy: SessionPolicy,
    results: RwLock<HashMap<String, ScanResult>>,
    scan_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionStore {
    pub fn new(policy: SessionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Run `f` under the store's discipline for `scan_id`
    pub fn run_exclusive<T>(&self, scan_id: &str, f: impl FnOnce() -> T) -> T {
        match self.policy {
            SessionPolicy::LastWriterWins => f(),
            SessionPolicy::SerializedPerScan => {
                let lease = self.lease(scan_id);
                let _guard = lease.lock.lock().unwrap_or_else(PoisonError::into_inner);
                f()
            }
        }
    }

    fn lease<'a>(&'a self, scan_id: &'a str) -> ScanLockLease<'a> {
        let mut locks = self.scan_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let lock = Arc::clone(locks.entry(scan_id.to_string()).or_default());
        ScanLockLease {
            store: self,
            scan_id,
            lock,
        }
    }

    /// Store a result, replacing any earlier one for the same scan
    pub fn store(&self, result: ScanResult) {
        let mut results = self.results.write().unwrap_or_else(PoisonError::into_inner);
        results.insert(result.scan_id.clone(), result);
    }

    pub fn get(&self, scan_id: &str) -> Option<ScanResult> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        results.get(scan_id).cloned()
    }

    pub fn contains(&self, scan_id: &str) -> bool {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        results.contains_key(scan_id)
    }

    pub fn len(&self) -> usize {
        self.results.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared handle on one scan's mutex; the last lease out removes it from the
/// store
struct ScanLockLease<'a> {
    store: &'a SessionStore,
    scan_id: &'a str,
    lock: Arc<Mutex<()>>,
}

impl Drop for ScanLockLease<'_> {
    fn drop(&mut self) {
        // Leases are only handed out under this mutex, so the count is stable here.
        let mut locks = self.store.scan_locks.lock().unwrap_or_else(PoisonError::into_inner);
        let only_map_and_self = Arc::strong_count(&self.lock) == 2
            && locks
                .get(self.scan_id)
                .is_some_and(|lock| Arc::ptr_eq(lock, &self.lock));
        if only_map_and_self {
            locks.remove(self.scan_id);
        }
    }
}
