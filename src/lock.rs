//! Per-path write locks
//!
//! A lock table keyed by logical path. Writers take the locks of every path
//! they touch; readers never lock.
//!
//! ## Deadlock freedom
//! Paths are deduplicated and locked in sorted order, so two writers that
//! need overlapping sets always acquire them in the same order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::lock_api::ArcMutexGuard;
use parking_lot::{Mutex, RawMutex};

use crate::resolver::ContentPath;

type PathMutex = Arc<Mutex<()>>;

/// Lock table shared by all writers of one store
#[derive(Debug, Default)]
pub struct PathLocks {
    /// One mutex per path currently or recently written
    table: Mutex<HashMap<ContentPath, PathMutex>>,
}

/// Held locks; released on drop
pub struct PathGuard {
    _guards: Vec<ArcMutexGuard<RawMutex, ()>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until every path in `paths` is held by the caller
    pub fn lock(&self, paths: &[&ContentPath]) -> PathGuard {
        let mut wanted: Vec<&ContentPath> = paths.to_vec();
        wanted.sort();
        wanted.dedup();

        let mutexes: Vec<PathMutex> = {
            let mut table = self.table.lock();
            // Drop entries nobody holds or waits on
            table.retain(|_, mutex| Arc::strong_count(mutex) > 1);

            wanted
                .iter()
                .map(|path| Arc::clone(table.entry((*path).clone()).or_default()))
                .collect()
        };

        PathGuard {
            _guards: mutexes.iter().map(|mutex| mutex.lock_arc()).collect(),
        }
    }

    /// Number of paths with a live lock entry
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
