//! In-flight deployment registry.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Set of repository names currently being deployed.
///
/// Cheap to clone; clones share the same set. Membership is only changed
/// through [`try_begin`](Self::try_begin) and [`end`](Self::end), or through
/// a [`DeploymentGuard`].
#[derive(Debug, Clone, Default)]
pub struct DeploymentState {
    in_progress: Arc<Mutex<HashSet<String>>>,
}

impl DeploymentState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<String>> {
        // Critical sections are single set operations; a poisoned set is still valid.
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomically mark `name` as in progress. Returns `false` if it already was.
    pub fn try_begin(&self, name: &str) -> bool {
        self.lock().insert(name.to_string())
    }

    /// Remove `name` from the in-progress set.
    pub fn end(&self, name: &str) {
        self.lock().remove(name);
    }

    pub fn is_deploying(&self, name: &str) -> bool {
        self.lock().contains(name)
    }

    /// Like [`try_begin`](Self::try_begin), but returns a guard that calls
    /// [`end`](Self::end) when dropped.
    pub fn claim(&self, name: &str) -> Option<DeploymentGuard> {
        self.try_begin(name).then(|| DeploymentGuard {
            state: self.clone(),
            name: name.to_string(),
        })
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Ownership of one repository's in-progress mark.
#[derive(Debug)]
pub struct DeploymentGuard {
    state: DeploymentState,
    name: String,
}

impl DeploymentGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for DeploymentGuard {
    fn drop(&mut self) {
        self.state.end(&self.name);
    }
}
