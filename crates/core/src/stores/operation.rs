use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::error;

use crate::errors::CoreError;

/// Loading flags and last-error messages, namespaced by operation key
/// (e.g. `"dashboard"`, `"monthPrediction"`).
///
/// Keys are independent: one operation failing never touches another
/// operation's flag or message.
#[derive(Debug, Clone, Default)]
pub struct OperationState {
    loading: HashMap<&'static str, bool>,
    errors: HashMap<&'static str, String>,
}

impl OperationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `key` in flight and clear its previous error.
    pub fn begin(&mut self, key: &'static str) {
        self.loading.insert(key, true);
        self.errors.remove(key);
    }

    /// Record a failure message for `key`.
    pub fn fail(&mut self, key: &'static str, message: impl Into<String>) {
        self.errors.insert(key, message.into());
    }

    /// Mark `key` no longer in flight.
    pub fn finish(&mut self, key: &'static str) {
        self.loading.insert(key, false);
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.loading.get(key).copied().unwrap_or(false)
    }

    pub fn any_loading(&self) -> bool {
        self.loading.values().any(|&flag| flag)
    }

    pub fn error(&self, key: &str) -> Option<String> {
        self.errors.get(key).cloned()
    }

    pub fn clear_error(&mut self, key: &str) {
        self.errors.remove(key);
    }
}

/// Implemented by every store's state so the shared action runner can
/// reach its operation flags.
pub(crate) trait HasOperations {
    fn ops(&self) -> &OperationState;
    fn ops_mut(&mut self) -> &mut OperationState;
}

/// Holds `key` in flight for as long as it lives.
///
/// Dropping the guard clears the loading flag, so a future cancelled
/// mid-await (aborted task, elapsed timeout) cannot leave it set.
pub(crate) struct OperationGuard<'a, S: HasOperations> {
    state: &'a RwLock<S>,
    key: &'static str,
}

impl<'a, S: HasOperations> OperationGuard<'a, S> {
    /// Flag `key` in flight and clear its previous error.
    pub(crate) fn begin(state: &'a RwLock<S>, key: &'static str) -> Self {
        write(state).ops_mut().begin(key);
        Self { state, key }
    }
}

impl<S: HasOperations> Drop for OperationGuard<'_, S> {
    fn drop(&mut self) {
        write(self.state).ops_mut().finish(self.key);
    }
}

/// Run one store action under the loading/error protocol:
///
/// 1. flag `key` in flight and clear its error
/// 2. await `call`
/// 3. on success hand the payload to `apply` (inside the state lock)
/// 4. on failure record the message
/// 5. clear the flag last, then return the outcome to the caller
///
/// The state lock is never held across the await. If the returned future
/// is dropped before completion only step 5 happens.
pub(crate) async fn track<S, T, R, Fut, F>(
    state: &RwLock<S>,
    key: &'static str,
    call: Fut,
    apply: F,
) -> Result<R, CoreError>
where
    S: HasOperations,
    Fut: Future<Output = Result<T, CoreError>>,
    F: FnOnce(&mut S, T) -> R,
{
    let in_flight = OperationGuard::begin(state, key);

    let outcome = call.await;

    let result = {
        let mut guard = write(state);
        match outcome {
            Ok(payload) => Ok(apply(&mut *guard, payload)),
            Err(e) => {
                error!("Operation '{key}' failed: {e}");
                guard.ops_mut().fail(key, e.to_string());
                Err(e)
            }
        }
    };
    drop(in_flight);
    result
}

// ── Lock helpers ────────────────────────────────────────────────────
// A poisoned lock is recovered, never propagated.

pub(crate) fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
