//! Condition-variable gate guarding shared completion state.
//!
//! [`WaitGate`] bundles a mutex-protected state value with a condition
//! variable and a readiness predicate. It is the monitor at the heart of
//! [`Promise`](crate::promise::Promise) and [`Thunk`](crate::thunk::Thunk),
//! and is usable on its own for any "block until the state says so"
//! coordination.
//!
//! The usage pattern is the standard monitor form:
//!
//! 1. [`lock`](WaitGate::lock) the state and mutate or inspect it.
//! 2. Hand the guard to [`wait`](WaitGate::wait); it loops on the predicate,
//!    releasing the lock while parked, and returns once the predicate holds.
//! 3. After a mutation that may satisfy the predicate, call
//!    [`broadcast`](WaitGate::broadcast) to release every parked waiter.
//!
//! The guard releases the lock when dropped. A waiter returning from
//! [`wait`](WaitGate::wait) re-notifies the condition variable, so a single
//! wakeup chains through every thread parked at the time.
//!
//! Lock poisoning is swallowed: a panic in one locker never turns later
//! `lock` calls into aborts. The predicate decides validity, not the poison
//! flag.

use std::sync::{Condvar, Mutex, MutexGuard};

use crate::error::Error;

/// A monitor combining guarded state, a condition variable, and a
/// readiness predicate.
pub struct WaitGate<S> {
    state: Mutex<S>,
    cond: Condvar,
    ready: fn(&S) -> bool,
}

impl<S> WaitGate<S> {
    /// Creates a gate around `state`. `ready` reports when waiters may
    /// proceed.
    #[must_use]
    pub fn new(state: S, ready: fn(&S) -> bool) -> Self {
        Self {
            state: Mutex::new(state),
            cond: Condvar::new(),
            ready,
        }
    }

    /// Locks the guarded state.
    ///
    /// A poisoned lock is recovered rather than propagated; the state a
    /// panicking holder left behind is still governed by the predicate.
    pub fn lock(&self) -> MutexGuard<'_, S> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Blocks until the readiness predicate holds, then returns the guard.
    ///
    /// Must be called with the guard returned by [`lock`](WaitGate::lock).
    /// The lock is released while parked and held again on return. Before
    /// returning, the condition variable is notified once more so a single
    /// [`broadcast`](WaitGate::broadcast) chain-wakes every parked waiter.
    pub fn wait<'a>(&'a self, mut guard: MutexGuard<'a, S>) -> MutexGuard<'a, S> {
        while !(self.ready)(&guard) {
            guard = match self.cond.wait(guard) {
                Ok(next) => next,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
        self.cond.notify_all();
        guard
    }

    /// Wakes every thread parked in [`wait`](WaitGate::wait).
    ///
    /// Callers mutate the state under the lock first, drop the guard, then
    /// broadcast. Waiters re-check the predicate on wakeup, so a broadcast
    /// that races a new waiter is never lost.
    pub fn broadcast(&self) {
        self.cond.notify_all();
    }

    /// Returns true if the readiness predicate currently holds.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        (self.ready)(&self.lock())
    }
}

/// Terminal state shared by the deferred-value primitives.
///
/// `done` flips exactly once from false to true. `value` and `error` are
/// meaningful only once `done` is set; both may be present when completion
/// raced cancellation.
pub(crate) struct Settled<T> {
    pub(crate) done: bool,
    pub(crate) value: Option<T>,
    pub(crate) error: Option<Error>,
}

impl<T> Settled<T> {
    /// An unsettled state: no value, no error, not done.
    pub(crate) fn empty() -> Self {
        Self {
            done: false,
            value: None,
            error: None,
        }
    }

    /// A state already settled with a value.
    pub(crate) fn resolved(value: T) -> Self {
        Self {
            done: true,
            value: Some(value),
            error: None,
        }
    }

    /// A state already settled with an error.
    pub(crate) fn failed(error: Error) -> Self {
        Self {
            done: true,
            value: None,
            error: Some(error),
        }
    }

    /// Readiness predicate for gates guarding a `Settled`.
    pub(crate) fn is_done(state: &Self) -> bool {
        state.done
    }
}
