//! Lazily computed, memoized values.
//!
//! A [`Thunk`] holds a computation that does not run until somebody asks.
//! The first [`wait`](Thunk::wait) claims the computation, runs it on the
//! calling thread, and publishes the result through the shared gate; every
//! other caller, concurrent or later, gets the memoized value. The
//! computation runs at most once.
//!
//! A panic inside the computation is caught and recorded as a
//! `FaultRecovered` error, so one faulting waiter never strands the others.
//!
//! # Hazards
//!
//! [`cancel`](Thunk::cancel) marks the thunk done without consulting the
//! run guard, so a computation already claimed keeps running to completion
//! and stores its value next to the `Cancelled` error. Callers that need to
//! distinguish "cancelled before it ran" from "cancelled while running"
//! can check whether [`result`](Thunk::result) carries a value.

use core::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Once};

use crate::error::{Error, Result};
use crate::gate::{Settled, WaitGate};

type Compute<T> = Box<dyn FnOnce() -> T + Send>;

struct ThunkInner<T> {
    compute: Mutex<Option<Compute<T>>>,
    gate: WaitGate<Settled<T>>,
    run_once: Once,
}

/// A lazily computed value that callers can wait on or cancel.
///
/// Handles are cheap to clone and share one memoized result.
pub struct Thunk<T> {
    inner: Arc<ThunkInner<T>>,
}

impl<T> Thunk<T> {
    /// Creates a thunk around `compute`. Nothing runs until the first
    /// [`wait`](Thunk::wait).
    #[must_use]
    pub fn new<F>(compute: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self {
            inner: Arc::new(ThunkInner {
                compute: Mutex::new(Some(Box::new(compute))),
                gate: WaitGate::new(Settled::empty(), Settled::is_done),
                run_once: Once::new(),
            }),
        }
    }

    /// Blocks until the thunk settles, computing if this caller is first,
    /// then returns `self` for chaining into the accessors.
    ///
    /// The computation runs on the calling thread, outside the gate lock.
    /// Concurrent callers block until the claimed run publishes; later
    /// callers return immediately with the memoized state.
    pub fn wait(&self) -> &Self {
        if self.inner.gate.is_ready() {
            return self;
        }
        self.inner.run_once.call_once(|| {
            let compute = {
                let mut slot = match self.inner.compute.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                slot.take()
            };
            let Some(compute) = compute else {
                return;
            };
            let outcome = catch_unwind(AssertUnwindSafe(compute));
            let mut state = self.inner.gate.lock();
            match outcome {
                // The error slot is left alone so a cancellation that raced
                // the run stays visible next to the value.
                Ok(value) => state.value = Some(value),
                Err(payload) => state.error = Some(Error::from_panic(payload.as_ref())),
            }
            state.done = true;
            drop(state);
            self.inner.gate.broadcast();
        });
        let guard = self.inner.gate.lock();
        drop(self.inner.gate.wait(guard));
        self
    }

    /// Cancels the thunk, preventing a computation that has not started
    /// from ever running.
    ///
    /// Marks the thunk done and records a `Cancelled` error if it was still
    /// unsettled. A computation already claimed by a waiter is not
    /// interrupted; it completes and stores its value alongside the error.
    /// Cancellation does not broadcast: callers blocked in
    /// [`wait`](Thunk::wait) at that point are inside the claimed run and
    /// are released when it publishes.
    ///
    /// Returns the thunk's error slot after the cancel settles.
    pub fn cancel(&self) -> Option<Error> {
        let mut state = self.inner.gate.lock();
        if !state.done {
            state.done = true;
            state.error = Some(Error::cancelled("thunk cancelled before settling"));
            tracing::debug!("thunk cancelled");
        }
        state.error.clone()
    }

    /// Returns true once the thunk has settled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.gate.is_ready()
    }

    /// Returns a snapshot of the error slot.
    ///
    /// Does not wait; an unsettled thunk reports `None`.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        self.inner.gate.lock().error.clone()
    }

    /// Returns a snapshot of the value slot.
    ///
    /// Does not wait; an unsettled thunk reports `None`.
    #[must_use]
    pub fn result(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.gate.lock().value.clone()
    }

    /// Waits for settlement and collapses the slots into a `Result`, with
    /// the error slot taking precedence.
    ///
    /// # Errors
    ///
    /// Returns the terminal error if one was recorded.
    pub fn join(&self) -> Result<T>
    where
        T: Clone,
    {
        self.wait();
        let state = self.inner.gate.lock();
        if let Some(error) = &state.error {
            return Err(error.clone());
        }
        state
            .value
            .clone()
            .ok_or_else(|| Error::nil_resource("thunk settled without value or error"))
    }
}

impl<T> Clone for Thunk<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Thunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Thunk")
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}
