//! Eagerly started deferred values.
//!
//! A [`Promise`] runs its producing function on a detached task the moment
//! it is constructed. The result travels through a single-slot channel into
//! shared terminal state guarded by a [`WaitGate`](crate::gate::WaitGate).
//! Any number of handles can then [`wait`](Promise::wait) for the value;
//! the receive happens exactly once and the settled state is read by
//! everyone else.
//!
//! # Lifecycle
//!
//! 1. [`Promise::new`] spawns the producer and hands it the channel.
//! 2. The first waiter claims the receive, blocks on the channel **outside**
//!    the gate lock, stores the outcome, marks the promise done, and
//!    broadcasts. Later waiters (and concurrent ones) see the settled state.
//! 3. [`Promise::cancel`] closes the channel instead. A producer still
//!    running finds its send refused; a waiter blocked on the receive wakes
//!    up with the closed error.
//!
//! A producer that panics does not hang its waiters: the task boundary
//! closes the channel with a `FaultRecovered` reason, which the receive
//! surfaces like any other settlement.
//!
//! # Hazards
//!
//! Cancellation and completion race by construction, and the race is left
//! observable rather than papered over:
//!
//! - A cancel that lands while the receive is mid-flight can leave either
//!   terminal error behind, `Cancelled` or `ChannelClosed`, depending on
//!   which side stored last.
//! - A cancel that loses the race entirely may find the channel already
//!   closed by the completing side and record that close error even though
//!   a value landed. Both slots are then occupied; [`result`](Promise::result)
//!   and [`error`](Promise::error) let callers inspect each.

use core::fmt;
use std::sync::{Arc, Once};

use crate::chan::{spawn_with_result, Chan};
use crate::error::{Error, Result};
use crate::gate::{Settled, WaitGate};

struct PromiseInner<T> {
    results: Chan<T>,
    gate: WaitGate<Settled<T>>,
    recv_once: Once,
    cancel_once: Once,
}

/// An eagerly computed value that callers can wait on or cancel.
///
/// Handles are cheap to clone and share one settlement.
pub struct Promise<T> {
    inner: Arc<PromiseInner<T>>,
}

impl<T> Promise<T> {
    /// Starts `produce` on a detached task and returns the promise for its
    /// result.
    ///
    /// If the task cannot be spawned, the promise is born settled with the
    /// spawn failure as its error.
    pub fn new<F>(produce: F) -> Self
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (results, spawn_error) = spawn_with_result(produce);
        let settled = match spawn_error {
            Some(error) => Settled::failed(error),
            None => Settled::empty(),
        };
        Self::from_parts(results, settled)
    }

    /// Creates a promise already settled with `value`.
    ///
    /// No task is spawned and no channel is wired up; waiting returns
    /// immediately and cancelling is a no-op that reports no error.
    #[must_use]
    pub fn resolved(value: T) -> Self {
        Self::from_parts(Chan::nil(), Settled::resolved(value))
    }

    fn from_parts(results: Chan<T>, settled: Settled<T>) -> Self {
        Self {
            inner: Arc::new(PromiseInner {
                results,
                gate: WaitGate::new(settled, Settled::is_done),
                recv_once: Once::new(),
                cancel_once: Once::new(),
            }),
        }
    }

    /// Blocks until the promise settles, then returns `self` for chaining
    /// into the accessors.
    ///
    /// The first caller performs the channel receive; everyone else blocks
    /// until the settled state is published. Waiting on a settled promise
    /// returns immediately.
    pub fn wait(&self) -> &Self {
        if self.inner.gate.is_ready() {
            return self;
        }
        self.inner.recv_once.call_once(|| {
            // The receive blocks outside the gate so cancel can get the
            // lock while we are parked on the channel.
            let received = self.inner.results.recv();
            {
                let mut state = self.inner.gate.lock();
                match received {
                    Ok(value) => {
                        state.value = Some(value);
                        state.error = None;
                    }
                    Err(error) => {
                        state.value = None;
                        state.error = Some(error);
                    }
                }
                state.done = true;
            }
            self.inner.gate.broadcast();
            if let Err(error) = self.inner.results.close() {
                tracing::trace!(%error, "result channel already closed at settlement");
            }
        });
        let guard = self.inner.gate.lock();
        drop(self.inner.gate.wait(guard));
        self
    }

    /// Cancels the promise.
    ///
    /// On a settled promise this is a read: the stored error (if any) comes
    /// back unchanged and the value is untouched. On an unsettled promise
    /// the result channel is closed, which refuses the producer's send and
    /// wakes any waiter blocked on the receive; the terminal error recorded
    /// is `Cancelled` when this call performed the close, or the close
    /// failure when someone else got there first.
    ///
    /// Returns the promise's error slot after the cancel settles.
    pub fn cancel(&self) -> Option<Error> {
        {
            let state = self.inner.gate.lock();
            if state.done {
                let existing = state.error.clone();
                drop(state);
                self.inner.gate.broadcast();
                return existing;
            }
        }
        self.inner.cancel_once.call_once(|| {
            let terminal = match self.inner.results.close() {
                Ok(()) => Error::cancelled("promise cancelled before completion"),
                Err(error) => error,
            };
            tracing::debug!(%terminal, "promise cancelled");
            let mut state = self.inner.gate.lock();
            state.error = Some(terminal);
            state.done = true;
        });
        self.inner.gate.broadcast();
        self.inner.gate.lock().error.clone()
    }

    /// Returns true once the promise has settled.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.inner.gate.is_ready()
    }

    /// Returns a snapshot of the error slot.
    ///
    /// Does not wait; an unsettled promise reports `None`.
    #[must_use]
    pub fn error(&self) -> Option<Error> {
        self.inner.gate.lock().error.clone()
    }

    /// Returns a snapshot of the value slot.
    ///
    /// Does not wait; an unsettled promise reports `None`.
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
            .ok_or_else(|| Error::nil_resource("promise settled without value or error"))
    }
}

impl<T> Clone for Promise<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Promise<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Promise")
            .field("done", &self.is_done())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_utils::init_test_logging;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn wait_returns_the_computed_value() {
        init_test("wait_returns_the_computed_value");
        let promise = Promise::new(|| 6 * 7);
        let result = promise.wait().result();
        crate::assert_with_log!(result == Some(42), "promise result", Some(42), result);
        assert!(promise.is_done());
        assert!(promise.error().is_none());
        crate::test_complete!("wait_returns_the_computed_value");
    }

    #[test]
    fn producer_runs_once_for_many_waiters() {
        init_test("producer_runs_once_for_many_waiters");
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let promise = Promise::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(20));
            7
        });

        let mut handles = Vec::new();
        for _ in 0..5 {
            let promise = promise.clone();
            handles.push(thread::spawn(move || promise.wait().result()));
        }
        for handle in handles {
            assert_eq!(handle.join().expect("waiter panicked"), Some(7));
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        crate::test_complete!("producer_runs_once_for_many_waiters");
    }

    #[test]
    fn cancel_before_completion_settles_with_cancelled() {
        init_test("cancel_before_completion_settles_with_cancelled");
        let promise = Promise::new(|| {
            thread::sleep(Duration::from_millis(200));
            1
        });

        let err = promise.cancel().expect("cancel reported no error");
        assert_eq!(err.kind(), ErrorKind::Cancelled);

        // A later wait returns promptly with the cancellation on record.
        let waited = promise.wait();
        assert_eq!(waited.result(), None);
        assert!(waited.error().is_some_and(|e| e.is_cancelled()));
        crate::assert_err_kind!(promise.join(), ErrorKind::Cancelled);
        crate::test_complete!("cancel_before_completion_settles_with_cancelled");
    }

    #[test]
    fn cancel_after_completion_preserves_the_outcome() {
        init_test("cancel_after_completion_preserves_the_outcome");
        let promise = Promise::new(|| 13);
        promise.wait();

        let err = promise.cancel();
        assert!(err.is_none());
        assert_eq!(promise.result(), Some(13));
        crate::test_complete!("cancel_after_completion_preserves_the_outcome");
    }

    #[test]
    fn cancel_twice_reports_the_same_terminal_error() {
        init_test("cancel_twice_reports_the_same_terminal_error");
        let promise = Promise::new(|| {
            thread::sleep(Duration::from_millis(200));
            1
        });
        let first = promise.cancel().expect("first cancel");
        let second = promise.cancel().expect("second cancel");
        assert_eq!(first.kind(), second.kind());
        crate::test_complete!("cancel_twice_reports_the_same_terminal_error");
    }

    #[test]
    fn cancel_releases_a_blocked_waiter() {
        init_test("cancel_releases_a_blocked_waiter");
        let promise = Promise::new(|| {
            thread::sleep(Duration::from_millis(300));
            1
        });

        let waiter_promise = promise.clone();
        let waiter = thread::spawn(move || {
            waiter_promise.wait();
            waiter_promise.error()
        });

        thread::sleep(Duration::from_millis(30));
        promise.cancel();

        let err = waiter
            .join()
            .expect("waiter panicked")
            .expect("no terminal error recorded");
        // Which terminal error sticks depends on whether the cancel or the
        // woken receive stored last; both are legitimate.
        assert!(
            matches!(err.kind(), ErrorKind::Cancelled | ErrorKind::ChannelClosed),
            "unexpected terminal error: {err}"
        );
        crate::test_complete!("cancel_releases_a_blocked_waiter");
    }

    #[test]
    fn panicking_producer_surfaces_a_fault() {
        init_test("panicking_producer_surfaces_a_fault");
        let promise: Promise<u32> = Promise::new(|| panic!("producer exploded"));
        promise.wait();

        let err = promise.error().expect("fault missing");
        assert_eq!(err.kind(), ErrorKind::FaultRecovered);
        assert_eq!(err.message(), Some("producer exploded"));
        assert_eq!(promise.result(), None);
        crate::test_complete!("panicking_producer_surfaces_a_fault");
    }

    #[test]
    fn resolved_promise_is_immediately_available() {
        init_test("resolved_promise_is_immediately_available");
        let promise = Promise::resolved(99);
        assert!(promise.is_done());
        assert_eq!(promise.wait().result(), Some(99));

        // Cancelling a settled promise is a read, not a state change.
        assert!(promise.cancel().is_none());
        assert_eq!(promise.result(), Some(99));
        crate::test_complete!("resolved_promise_is_immediately_available");
    }

    #[test]
    fn clones_share_one_settlement() {
        init_test("clones_share_one_settlement");
        let runs = Arc::new(AtomicUsize::new(0));
        let counted = Arc::clone(&runs);
        let promise = Promise::new(move || {
            counted.fetch_add(1, Ordering::SeqCst);
            "shared"
        });

        let clone = promise.clone();
        let waiter = thread::spawn(move || clone.wait().result());
        assert_eq!(promise.wait().result(), Some("shared"));
        assert_eq!(waiter.join().expect("waiter panicked"), Some("shared"));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        crate::test_complete!("clones_share_one_settlement");
    }

    #[test]
    fn join_collapses_the_slots() {
        init_test("join_collapses_the_slots");
        let promise = Promise::new(|| 5);
        assert_eq!(promise.join().expect("join failed"), 5);

        let cancelled = Promise::new(|| {
            thread::sleep(Duration::from_millis(200));
            5
        });
        cancelled.cancel();
        crate::assert_err_kind!(cancelled.join(), ErrorKind::Cancelled);
        crate::test_complete!("join_collapses_the_slots");
    }
}
