//! Bounded channel handle with nil and close-with-reason semantics.

use core::fmt;
use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

use crate::error::{Error, Result};

struct ChanState<T> {
    queue: VecDeque<T>,
    closed: bool,
    reason: Option<Error>,
}

struct ChanInner<T> {
    capacity: usize,
    state: Mutex<ChanState<T>>,
    /// Senders park here when the queue is full.
    space: Condvar,
    /// Receivers park here when the queue is empty.
    values: Condvar,
}

impl<T> ChanInner<T> {
    // The queue and flags stay structurally valid even if a holder
    // panicked mid-operation, so poisoning is recovered, not propagated.
    fn lock_state(&self) -> MutexGuard<'_, ChanState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// A bounded channel handle.
///
/// Handles are cheap to clone; clones operate on the same channel. The
/// channel itself lives as long as any handle does.
///
/// A handle may also be **nil**: detached from any channel. Nil handles are
/// inert; every operation on one returns a `NilResource` error. They stand
/// in wherever a channel slot must exist before (or without) a real channel
/// being wired up.
pub struct Chan<T> {
    inner: Option<Arc<ChanInner<T>>>,
}

impl<T> Chan<T> {
    /// Creates a channel that buffers up to `capacity` values.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn bounded(capacity: usize) -> Self {
        assert!(capacity > 0, "channel capacity must be at least 1");
        Self {
            inner: Some(Arc::new(ChanInner {
                capacity,
                state: Mutex::new(ChanState {
                    queue: VecDeque::with_capacity(capacity),
                    closed: false,
                    reason: None,
                }),
                space: Condvar::new(),
                values: Condvar::new(),
            })),
        }
    }

    /// Creates a nil handle attached to no channel.
    #[must_use]
    pub fn nil() -> Self {
        Self { inner: None }
    }

    /// Returns true if this handle is nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.inner.is_none()
    }

    /// Sends a value, blocking while the buffer is full.
    ///
    /// # Errors
    ///
    /// Returns `NilResource` on a nil handle and `ChannelClosed` if the
    /// channel is closed before the value is accepted. The value is dropped
    /// on error.
    pub fn send(&self, value: T) -> Result<()> {
        let Some(inner) = self.inner.as_deref() else {
            return Err(Error::nil_resource("send on nil channel"));
        };
        let mut state = inner.lock_state();
        loop {
            if state.closed {
                return Err(Error::channel_closed("send on closed channel"));
            }
            if state.queue.len() < inner.capacity {
                state.queue.push_back(value);
                drop(state);
                inner.values.notify_one();
                return Ok(());
            }
            state = match inner.space.wait(state) {
                Ok(next) => next,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Receives a value, blocking while the buffer is empty and the channel
    /// is open.
    ///
    /// Values buffered before a close still drain in order. Once drained,
    /// a closed channel yields its close reason if one was recorded, and a
    /// plain `ChannelClosed` error otherwise.
    ///
    /// # Errors
    ///
    /// Returns `NilResource` on a nil handle; otherwise the close reason or
    /// `ChannelClosed` as described above.
    pub fn recv(&self) -> Result<T> {
        let Some(inner) = self.inner.as_deref() else {
            return Err(Error::nil_resource("receive on nil channel"));
        };
        let mut state = inner.lock_state();
        loop {
            if let Some(value) = state.queue.pop_front() {
                drop(state);
                inner.space.notify_one();
                return Ok(value);
            }
            if state.closed {
                return Err(state
                    .reason
                    .clone()
                    .unwrap_or_else(|| Error::channel_closed("receive on closed channel")));
            }
            state = match inner.values.wait(state) {
                Ok(next) => next,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Receives a value if one is ready.
    ///
    /// Returns `Ok(None)` when the channel is open but empty.
    ///
    /// # Errors
    ///
    /// Returns `NilResource` on a nil handle; on a drained, closed channel,
    /// the close reason or `ChannelClosed`.
    pub fn try_recv(&self) -> Result<Option<T>> {
        let Some(inner) = self.inner.as_deref() else {
            return Err(Error::nil_resource("receive on nil channel"));
        };
        let mut state = inner.lock_state();
        if let Some(value) = state.queue.pop_front() {
            drop(state);
            inner.space.notify_one();
            return Ok(Some(value));
        }
        if state.closed {
            return Err(state
                .reason
                .clone()
                .unwrap_or_else(|| Error::channel_closed("receive on closed channel")));
        }
        Ok(None)
    }

    /// Closes the channel, waking every blocked sender and receiver.
    ///
    /// # Errors
    ///
    /// Returns `NilResource` on a nil handle and `ChannelClosed` if the
    /// channel was already closed.
    pub fn close(&self) -> Result<()> {
        self.seal(None)
    }

    /// Closes the channel and records `reason` for receivers.
    ///
    /// Receivers that find the channel drained and closed get `reason`
    /// back instead of a generic closed error. This is how a fault on the
    /// producing side travels to consumers blocked on the result.
    ///
    /// # Errors
    ///
    /// Same conditions as [`close`](Chan::close).
    pub fn close_with(&self, reason: Error) -> Result<()> {
        self.seal(Some(reason))
    }

    fn seal(&self, reason: Option<Error>) -> Result<()> {
        let Some(inner) = self.inner.as_deref() else {
            return Err(Error::nil_resource("close of nil channel"));
        };
        let mut state = inner.lock_state();
        if state.closed {
            return Err(Error::channel_closed("close of closed channel"));
        }
        state.closed = true;
        state.reason = reason;
        drop(state);
        inner.values.notify_all();
        inner.space.notify_all();
        Ok(())
    }

    /// Returns true if the channel has been closed. Nil handles report
    /// false; like a nil channel they can never reach the closed state.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner
            .as_deref()
            .is_some_and(|inner| inner.lock_state().closed)
    }

    /// Returns the number of buffered values. Zero for nil handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .as_deref()
            .map_or(0, |inner| inner.lock_state().queue.len())
    }

    /// Returns true if no values are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the buffer capacity. Zero for nil handles.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.as_deref().map_or(0, |inner| inner.capacity)
    }
}

impl<T> Clone for Chan<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Chan<T> {
    /// The default handle is nil.
    fn default() -> Self {
        Self::nil()
    }
}

impl<T> fmt::Debug for Chan<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.as_deref() {
            None => f.debug_struct("Chan").field("nil", &true).finish(),
            Some(inner) => {
                let state = inner.lock_state();
                f.debug_struct("Chan")
                    .field("capacity", &inner.capacity)
                    .field("len", &state.queue.len())
                    .field("closed", &state.closed)
                    .finish()
            }
        }
    }
}
