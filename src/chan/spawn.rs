//! Detached task spawning behind a panic boundary.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread;

use crate::chan::Chan;
use crate::error::{panic_message, Error, Result};

/// Runs `task` on a detached thread.
///
/// A panic inside `task` is caught and logged; it never unwinds past the
/// task boundary or poisons shared state outside it.
///
/// # Errors
///
/// Returns `FaultRecovered` (with the OS error attached) if the thread
/// could not be spawned. The task does not run in that case.
pub fn spawn<F>(task: F) -> Result<()>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name("deferral-task".to_owned())
        .spawn(move || {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(task)) {
                tracing::warn!(
                    panic = %panic_message(payload.as_ref()),
                    "detached task panicked; fault contained at the task boundary"
                );
            }
        });
    match handle {
        Ok(_join) => Ok(()),
        Err(source) => Err(Error::fault_recovered("failed to spawn detached task").with_source(source)),
    }
}

/// Runs `task` on a detached thread and returns a channel that will carry
/// its result.
///
/// The returned channel has a single slot. On success the task sends its
/// value; if no receiver ever collects it, the value sits in the buffer
/// until the channel is dropped. If the task panics, the channel is closed
/// with a `FaultRecovered` reason so a blocked receiver wakes up holding
/// the fault instead of waiting forever.
///
/// If the thread cannot be spawned at all, the channel comes back already
/// closed with the spawn failure as its reason, and the same error is
/// returned alongside it.
pub fn spawn_with_result<T, F>(task: F) -> (Chan<T>, Option<Error>)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let chan = Chan::bounded(1);
    let producer = chan.clone();
    let handle = thread::Builder::new()
        .name("deferral-producer".to_owned())
        .spawn(move || match catch_unwind(AssertUnwindSafe(task)) {
            Ok(value) => {
                if let Err(error) = producer.send(value) {
                    tracing::debug!(%error, "task result discarded; channel closed first");
                }
            }
            Err(payload) => {
                let reason = Error::from_panic(payload.as_ref());
                tracing::warn!(
                    %reason,
                    "result task panicked; closing channel with the fault"
                );
                if let Err(error) = producer.close_with(reason) {
                    tracing::debug!(%error, "result channel was already closed after panic");
                }
            }
        });
    match handle {
        Ok(_join) => (chan, None),
        Err(source) => {
            let error = Error::fault_recovered("failed to spawn result task").with_source(source);
            let _ = chan.close_with(error.clone());
            (chan, Some(error))
        }
    }
}
