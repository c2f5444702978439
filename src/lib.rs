//! Deferral: deferred-value coordination for blocking code.
//!
//! # Overview
//!
//! Deferral provides a small family of primitives for computing values on
//! other threads (or later on this one) and collecting them safely: eager
//! [`Promise`]s, lazy [`Thunk`]s, the [`WaitGate`] monitor they settle
//! through, and a fault-isolating [`Chan`] that carries results across the
//! task boundary. A lazy HTTP client built from these pieces lives in
//! [`fetch`].
//!
//! # Core Guarantees
//!
//! - **At-most-once computation**: a promise's producer and a thunk's
//!   computation run exactly once no matter how many handles wait
//! - **Cancellation never waits behind the work**: `cancel` closes the
//!   result path instead of joining the computation
//! - **Faults become errors**: a panic in a task, a computation, or a fetch
//!   surfaces as a `FaultRecovered` error value, never an abort or a hang
//! - **Nil handles are inert**: operations on a detached channel handle
//!   return `NilResource` errors instead of crashing or blocking forever
//! - **Observable races**: where cancellation and completion genuinely
//!   race, both slots stay inspectable rather than one silently winning
//!
//! # Module Structure
//!
//! - [`error`]: Error carrier, kinds, and recoverability classification
//! - [`gate`]: Mutex + condvar + predicate monitor ([`WaitGate`])
//! - [`chan`]: Bounded channels with nil/close semantics and task spawning
//! - [`promise`]: Eagerly started deferred values
//! - [`thunk`]: Lazily computed, memoized values
//! - [`attempt`]: Value-or-error pair for fallible computations
//! - [`fetch`]: Lazy HTTP fetch built on promises and thunks
//! - [`test_utils`]: Logging setup and assertion macros for tests

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]

pub mod attempt;
pub mod chan;
pub mod error;
pub mod fetch;
pub mod gate;
pub mod promise;
pub mod test_utils;
pub mod thunk;

pub use attempt::Attempt;
pub use chan::{spawn, spawn_with_result, Chan};
pub use error::{Error, ErrorKind, Recoverability, Result};
pub use gate::WaitGate;
pub use promise::Promise;
pub use thunk::Thunk;
