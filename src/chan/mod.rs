//! Fault-isolating channels and detached task spawning.
//!
//! [`Chan`] is a bounded multi-producer, multi-consumer channel whose
//! operations never abort the calling thread:
//!
//! - A **nil** handle (from [`Chan::nil`] or `Chan::default()`) turns every
//!   operation into a `NilResource` error instead of a crash or a hang.
//! - Operations on a **closed** channel return `ChannelClosed` errors; a
//!   close may carry a reason that blocked receivers observe verbatim.
//! - Values already buffered when the channel closes still drain to
//!   receivers before the closed error surfaces.
//!
//! [`spawn`] and [`spawn_with_result`] run work on detached threads behind a
//! panic boundary. A panicking task never takes the process down: plain
//! tasks log the fault, result-producing tasks close their channel with a
//! `FaultRecovered` reason so consumers blocked on the result wake up with
//! the fault in hand.

mod handle;
mod spawn;

pub use handle::Chan;
pub use spawn::{spawn, spawn_with_result};
