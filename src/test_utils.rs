//! Test utilities for Deferral.
//!
//! This module provides shared helpers for unit tests:
//! - Consistent tracing-based logging initialization
//! - Phase/completion macros for readable test output
//! - Polling helpers for timing-dependent assertions
//! - Error-kind assertion macros
//!
//! # Example
//! ```
//! use deferral::test_utils::init_test_logging;
//!
//! fn my_test() {
//!     init_test_logging();
//!     deferral::test_phase!("my_test");
//!     // test body
//!     deferral::test_complete!("my_test");
//! }
//! ```

use std::sync::Once;
use std::time::{Duration, Instant};

use tracing_subscriber::fmt::format::FmtSpan;

static INIT_LOGGING: Once = Once::new();

/// Initialize test logging with trace-level output.
///
/// Safe to call multiple times; only initializes once.
pub fn init_test_logging() {
    init_test_logging_with_level(tracing::Level::TRACE);
}

/// Initialize test logging with a custom level.
///
/// The first call wins; later calls are no-ops.
pub fn init_test_logging_with_level(level: tracing::Level) {
    INIT_LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_span_events(FmtSpan::CLOSE)
            .with_ansi(false)
            .try_init();
    });
}

/// Polls `condition` until it holds or `deadline` elapses.
///
/// Returns true if the condition held within the deadline. Timing-dependent
/// tests use this instead of bare sleeps so they pass on slow machines
/// without waiting the worst case on fast ones.
pub fn eventually(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    loop {
        if condition() {
            return true;
        }
        if start.elapsed() > deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Log a test phase transition with a visual separator.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        tracing::info!(phase = %$name, "========================================");
        tracing::info!(phase = %$name, "TEST PHASE: {}", $name);
        tracing::info!(phase = %$name, "========================================");
    };
}

/// Log a section within a test phase.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        tracing::debug!(section = %$name, "--- {} ---", $name);
    };
}

/// Log test completion with summary.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        tracing::info!(test = %$name, "test completed successfully: {}", $name);
    };
    ($name:expr, $($key:ident = $value:expr),* $(,)?) => {
        tracing::info!(
            test = %$name,
            $($key = %$value,)*
            "test completed successfully: {}",
            $name
        );
    };
}

/// Log before assertions for context.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr) => {
        tracing::debug!(
            expected = ?$expected,
            actual = ?$actual,
            "Asserting: {}",
            $msg
        );
        assert!($cond, "{}: expected {:?}, got {:?}", $msg, $expected, $actual);
    };
}

/// Assert that a `Result` is an error of a specific [`ErrorKind`](crate::ErrorKind).
#[macro_export]
macro_rules! assert_err_kind {
    ($result:expr, $kind:expr) => {
        match $result {
            Err(error) => assert_eq!(error.kind(), $kind, "unexpected error kind: {error}"),
            Ok(_) => panic!("expected {:?} error, got Ok", $kind),
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn eventually_returns_once_condition_holds() {
        let polls = AtomicUsize::new(0);
        let held = eventually(Duration::from_secs(2), || {
            polls.fetch_add(1, Ordering::SeqCst) >= 3
        });
        assert!(held);
        assert!(polls.load(Ordering::SeqCst) >= 3);
    }

    #[test]
    fn eventually_gives_up_after_the_deadline() {
        let held = eventually(Duration::from_millis(20), || false);
        assert!(!held);
    }
}
