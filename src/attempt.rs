//! Value-or-error pair produced by fallible computations.
//!
//! [`Attempt`] holds the outcome of a fallible computation as two slots, a
//! value and an error, instead of the either/or of `Result`. The shape
//! matches how deferred values settle: a thunk cancelled mid-flight can end
//! up with both slots filled, and an accessor should be able to look at
//! each independently.

use crate::error::{Error, Result};

/// Outcome of a fallible computation with separately inspectable value and
/// error slots.
#[derive(Debug, Clone)]
pub struct Attempt<T> {
    value: Option<T>,
    error: Option<Error>,
}

impl<T> Attempt<T> {
    /// Creates a successful attempt holding `value`.
    #[must_use]
    pub fn success(value: T) -> Self {
        Self {
            value: Some(value),
            error: None,
        }
    }

    /// Creates a failed attempt holding `error`.
    #[must_use]
    pub fn failure(error: Error) -> Self {
        Self {
            value: None,
            error: Some(error),
        }
    }

    /// Runs `compute` now and captures its outcome.
    pub fn capture<F>(compute: F) -> Self
    where
        F: FnOnce() -> Result<T>,
    {
        Self::from(compute())
    }

    /// Defers `compute`, returning a closure that captures its outcome when
    /// called.
    ///
    /// This is the packaging step for handing fallible work to a
    /// [`Thunk`](crate::thunk::Thunk) or a task: the computation stays
    /// untouched until the returned closure runs.
    pub fn wrap<F>(compute: F) -> impl FnOnce() -> Self
    where
        F: FnOnce() -> Result<T>,
    {
        move || Self::capture(compute)
    }

    /// Returns true if a value is present and no error is recorded.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.value.is_some() && self.error.is_none()
    }

    /// Returns true if an error is recorded.
    #[must_use]
    pub fn is_err(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the value slot.
    #[must_use]
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Returns the error slot.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    /// Consumes the attempt, returning the value slot.
    #[must_use]
    pub fn into_value(self) -> Option<T> {
        self.value
    }

    /// Collapses the attempt back into a `Result`, with the error slot
    /// taking precedence over the value slot.
    ///
    /// # Errors
    ///
    /// Returns the recorded error; an attempt with neither slot filled
    /// yields a `NilResource` error.
    pub fn into_result(self) -> Result<T> {
        if let Some(error) = self.error {
            return Err(error);
        }
        match self.value {
            Some(value) => Ok(value),
            None => Err(Error::nil_resource("attempt holds neither value nor error")),
        }
    }
}

impl<T> From<Result<T>> for Attempt<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Self::success(value),
            Err(error) => Self::failure(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn capture_success() {
        let attempt = Attempt::capture(|| Ok(21));
        assert!(attempt.is_ok());
        assert_eq!(attempt.value(), Some(&21));
        assert!(attempt.error().is_none());
        assert_eq!(attempt.into_result().expect("value missing"), 21);
    }

    #[test]
    fn capture_failure() {
        let attempt: Attempt<u32> = Attempt::capture(|| Err(Error::user("backend said no")));
        assert!(attempt.is_err());
        assert!(!attempt.is_ok());
        assert!(attempt.value().is_none());
        let err = attempt.into_result().expect_err("error missing");
        assert_eq!(err.kind(), ErrorKind::User);
    }

    #[test]
    fn wrap_defers_the_computation() {
        let ran = AtomicBool::new(false);
        let deferred = Attempt::wrap(|| {
            ran.store(true, Ordering::SeqCst);
            Ok("later")
        });
        assert!(!ran.load(Ordering::SeqCst));

        let attempt = deferred();
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(attempt.value(), Some(&"later"));
    }

    #[test]
    fn from_result_preserves_both_arms() {
        let ok: Attempt<u32> = Attempt::from(Ok(5));
        assert!(ok.is_ok());

        let err: Attempt<u32> = Attempt::from(Err(Error::cancelled("stop")));
        assert!(err.error().is_some_and(Error::is_cancelled));
    }

    #[test]
    fn into_value_drops_the_error_slot() {
        let failed: Attempt<u32> = Attempt::failure(Error::cancelled("stop"));
        assert_eq!(failed.into_value(), None);

        let succeeded = Attempt::success(3);
        assert_eq!(succeeded.into_value(), Some(3));
    }
}
