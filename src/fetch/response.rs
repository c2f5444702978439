//! Deferred response handle.

use core::fmt;
use std::sync::{Arc, Mutex};

use reqwest::blocking::Response;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::client::read_body;
use super::FetchError;
use crate::attempt::Attempt;
use crate::error::Error;
use crate::promise::Promise;
use crate::thunk::Thunk;

/// What a fetch settled to: a status plus either a readable response or an
/// error.
///
/// The raw response is held in a shared slot and taken exactly once, by
/// whoever reads the body first.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    status: Option<StatusCode>,
    error: Option<FetchError>,
    response: Arc<Mutex<Option<Response>>>,
}

impl FetchOutcome {
    pub(crate) fn from_response(response: Response) -> Self {
        Self {
            status: Some(response.status()),
            error: None,
            response: Arc::new(Mutex::new(Some(response))),
        }
    }

    pub(crate) fn failed(error: FetchError) -> Self {
        Self {
            status: None,
            error: Some(error),
            response: Arc::new(Mutex::new(None)),
        }
    }

    pub(crate) fn rejected(status: StatusCode, error: FetchError) -> Self {
        Self {
            status: Some(status),
            error: Some(error),
            response: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the response status, if a response arrived.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Returns the fetch error, if the fetch failed.
    #[must_use]
    pub fn error(&self) -> Option<&FetchError> {
        self.error.as_ref()
    }

    /// Returns true if the fetch produced a usable response.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Takes the raw response out of the shared slot. Later takers get
    /// `None`.
    pub(crate) fn take_response(&self) -> Option<Response> {
        let mut slot = match self.response.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        slot.take()
    }
}

/// Handle to a fetch in flight (or already settled).
///
/// The transport result lives behind a [`Promise`]; the body behind a
/// [`Thunk`] that reads from the wire on first demand and memoizes. All
/// accessors that need the outcome wait for it; [`error`](FetchResponse::error)
/// alone is a non-blocking snapshot.
#[derive(Clone)]
pub struct FetchResponse {
    promise: Promise<FetchOutcome>,
    body: Thunk<Attempt<Vec<u8>>>,
    background: bool,
}

impl FetchResponse {
    pub(crate) fn from_parts(promise: Promise<FetchOutcome>, background: bool) -> Self {
        let source = promise.clone();
        let body = Thunk::new(move || read_outcome_body(&source));
        Self {
            promise,
            body,
            background,
        }
    }

    pub(crate) fn failed(error: FetchError) -> Self {
        Self::from_parts(Promise::resolved(FetchOutcome::failed(error)), false)
    }

    /// Returns true if the request ran on a detached task.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.background
    }

    /// Returns the promise carrying the transport outcome.
    ///
    /// Exposed so callers can wait with a shared handle or cancel the
    /// fetch: `response.promise().cancel()`.
    #[must_use]
    pub fn promise(&self) -> &Promise<FetchOutcome> {
        &self.promise
    }

    /// Returns the thunk carrying the lazily read body.
    #[must_use]
    pub fn body(&self) -> &Thunk<Attempt<Vec<u8>>> {
        &self.body
    }

    /// Waits for the transport outcome.
    pub fn outcome(&self) -> FetchOutcome {
        self.promise.wait();
        match self.promise.result() {
            Some(outcome) => outcome,
            None => FetchOutcome::failed(match self.promise.error() {
                Some(error) => FetchError::Core(error),
                None => FetchError::Core(Error::nil_resource(
                    "fetch promise settled without an outcome",
                )),
            }),
        }
    }

    /// Waits for the transport outcome and returns its status.
    pub fn status(&self) -> Option<StatusCode> {
        self.outcome().status()
    }

    /// Snapshot of the first error anywhere in the pipeline, without
    /// waiting.
    ///
    /// Reports `None` while the fetch is still in flight, and body errors
    /// only once the body has actually been read.
    #[must_use]
    pub fn error(&self) -> Option<FetchError> {
        if !self.promise.is_done() {
            return None;
        }
        if let Some(error) = self.promise.error() {
            return Some(FetchError::Core(error));
        }
        if let Some(outcome) = self.promise.result() {
            if let Some(error) = outcome.error() {
                return Some(error.clone());
            }
        }
        if self.body.is_done() {
            if let Some(attempt) = self.body.result() {
                if let Some(error) = attempt.error() {
                    return Some(FetchError::Core(error.clone()));
                }
            }
        }
        None
    }

    /// Waits for the body and returns its bytes.
    ///
    /// The wire is read at most once; repeated calls return the memoized
    /// bytes.
    ///
    /// # Errors
    ///
    /// Returns the transport or status error if the fetch failed, and a
    /// read error if collecting the body failed.
    pub fn bytes(&self) -> Result<Vec<u8>, FetchError> {
        let outcome = self.outcome();
        if let Some(error) = outcome.error() {
            return Err(error.clone());
        }
        self.body.wait();
        match self.body.result() {
            Some(attempt) => attempt.into_result().map_err(FetchError::Core),
            None => Err(match self.body.error() {
                Some(error) => FetchError::Core(error),
                None => FetchError::BodyUnavailable("body thunk settled without a result"),
            }),
        }
    }

    /// Waits for the body and returns it as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Same conditions as [`bytes`](FetchResponse::bytes).
    pub fn text(&self) -> Result<String, FetchError> {
        self.bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Waits for the body and deserializes it as JSON.
    ///
    /// # Errors
    ///
    /// Same conditions as [`bytes`](FetchResponse::bytes), plus a decode
    /// error if the bytes are not valid JSON for `V`.
    pub fn json<V>(&self) -> Result<V, FetchError>
    where
        V: DeserializeOwned,
    {
        let bytes = self.bytes()?;
        serde_json::from_slice(&bytes).map_err(FetchError::from)
    }

    /// Waits for the body and parses it as a dynamic JSON value.
    ///
    /// # Errors
    ///
    /// Same conditions as [`json`](FetchResponse::json).
    pub fn json_value(&self) -> Result<serde_json::Value, FetchError> {
        self.json()
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("background", &self.background)
            .field("settled", &self.promise.is_done())
            .finish_non_exhaustive()
    }
}

/// Resolves the body for a settled (or settling) fetch: waits for the
/// outcome, takes the raw response, and drains it.
fn read_outcome_body(promise: &Promise<FetchOutcome>) -> Attempt<Vec<u8>> {
    promise.wait();
    let Some(outcome) = promise.result() else {
        let error = promise
            .error()
            .unwrap_or_else(|| Error::nil_resource("fetch promise settled without an outcome"));
        return Attempt::failure(error);
    };
    if let Some(error) = outcome.error() {
        return Attempt::failure(
            Error::user("fetch failed before the body was read").with_source(error.clone()),
        );
    }
    match read_body(outcome.take_response()) {
        Ok(bytes) => Attempt::success(bytes),
        Err(FetchError::BodyUnavailable(detail)) => Attempt::failure(Error::nil_resource(detail)),
        Err(error) => {
            Attempt::failure(Error::user("reading response body failed").with_source(error))
        }
    }
}
