//! Request execution and the public fetch entry points.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::OnceLock;

use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use super::{FetchError, FetchOutcome, FetchRequest, FetchResponse};
use crate::error::panic_message;
use crate::promise::Promise;

/// Which response statuses a fetch accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusRule {
    /// Any status; the caller inspects it.
    Any,
    /// Exactly `200 OK`.
    OkOnly,
    /// Informational and success statuses (anything below 300).
    Success,
    /// Exactly the given status.
    Exact(StatusCode),
}

impl StatusRule {
    fn accepts(self, status: StatusCode) -> bool {
        match self {
            Self::Any => true,
            Self::OkOnly => status == StatusCode::OK,
            Self::Success => status.as_u16() < 300,
            Self::Exact(expected) => status == expected,
        }
    }
}

fn shared_client() -> &'static Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(Client::new)
}

/// Executes the request and applies the status rule.
fn perform(request: FetchRequest, rule: StatusRule) -> FetchOutcome {
    let FetchRequest {
        method,
        url,
        headers,
        body,
        client,
        ..
    } = request;
    let client = client.unwrap_or_else(|| shared_client().clone());

    let mut builder = client.request(method, url.as_str());
    for (name, value) in headers {
        builder = builder.header(name, value);
    }
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let response = match builder.send() {
        Ok(response) => response,
        Err(source) => {
            tracing::debug!(url = %url, error = %source, "http request failed");
            return FetchOutcome::failed(FetchError::from(source));
        }
    };

    let status = response.status();
    tracing::debug!(url = %url, status = %status, "http response received");
    if rule.accepts(status) {
        FetchOutcome::from_response(response)
    } else {
        // Dropping the response closes the connection before we settle.
        drop(response);
        FetchOutcome::rejected(status, FetchError::Status(status))
    }
}

/// Runs the fetch inline or on a detached task per the request's mode.
fn dispatch(request: FetchRequest, rule: StatusRule) -> FetchResponse {
    let background = request.background;
    let promise = if background {
        Promise::new(move || perform(request, rule))
    } else {
        Promise::resolved(perform(request, rule))
    };
    FetchResponse::from_parts(promise, background)
}

/// Panic boundary for the public entry points.
fn guarded<F>(run: F) -> FetchResponse
where
    F: FnOnce() -> FetchResponse,
{
    match catch_unwind(AssertUnwindSafe(run)) {
        Ok(response) => response,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "fetch entry point panicked");
            FetchResponse::failed(FetchError::Faulted(message))
        }
    }
}

/// Fetches `request`, accepting any response status.
pub fn fetch(request: FetchRequest) -> FetchResponse {
    guarded(move || dispatch(request, StatusRule::Any))
}

/// Fetches `request`, accepting only `200 OK`.
pub fn fetch_ok(request: FetchRequest) -> FetchResponse {
    guarded(move || dispatch(request, StatusRule::OkOnly))
}

/// Fetches `request`, accepting any status below 300.
pub fn fetch_success(request: FetchRequest) -> FetchResponse {
    guarded(move || dispatch(request, StatusRule::Success))
}

/// Fetches `request`, accepting exactly `status`.
///
/// Useful when a "failure" status is the expected outcome, e.g. probing
/// that an endpoint really returns `404`.
pub fn fetch_status(request: FetchRequest, status: StatusCode) -> FetchResponse {
    guarded(move || dispatch(request, StatusRule::Exact(status)))
}

/// Fetches `request` synchronously (status below 300) and returns the body
/// bytes.
///
/// # Errors
///
/// Returns [`FetchError::BackgroundRequest`] if the request is marked
/// background; otherwise any transport, status, or read error.
pub fn fetch_body(request: FetchRequest) -> Result<Vec<u8>, FetchError> {
    if request.background {
        return Err(FetchError::BackgroundRequest);
    }
    fetch_success(request).bytes()
}

/// Fetches `request` synchronously and deserializes the body as JSON.
///
/// An `Accept: application/json` header is added if the request has none,
/// and `Content-Type: application/json` if it carries a body without one.
///
/// # Errors
///
/// Same conditions as [`fetch_body`], plus a decode error if the body is
/// not valid JSON for `V`.
pub fn fetch_json<V>(request: FetchRequest) -> Result<V, FetchError>
where
    V: DeserializeOwned,
{
    if request.background {
        return Err(FetchError::BackgroundRequest);
    }
    let request = with_json_headers(request);
    let bytes = fetch_success(request).bytes()?;
    serde_json::from_slice(&bytes).map_err(FetchError::from)
}

fn with_json_headers(mut request: FetchRequest) -> FetchRequest {
    if !request.has_header("accept") {
        request = request.header("accept", "application/json");
    }
    if request.body.is_some() && !request.has_header("content-type") {
        request = request.header("content-type", "application/json");
    }
    request
}

/// Drains a response body into owned bytes.
///
/// # Errors
///
/// Returns [`FetchError::BodyUnavailable`] when handed `None`, and the
/// transport error if draining fails.
pub fn read_body(response: Option<Response>) -> Result<Vec<u8>, FetchError> {
    let Some(response) = response else {
        return Err(FetchError::BodyUnavailable("no response to read from"));
    };
    response
        .bytes()
        .map(|bytes| bytes.to_vec())
        .map_err(FetchError::from)
}
