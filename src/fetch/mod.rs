//! Lazy HTTP fetch built on promises and thunks.
//!
//! The entry points ([`fetch`], [`fetch_ok`], [`fetch_success`],
//! [`fetch_status`]) take a [`FetchRequest`] and return a [`FetchResponse`]
//! immediately. In the default synchronous mode the request has already run
//! by then; in background mode (see [`FetchRequest::background`]) it runs
//! on a detached task and the response resolves through a
//! [`Promise`](crate::promise::Promise). Either way the body is a
//! [`Thunk`](crate::thunk::Thunk): it is read from the wire at most once,
//! on first demand, and memoized.
//!
//! The `_ok`, `_success`, and `_status` variants bake a status rule into
//! the fetch. A response failing its rule is dropped (closing the
//! connection) and the fetch settles with a [`FetchError::Status`].
//!
//! Every entry point sits behind a panic boundary: a fault anywhere in the
//! pipeline comes back as a [`FetchError::Faulted`] response, never an
//! unwind into the caller.
//!
//! Requests go through a shared default client unless
//! [`FetchRequest::client`] supplies one; pass a custom client to configure
//! timeouts, proxies, or TLS. Dropping a response closes its connection, so
//! there is no explicit close step.

mod client;
mod error;
mod request;
mod response;

pub use client::{fetch, fetch_body, fetch_json, fetch_ok, fetch_status, fetch_success, read_body};
pub use error::FetchError;
pub use request::FetchRequest;
pub use response::{FetchOutcome, FetchResponse};

pub use reqwest::{Method, StatusCode};
