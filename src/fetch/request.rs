//! Request description and builder.

use reqwest::blocking::Client;
use reqwest::Method;

/// A description of an HTTP request to fetch.
///
/// Built by chaining; every field has a usable default. The method defaults
/// to `GET` and requests run synchronously unless
/// [`background`](FetchRequest::background) says otherwise.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) client: Option<Client>,
    pub(crate) background: bool,
}

impl FetchRequest {
    /// Creates a request for `url`.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Appends a header. Repeating a name sends the header multiple times.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Uses `client` instead of the shared default client.
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Runs the request on a detached task instead of inline.
    #[must_use]
    pub fn background(mut self, background: bool) -> Self {
        self.background = background;
        self
    }

    /// Returns the request URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns true if the request is set to run on a detached task.
    #[must_use]
    pub fn is_background(&self) -> bool {
        self.background
    }

    pub(crate) fn has_header(&self, name: &str) -> bool {
        self.headers
            .iter()
            .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}
