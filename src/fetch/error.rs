//! Error surface of the fetch layer.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by the fetch pipeline.
///
/// Transport and decode sources are held behind `Arc` so fetch errors stay
/// cloneable; a settled fetch hands the same error to every handle that
/// asks.
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    /// The HTTP client failed before a response arrived.
    #[error("http request failed: {0}")]
    Http(Arc<reqwest::Error>),
    /// The response status violated the fetch's status rule.
    #[error("unexpected http status {0}")]
    Status(StatusCode),
    /// The body was requested but no response is holding one.
    #[error("response body unavailable: {0}")]
    BodyUnavailable(&'static str),
    /// The body bytes were not valid JSON for the requested type.
    #[error("json decode failed: {0}")]
    Json(Arc<serde_json::Error>),
    /// A panic inside the fetch pipeline was caught at the public boundary.
    #[error("fetch panicked: {0}")]
    Faulted(String),
    /// A synchronous helper was handed a background request.
    #[error("synchronous helper called with a background request")]
    BackgroundRequest,
    /// A failure raised by the underlying coordination primitives.
    #[error(transparent)]
    Core(#[from] crate::error::Error),
}

impl FetchError {
    /// Returns the offending status for a status-rule violation.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(source: reqwest::Error) -> Self {
        Self::Http(Arc::new(source))
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json(Arc::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error as CoreError;

    #[test]
    fn display_formats() {
        let status = FetchError::Status(StatusCode::NOT_FOUND);
        assert_eq!(status.to_string(), "unexpected http status 404 Not Found");

        let faulted = FetchError::Faulted("kaboom".into());
        assert_eq!(faulted.to_string(), "fetch panicked: kaboom");

        let background = FetchError::BackgroundRequest;
        assert!(background.to_string().contains("background request"));
    }

    #[test]
    fn core_errors_pass_through_transparently() {
        let core = CoreError::cancelled("fetch cancelled");
        let wrapped = FetchError::from(core.clone());
        assert_eq!(wrapped.to_string(), core.to_string());
    }

    #[test]
    fn json_errors_convert_and_clone() {
        let bad: serde_json::Error =
            serde_json::from_str::<u32>("not json").expect_err("parse should fail");
        let err = FetchError::from(bad);
        let cloned = err.clone();
        assert!(matches!(cloned, FetchError::Json(_)));
    }

    #[test]
    fn status_accessor() {
        assert_eq!(
            FetchError::Status(StatusCode::IM_A_TEAPOT).status(),
            Some(StatusCode::IM_A_TEAPOT)
        );
        assert_eq!(FetchError::BackgroundRequest.status(), None);
    }
}
