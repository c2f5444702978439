//! Error types shared by the coordination primitives.
//!
//! Every fallible operation in this crate reports failure through [`Error`],
//! a small carrier of an [`ErrorKind`] plus optional human-readable detail
//! and an optional source chain. The design follows a few principles:
//!
//! - Errors are explicit and typed (no stringly-typed errors)
//! - Faults caught at a task boundary become ordinary error values
//! - Operations on absent resources fail, they never abort
//! - Errors are classified by recoverability for callers that retry
//!
//! # Kinds
//!
//! - [`ErrorKind::NilResource`]: an operation touched a detached handle
//! - [`ErrorKind::FaultRecovered`]: a panic was caught at a boundary
//! - [`ErrorKind::ChannelClosed`]: a channel refused an operation after close
//! - [`ErrorKind::Cancelled`]: a deferred value was cancelled before settling
//! - [`ErrorKind::User`]: a failure supplied by user or collaborator code

use core::fmt;
use std::any::Any;
use std::sync::Arc;

/// The kind of error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An operation was attempted on a nil (detached) resource handle.
    NilResource,
    /// A panic was caught at a task or API boundary and converted to an error.
    FaultRecovered,
    /// A channel operation was refused because the channel is closed.
    ChannelClosed,
    /// A deferred value was cancelled before it settled.
    Cancelled,
    /// A failure originating in user or collaborator code.
    User,
}

impl ErrorKind {
    /// Returns the recoverability classification for this error kind.
    ///
    /// This helps callers decide whether retrying the operation can
    /// possibly succeed.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        match self {
            // Permanent: the handle or value will never become usable again.
            Self::NilResource | Self::ChannelClosed | Self::Cancelled => Recoverability::Permanent,
            // Context-dependent: the underlying failure decides.
            Self::FaultRecovered | Self::User => Recoverability::Unknown,
        }
    }

    /// Returns true if this error is typically retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.recoverability(), Recoverability::Transient)
    }
}

/// Classification of error recoverability for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recoverability {
    /// Temporary failure that may succeed on retry.
    Transient,
    /// Permanent failure that will not succeed on retry.
    Permanent,
    /// Recoverability depends on context and cannot be determined
    /// from the error kind alone.
    Unknown,
}

/// The main error type for deferral operations.
#[derive(Debug, Clone)]
pub struct Error {
    kind: ErrorKind,
    message: Option<String>,
    source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub const fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Returns the error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the error message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Returns true if this error represents cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.kind, ErrorKind::Cancelled)
    }

    /// Returns true if this error came from a closed channel.
    #[must_use]
    pub const fn is_channel_closed(&self) -> bool {
        matches!(self.kind, ErrorKind::ChannelClosed)
    }

    /// Returns true if this error wraps a recovered panic.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self.kind, ErrorKind::FaultRecovered)
    }

    /// Returns the recoverability classification.
    #[must_use]
    pub const fn recoverability(&self) -> Recoverability {
        self.kind.recoverability()
    }

    /// Adds a message description to the error.
    #[must_use]
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        self.message = Some(msg.into());
        self
    }

    /// Adds a source error to the chain.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a nil-resource error.
    #[must_use]
    pub fn nil_resource(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NilResource).with_message(detail)
    }

    /// Creates an error for a panic recovered at a boundary.
    #[must_use]
    pub fn fault_recovered(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::FaultRecovered).with_message(detail)
    }

    /// Creates a closed-channel error.
    #[must_use]
    pub fn channel_closed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ChannelClosed).with_message(detail)
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled).with_message(detail)
    }

    /// Creates a user-originated error.
    #[must_use]
    pub fn user(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::User).with_message(detail)
    }

    /// Creates a fault error from a caught panic payload.
    ///
    /// The payload's message is extracted with [`panic_message`].
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        Self::new(ErrorKind::FaultRecovered).with_message(panic_message(payload))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.kind)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

/// A specialized `Result` type for deferral operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Extracts a human-readable message from a panic payload.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
