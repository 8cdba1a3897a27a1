//! Error types for LDP operations.
//!
//! Every failure a request can hit is a variant of [`LdpError`]. The
//! [`Result`] alias is used across the crate.
//!
//! # Error Categories
//!
//! | Category | Variants | HTTP | Retryable |
//! |----------|----------|------|-----------|
//! | Lookup | `NotFound` | 404 | No |
//! | Method | `MethodNotAllowed` | 405 | No |
//! | Formats | `UnsupportedFormat`, `NotAcceptable`, `MalformedBody` | 415, 406, 400 | No |
//! | Preconditions | `PreconditionRequired`, `PreconditionFailed`, `NotModified` | 428, 412, 304 | No |
//! | Invariants | `Conflict` | 409 | No |
//! | Storage | `StorageUnavailable`, `Io` | 503, 500 | Yes |
//! | Setup | `Config`, `InvalidUri`, `Json`, `Internal` | 500, 400 | No |
//!
//! All of these are terminal for the request: nothing inside the engine
//! retries them. Storage failures are kept distinct from `NotFound` and
//! `Conflict` so a flaky backend is never reported as a missing resource.
//!
//! # Examples
//!
//! ```
//! use ldp_rs::LdpError;
//!
//! let err = LdpError::StorageUnavailable("connection reset".into());
//! assert!(err.is_retryable());
//! assert_eq!(err.status_code(), 503);
//!
//! let err = LdpError::Conflict("tombstoned".into());
//! assert!(!err.is_retryable());
//! assert!(err.is_client_error());
//! ```

use std::io;
use thiserror::Error;

/// Result type for LDP operations.
pub type Result<T> = std::result::Result<T, LdpError>;

/// Errors that can occur while serving LDP resources.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum LdpError {
    /// Target is absent or tombstoned.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Verb does not apply to the target's current type (e.g. POST on a
    /// plain resource). `allowed` lists the verbs that do apply.
    #[error("Method {method} not allowed on {uri}")]
    MethodNotAllowed {
        method: String,
        uri: String,
        allowed: Vec<String>,
    },

    /// Request body media type is not one the server can parse.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// No offered serialization matches the client's preferences.
    #[error("Not acceptable: {0}")]
    NotAcceptable(String),

    /// A mutating replace arrived without `If-Match`.
    #[error("Precondition required: {0}")]
    PreconditionRequired(String),

    /// `If-Match` or `If-None-Match` did not hold.
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// `If-None-Match` matched on a read. Carries the current tag.
    #[error("Not modified ({etag})")]
    NotModified { etag: String },

    /// Containment invariant violated, or reuse of a tombstoned URI.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Body is in a supported format but cannot be used.
    #[error("Malformed body: {0}")]
    MalformedBody(String),

    /// The storage backend failed (connectivity, aborted transaction).
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A request target or configured URI is not a valid IRI.
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid server configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bug or unexpected state in the implementation.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for LdpError {
    fn from(err: anyhow::Error) -> Self {
        LdpError::Internal(err.to_string())
    }
}

impl LdpError {
    /// HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            LdpError::NotModified { .. } => 304,
            LdpError::MalformedBody(_) | LdpError::InvalidUri(_) => 400,
            LdpError::NotFound(_) => 404,
            LdpError::MethodNotAllowed { .. } => 405,
            LdpError::NotAcceptable(_) => 406,
            LdpError::Conflict(_) => 409,
            LdpError::PreconditionFailed(_) => 412,
            LdpError::UnsupportedFormat(_) => 415,
            LdpError::PreconditionRequired(_) => 428,
            LdpError::StorageUnavailable(_) => 503,
            LdpError::Config(_) | LdpError::Io(_) | LdpError::Json(_) | LdpError::Internal(_) => {
                500
            }
        }
    }

    /// Check if the caller may resubmit the same request.
    ///
    /// Only storage-level failures qualify; every protocol error is final.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, LdpError::StorageUnavailable(_) | LdpError::Io(_))
    }

    /// True for errors caused by the request rather than the server.
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}
