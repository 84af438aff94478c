//! Error type shared by every operation in this crate.

use crate::gdata::client::ClientConfigBuilderError;
use crate::transport::TransportError;
use http::StatusCode;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while talking to the GData API.
///
/// The first four variants describe faults of the feed/pagination protocol itself. The
/// remaining ones come from the transport, from HTTP status codes, or from payloads that do
/// not have the expected shape.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The payload declared an API version this client does not understand.
    ///
    /// Checked before anything else in the payload is decoded.
    #[error("YouTube API version mismatch: expected {expected}, got {}", .found.as_deref().unwrap_or("none"))]
    ApiVersionMismatch {
        expected: &'static str,
        found: Option<String>,
    },

    /// A link object in a `link` array could not be parsed.
    #[error("malformed link object: {reason}")]
    MalformedLink { reason: String },

    /// The first page promised more records than the `next` chain ever delivered.
    #[error("feed ended after {available} records but promised {expected}")]
    UnexpectedEndOfStream { expected: usize, available: usize },

    /// The requested position lies outside `[0, len)`.
    #[error("index {index} out of range for feed of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    /// The transport failed before a response was received.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with a non-success status.
    #[error("YouTube API request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The credentials were rejected.
    #[error("authentication failed: {0}")]
    Unauthorized(String),

    /// The credentials were accepted once but have since expired.
    #[error("authentication token expired")]
    TokenExpired,

    /// The operation needs credentials and the client has none.
    #[error("this operation requires an authenticated client")]
    NotAuthenticated,

    #[error("no such video: {0}")]
    NoSuchVideo(String),

    #[error("video is private: {0}")]
    PrivateVideo(String),

    #[error("YouTube API quota exceeded")]
    QuotaExceeded,

    /// The body was not JSON, or did not have the expected structure.
    #[error("parse YouTube API response as JSON")]
    Json(#[from] serde_json::Error),

    /// An entry decoded as JSON but is missing something a record needs.
    #[error("invalid feed entry: {reason}")]
    InvalidEntry { reason: String },

    #[error("invalid client configuration")]
    Config(#[from] ClientConfigBuilderError),
}

impl Error {
    pub(crate) fn invalid_entry(reason: impl Into<String>) -> Self {
        Self::InvalidEntry {
            reason: reason.into(),
        }
    }

    /// Whether retrying the same call with fresh credentials might succeed.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized(_) | Self::TokenExpired | Self::NotAuthenticated
        )
    }
}
