use std::fmt;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure taxonomy surfaced by every operation in this crate.
///
/// A missing document is *not* represented here: point reads return
/// `Ok(None)` on 404 because absence is an expected outcome, not an error.
/// No variant triggers an internal retry; retry and backoff policy belong to
/// callers, who know which of their operations are idempotent.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// A resource path that does not address a document or collection.
    InvalidPath(String),
    /// Token mint or exchange failed. The cached token, if any, is untouched.
    AuthFailure(String),
    /// No response was obtained (connect error, timeout, broken transport).
    TransportFailure(String),
    /// The remote store answered with a non-2xx status other than 404.
    RemoteRejected { status: u16, body: String },
    /// The query response envelope could not be interpreted.
    QueryDecodeFailure(String),
    /// A response body or wire value could not be decoded.
    DecodeFailure(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidPath(message) => write!(f, "Invalid resource path: {message}"),
            StoreError::AuthFailure(message) => write!(f, "Token mint failed: {message}"),
            StoreError::TransportFailure(message) => write!(f, "Transport failure: {message}"),
            StoreError::RemoteRejected { status, body } => {
                write!(f, "Remote rejected request with status {status}: {body}")
            }
            StoreError::QueryDecodeFailure(message) => {
                write!(f, "Malformed query response: {message}")
            }
            StoreError::DecodeFailure(message) => write!(f, "Malformed wire value: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

pub fn invalid_path(message: impl Into<String>) -> StoreError {
    StoreError::InvalidPath(message.into())
}

pub fn auth_failure(message: impl Into<String>) -> StoreError {
    StoreError::AuthFailure(message.into())
}

pub fn transport_failure(message: impl Into<String>) -> StoreError {
    StoreError::TransportFailure(message.into())
}

pub fn query_decode_failure(message: impl Into<String>) -> StoreError {
    StoreError::QueryDecodeFailure(message.into())
}

pub fn decode_failure(message: impl Into<String>) -> StoreError {
    StoreError::DecodeFailure(message.into())
}
