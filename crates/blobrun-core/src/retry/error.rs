//! Remote operation error type and the capability used for retry classification.

use std::borrow::Cow;
use std::fmt;

/// What the retry engine needs to know about a failure in order to classify it.
///
/// Any error returned by a remote operation must expose at least a message;
/// the status code and the explicit retryable marker are optional.
pub trait RemoteFailure: fmt::Debug {
    /// Human-readable failure text, matched against transient markers.
    fn message(&self) -> Cow<'_, str>;

    /// Numeric status code (HTTP-like), if the failure carries one.
    fn status_code(&self) -> Option<u16> {
        None
    }

    /// True when the remote side explicitly tagged this failure as retryable.
    fn is_marked_retryable(&self) -> bool {
        false
    }
}

/// Error returned by a remote operation (storage node, aggregator, publisher).
///
/// The retry engine hands this back unchanged once it gives up, so the
/// message and status code stay available for reporting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", display_error(.message, .status))]
pub struct OperationError {
    pub message: String,
    pub status: Option<u16>,
    pub retryable: bool,
}

fn display_error(message: &str, status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("{} (status {})", message, code),
        None => message.to_string(),
    }
}

impl OperationError {
    /// Failure with only a message (no status code).
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            retryable: false,
        }
    }

    /// Failure carrying a status code.
    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        Self {
            message: message.into(),
            status: Some(status),
            retryable: false,
        }
    }

    /// Failure the remote side marked as retryable.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            retryable: true,
        }
    }
}

impl RemoteFailure for OperationError {
    fn message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn status_code(&self) -> Option<u16> {
        self.status
    }

    fn is_marked_retryable(&self) -> bool {
        self.retryable
    }
}

impl RemoteFailure for std::io::Error {
    fn message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    /// Socket-level kinds count as an explicit transient marker.
    fn is_marked_retryable(&self) -> bool {
        use std::io::ErrorKind;
        matches!(
            self.kind(),
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionReset
                | ErrorKind::ConnectionAborted
                | ErrorKind::TimedOut
                | ErrorKind::BrokenPipe
                | ErrorKind::NotConnected
        )
    }
}
