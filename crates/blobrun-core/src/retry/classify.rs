//! Classify remote failures (markers, status codes) into retry failure classes.

use super::error::RemoteFailure;
use super::policy::FailureClass;

/// Message fragments (lowercase) that mark a failure as a transient network
/// or contention problem, regardless of any status code.
const TRANSIENT_MARKERS: &[&str] = &[
    "connection refused",
    "econnrefused",
    "connection reset",
    "econnreset",
    "timeout",
    "timed out",
    "network error",
    // Shared-object contention while a previous transaction settles.
    // A bare "version" or "429" would also match unrelated text (version
    // mismatches, sizes, ids); a real 429 is classified by its status code.
    "not available for consumption",
    "equivocation",
];

/// Classify a status code alone. `None` when the code says nothing about
/// retrying (e.g. 2xx/3xx).
pub fn classify_status(code: u16) -> Option<FailureClass> {
    match code {
        429 => Some(FailureClass::RateLimited),
        500..=599 => Some(FailureClass::ServerTransient),
        400..=499 => Some(FailureClass::ClientFatal),
        _ => None,
    }
}

/// True if the message carries one of the transient markers.
pub fn has_transient_marker(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|m| message.contains(m))
}

/// Classify a failed attempt.
///
/// Priority: transient markers, then status code, then `Unknown`.
pub fn classify<E: RemoteFailure + ?Sized>(error: &E) -> FailureClass {
    if error.is_marked_retryable() || has_transient_marker(&error.message()) {
        return FailureClass::NetworkTransient;
    }
    error
        .status_code()
        .and_then(classify_status)
        .unwrap_or(FailureClass::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::OperationError;

    #[test]
    fn status_429_rate_limited() {
        assert_eq!(
            classify(&OperationError::with_status("slow down", 429)),
            FailureClass::RateLimited
        );
    }

    #[test]
    fn status_5xx_server_transient() {
        assert_eq!(
            classify(&OperationError::with_status("Service Unavailable", 503)),
            FailureClass::ServerTransient
        );
        assert_eq!(classify_status(500), Some(FailureClass::ServerTransient));
        assert_eq!(classify_status(599), Some(FailureClass::ServerTransient));
    }

    #[test]
    fn status_4xx_client_fatal() {
        assert_eq!(
            classify(&OperationError::with_status("not found", 404)),
            FailureClass::ClientFatal
        );
        assert_eq!(classify_status(403), Some(FailureClass::ClientFatal));
        assert_eq!(classify_status(302), None);
    }

    #[test]
    fn transient_marker_beats_status_code() {
        let e = OperationError::with_status("upstream timeout while reading", 400);
        assert_eq!(classify(&e), FailureClass::NetworkTransient);
        let e = OperationError::new("Network Error: Connection refused");
        assert_eq!(classify(&e), FailureClass::NetworkTransient);
        let e = OperationError::new("read ECONNRESET");
        assert_eq!(classify(&e), FailureClass::NetworkTransient);
    }

    #[test]
    fn explicit_retryable_marker() {
        assert_eq!(
            classify(&OperationError::retryable("not enough confirmations")),
            FailureClass::NetworkTransient
        );
    }

    #[test]
    fn contention_messages_are_transient() {
        let e = OperationError::new("object 0x2a is not available for consumption");
        assert_eq!(classify(&e), FailureClass::NetworkTransient);
    }

    #[test]
    fn rate_limit_needs_a_status_code() {
        let e = OperationError::new("429 Too Many Requests");
        assert_eq!(classify(&e), FailureClass::Unknown);
        assert!(FailureClass::Unknown.is_retryable());
        let e = OperationError::with_status("Too Many Requests", 429);
        assert_eq!(classify(&e), FailureClass::RateLimited);
    }

    #[test]
    fn version_or_number_in_message_is_not_a_marker() {
        assert!(!has_transient_marker("unsupported protocol Version 3"));
        assert!(!has_transient_marker("blob of 4290 bytes rejected"));
        let e = OperationError::with_status("unsupported protocol Version 3", 400);
        assert_eq!(classify(&e), FailureClass::ClientFatal);
        assert!(has_transient_marker("Object 0x5 version 12 is not available for consumption"));
    }

    #[test]
    fn unrecognized_is_unknown() {
        assert_eq!(
            classify(&OperationError::new("something odd")),
            FailureClass::Unknown
        );
        assert_eq!(
            classify(&OperationError::with_status("moved", 301)),
            FailureClass::Unknown
        );
    }

    #[test]
    fn io_errors() {
        let e = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline");
        assert_eq!(classify(&e), FailureClass::NetworkTransient);
        let e = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(classify(&e), FailureClass::Unknown);
    }
}
