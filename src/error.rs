//! Error types for eventwire.

use thiserror::Error;

/// Main error type for all eventwire operations.
#[derive(Debug, Error)]
pub enum RelayError {
    /// I/O error during socket operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connecting failed for a reason other than "connection refused".
    #[error("Connect error: {0}")]
    Connect(#[source] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// The event failed its own invariants.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The byte stream broke the framing contract.
    #[error("Protocol violation: {0}")]
    Protocol(#[from] ProtocolViolation),

    /// A consumer rejected an event that does not fit the model built so far.
    #[error("Integrity error: {0}")]
    Integrity(#[from] IntegrityError),

    /// Connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Outbound queue is full.
    #[error("Write queue full")]
    Backpressure,

    /// A spawned transport task panicked or was cancelled.
    #[error("Transport task failed: {0}")]
    TaskFailed(String),
}

/// An event does not satisfy its own invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// Fields are individually present but contradict each other.
    #[error("{0}")]
    Inconsistent(String),
}

/// Fatal breach of the length-prefixed framing contract.
///
/// None of these are retried; the connection is abandoned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// The stream ended partway through a length prefix.
    #[error("expected a 4-byte length prefix, got {received} byte(s)")]
    HeaderSizeMismatch { received: usize },

    /// The length prefix decoded to zero or a negative number.
    #[error("frame length must be positive, got {0}")]
    ZeroOrNegativeLength(i32),

    /// The length prefix exceeds the configured payload limit.
    #[error("frame length {length} exceeds maximum {max}")]
    PayloadTooLarge { length: usize, max: usize },

    /// The stream ended before the declared body was fully received.
    #[error("connection closed after {received} of {expected} body bytes")]
    PrematureClose { expected: usize, received: usize },
}

/// A consumer could not integrate an event into its model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    /// The event references a parent that has not been seen yet.
    #[error("test `{test_id}` references missing parent `{parent_id}`")]
    MissingParent { test_id: String, parent_id: String },
}

/// Result type alias using RelayError.
pub type Result<T> = std::result::Result<T, RelayError>;
