//! Error types for rinnai-bridge.

use thiserror::Error;

/// Main error type for all bridge operations.
///
/// Every failure is scoped to one exchange or one command; none of these
/// are fatal to the process.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Frame input could not be consumed (short, non-hex or non-ASCII).
    #[error("Malformed frame: {0}")]
    MalformedFrame(&'static str),

    /// Transmitted checksum differs from the one computed over the payload.
    #[error("Checksum mismatch: computed {expected:#04x}, received {actual:#04x}")]
    ChecksumMismatch { expected: u8, actual: u8 },

    /// Tail byte was not 0x7d.
    #[error("Bad frame tail: {0:#04x}")]
    BadTail(u8),

    /// Characters remained after the tail byte.
    #[error("Trailing data after frame: {0} characters")]
    TrailingData(usize),

    /// Frame prefix must be exactly 6 characters.
    #[error("Invalid prefix length: {0} (expected 6)")]
    InvalidPrefixLength(usize),

    /// Payload does not fit the one-byte length field.
    #[error("Payload too long: {0} characters (max 255)")]
    PayloadTooLong(usize),

    /// Status payload shorter than the fixed layout.
    #[error("Truncated status payload: {actual} of {expected} characters")]
    TruncatedStatus { expected: usize, actual: usize },

    /// Status payload longer than the fixed layout.
    #[error("Trailing status data: {actual} characters, layout is {expected}")]
    TrailingStatus { expected: usize, actual: usize },

    /// A status field value cannot be decoded or represented.
    #[error("Status field out of range: {field}")]
    OutOfRange { field: &'static str },

    /// A fixed-width status field was resized.
    #[error("Field {field} must be {expected} characters, got {actual}")]
    FieldWidth {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Status report frame carried an undecodable payload.
    #[error("Invalid status report: {0}")]
    InvalidReport(#[source] Box<BridgeError>),

    /// Frame tag or command code is not one this bridge answers.
    #[error("Unexpected frame {prefix} with command {command:#04x}")]
    UnexpectedFrame { prefix: String, command: u8 },

    /// The appliance has not reported recently; commands are refused.
    #[error("Appliance unreachable")]
    ApplianceUnreachable,

    /// No exchange drained the command before its deadline.
    #[error("Command timed out")]
    CommandTimeout,

    /// Requested temperature outside the accepted range.
    #[error("Invalid temperature {value} (allowed {min}..={max})")]
    InvalidTemperature { value: i64, min: u8, max: u8 },

    /// Unknown HVAC mode name.
    #[error("Invalid mode: {0}")]
    InvalidMode(String),

    /// The bridge owning the command queue was dropped.
    #[error("Bridge closed")]
    BridgeClosed,

    /// JSON serialization error (read model only).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias using BridgeError.
pub type Result<T> = std::result::Result<T, BridgeError>;
