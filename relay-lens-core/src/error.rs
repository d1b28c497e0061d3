//! Error types for relay-lens-core

use thiserror::Error;

/// Result type alias for relay-lens-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
///
/// Only precondition failures and write-path failures surface here. Relay
/// outages and malformed payloads on the read path are absorbed by the
/// query executor and the assembler.
#[derive(Error, Debug)]
pub enum Error {
    /// JSON parsing error
    #[error("JSON parsing failed: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be loaded or is inconsistent
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Public key could not be parsed
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    /// Relay address could not be normalized
    #[error("Invalid relay URL: {0}")]
    InvalidRelayUrl(String),

    /// Caller supplied an argument outside the accepted range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Validation error
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// No signing capability was configured
    #[error("No signing capability available")]
    SignerUnavailable,

    /// Signing capability refused or failed
    #[error("Signing failed: {0}")]
    Signer(#[from] SignerError),

    /// Every relay failed to acknowledge a broadcast
    #[error("Broadcast failed: none of {attempted} relays acknowledged the event")]
    BroadcastFailed { attempted: usize },
}

/// Validation-specific errors for signed events
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    /// A required authenticity field is absent
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Event ID does not match computed hash
    #[error("Event ID mismatch: expected {expected}, got {actual}")]
    EventIdMismatch { expected: String, actual: String },

    /// Event was signed by a different key than requested
    #[error("Pubkey mismatch: expected {expected}, got {actual}")]
    PubkeyMismatch { expected: String, actual: String },

    /// Invalid hex encoding
    #[error("Invalid hex encoding: {0}")]
    InvalidHex(String),
}

/// Failures of a single relay round-trip
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not open a connection
    #[error("connection to {relay} failed: {reason}")]
    Connect { relay: String, reason: String },

    /// Call exceeded its deadline
    #[error("timed out")]
    Timeout,

    /// Relay closed the connection before answering
    #[error("connection closed by relay")]
    Closed,

    /// Relay answered with CLOSED or a negative OK
    #[error("relay rejected the request: {0}")]
    Rejected(String),

    /// Relay sent something that is not a protocol message
    #[error("protocol error: {0}")]
    Protocol(String),

    /// WebSocket layer failure
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Frame could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors returned by the external signing capability
#[derive(Error, Debug)]
pub enum SignerError {
    /// The signer cannot be reached or has no key
    #[error("signer unavailable: {0}")]
    Unavailable(String),

    /// The signer refused the event
    #[error("signer rejected the event: {0}")]
    Rejected(String),
}

/// Reasons a typed record could not be decoded from an event
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DecodeError {
    /// Decoder was handed an event of another kind
    #[error("expected kind {expected}, got {actual}")]
    UnexpectedKind { expected: u16, actual: u16 },

    /// Event content is not the structured payload the kind requires
    #[error("malformed content: {0}")]
    MalformedContent(String),

    /// A tag the kind requires is absent
    #[error("missing `{0}` tag")]
    MissingTag(&'static str),

    /// Event author is absent or not a valid public key
    #[error("missing or invalid author")]
    InvalidAuthor,
}

impl From<nostr_sdk::key::Error> for Error {
    fn from(err: nostr_sdk::key::Error) -> Self {
        Error::InvalidIdentity(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}
