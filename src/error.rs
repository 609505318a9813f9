//! Error types for GPSD client operations
//!
//! One enum covers the whole taxonomy: transport failures, malformed or
//! unrecognized wire lines, and endpoint lifecycle misuse. A synchronous
//! command that gets no matching reply is *not* an error; the endpoint
//! reports it as `None` (see `GpsdEndpoint::issue_sync`).

use thiserror::Error;

/// Main error type for GPSD client operations
#[derive(Debug, Error)]
pub enum GpsdClientError {
    /// I/O error on the established connection
    ///
    /// Read failures terminate the reader loop and hand control to the
    /// reconnection logic; write failures surface from fire-and-forget
    /// command issuance.
    #[error("transport I/O error: {0}")]
    Io(#[source] std::io::Error),

    /// A line was not a well-formed JSON object
    #[error("malformed JSON line: {0}")]
    Serde(#[from] serde_json::Error),

    /// A line carried a `class` discriminator this client does not recognize
    ///
    /// The raw line is preserved so callers can log exactly what the daemon
    /// sent; no partially-populated message is ever produced.
    #[error("unrecognized message class `{class}` in line: {line}")]
    UnknownKind {
        /// The unrecognized `class` value
        class: String,
        /// The full wire line
        line: String,
    },

    /// A JSON object arrived without a `class` discriminator
    #[error("line carries no `class` discriminator: {0}")]
    MissingClass(String),

    /// The initial connection to the daemon could not be opened
    ///
    /// This is the one failure mode that is not retried automatically:
    /// reconnection begins only after a connection has once succeeded.
    #[error("could not connect to gpsd: {0}")]
    Connection(#[source] std::io::Error),

    /// A command was issued on an endpoint with no live connection
    #[error("endpoint is not connected")]
    NotConnected,

    /// `start` was called on an endpoint that is already running
    #[error("endpoint already started")]
    AlreadyRunning,
}
