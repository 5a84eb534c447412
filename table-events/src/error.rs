//! Error type for the event client.

use snafu::Snafu;

/// Represents errors raised by the table event client.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    /// The event server URL could not be parsed.
    #[snafu(display("Invalid event server URL '{url}': {source}"))]
    InvalidUrl {
        /// The URL as configured.
        url: String,
        /// The underlying parse error.
        source: url::ParseError,
    },

    /// The WebSocket handshake with the event server failed.
    #[snafu(display("Error connecting to {url}: {source}"))]
    Connect {
        /// The URL that was dialled.
        url: String,
        /// The underlying WebSocket error.
        source: tokio_tungstenite::tungstenite::Error,
    },

    /// A client message could not be serialized.
    #[snafu(display("Failed to encode client message: {source}"))]
    Encode {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// A server frame could not be parsed.
    #[snafu(display("Failed to decode server message '{line}': {source}"))]
    Decode {
        /// The offending line.
        line: String,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The connection to the event server is gone.
    #[snafu(display("Connection to the event server is closed"))]
    ConnectionClosed,

    /// Table ids must be non-empty.
    #[snafu(display("Invalid table id '{table_id}'"))]
    InvalidTableId {
        /// The rejected id.
        table_id: String,
    },
}

/// Type alias for results that return a `Result<T, Error>`, simplifying error handling.
pub type Result<T, E = Error> = std::result::Result<T, E>;
