//! Error types for the streaming engine.

use streamhub_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client collaborator calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for feed operations.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors returned by bootstrap and stream clients.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network or transport error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The server rejected the request.
    #[error("server error: {0}")]
    Server(String),
}

impl ClientError {
    /// Creates a transport error.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// Errors surfaced to the consumer of a live feed.
///
/// `Bootstrap` and `Stream` are terminal: the updater that reported one
/// issues no further requests.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// The initial bootstrap request failed.
    #[error("bootstrap failed: {source}")]
    Bootstrap {
        /// Underlying client error.
        #[source]
        source: ClientError,
    },

    /// A stream request failed.
    #[error("stream request failed: {source}")]
    Stream {
        /// Underlying client error.
        #[source]
        source: ClientError,
    },

    /// Configuration rejected before the feed started.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Collection identity rejected before the feed started.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl FeedError {
    /// Returns true for errors that stop the feed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, FeedError::Bootstrap { .. } | FeedError::Stream { .. })
    }
}
