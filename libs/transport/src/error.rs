//! Transport error taxonomy.

use thiserror::Error;

/// What went wrong on a session, split by who is at fault.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The peer violated the framing or encapsulation protocol. Recoverable
    /// at session granularity: report it and tear the session down.
    #[error("protocol error: {0}")]
    Peer(String),

    /// The session API was used incorrectly by in-process code. Must never
    /// be producible by peer input; the worker that hits one is failed
    /// fast.
    #[error("transport misuse: {0}")]
    Misuse(String),

    /// The underlying stream failed. Handled like a peer error: the session
    /// is closed, nothing else is affected.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl TransportError {
    pub fn peer(message: impl Into<String>) -> Self {
        Self::Peer(message.into())
    }

    pub fn misuse(message: impl Into<String>) -> Self {
        Self::Misuse(message.into())
    }

    /// True for errors the session recovers from by closing: peer protocol
    /// violations and stream failures.
    pub fn is_session_error(&self) -> bool {
        matches!(self, Self::Peer(_) | Self::Io(_))
    }

    pub fn is_misuse(&self) -> bool {
        matches!(self, Self::Misuse(_))
    }
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;
