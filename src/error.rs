use std::time::Duration;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Failure reported by a custom [`Transport`](crate::Transport) implementation.
    #[error("transport error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
    /// The request body could not be drained before the first attempt.
    #[error("body read error: {0}")]
    BodyRead(reqwest::Error),
    /// The bound transport cannot be wrapped by a strict retry plugin.
    #[error("retry: transport does not support retries")]
    TransportUnsupported,
    /// The client-wide deadline elapsed before a terminal outcome.
    #[error("request deadline of {0:?} exceeded")]
    Timeout(Duration),
    /// The retrier returned without running a single attempt.
    #[error("retry driver finished without attempting the request")]
    NoAttempt,
}

impl Error {
    /// Wraps an arbitrary error raised by a custom transport.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Other(err.into())
    }

    /// Returns `true` when the error came from the network layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Other(_))
    }
}
