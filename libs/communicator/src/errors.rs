//! Crate errors.

use thiserror::Error;

/// Errors a [`crate::Communicator`] operation can raise.
#[derive(Error, Debug)]
pub enum Error {
    /// A blocking operation exceeded its deadline. Recoverable: the caller
    /// may retry, `revoke`, or `shrink`.
    #[error("operation timed out")]
    Timeout,

    /// The initial address exchange failed to complete in time. Fatal for
    /// this communicator.
    #[error("bootstrap timed out")]
    BootstrapTimeout,

    /// An operation was attempted on a revoked communicator. Fatal for this
    /// communicator.
    #[error("communicator has been revoked")]
    Revoked,

    /// A peer process's exit was observed mid-operation. The caller may
    /// `shrink` and continue.
    #[error("peer {0} terminated")]
    Terminated(u32),

    /// A malformed frame, tag reuse, or rank mismatch was observed. Fatal
    /// for this communicator.
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// A TLS handshake failed, or a peer's certificate did not match its
    /// claimed rank. Fatal for this communicator.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A threshold/world-size constraint was violated at construction.
    /// Fatal, caller bug.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input's shape or domain was invalid. Fatal, caller bug.
    #[error("precondition violated: {0}")]
    PreconditionError(String),

    /// The communicator has already been freed.
    #[error("communicator has been freed")]
    Freed,

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, Error>;
