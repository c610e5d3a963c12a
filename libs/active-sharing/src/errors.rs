//! Crate errors.

use thiserror::Error;

/// Errors an [`crate::ActiveSuite`] operation can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// The additive half of a paired operation failed.
    #[error("additive share error: {0}")]
    Additive(#[from] cicada_additive_sharing::Error),

    /// The Shamir half of a paired operation failed.
    #[error("shamir share error: {0}")]
    Shamir(#[from] cicada_shamir_sharing::Error),

    /// A communicator call failed.
    #[error(transparent)]
    Communicator(#[from] cicada_communicator::Error),

    /// A field operation rejected its inputs.
    #[error(transparent)]
    Field(#[from] cicada_field::PreconditionError),

    /// An input violated an operation's precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),

    /// The additive and Shamir openings of a share disagreed: at least one
    /// player deviated from the protocol.
    #[error("tamper detected: additive and shamir openings disagree")]
    Tampered,
}
