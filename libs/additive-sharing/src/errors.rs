//! Crate errors.

use thiserror::Error;

/// Errors an [`crate::AdditiveSuite`] operation can raise.
#[derive(Debug, Error)]
pub enum Error {
    /// A communicator call failed.
    #[error(transparent)]
    Communicator(#[from] cicada_communicator::Error),

    /// A field operation rejected its inputs.
    #[error(transparent)]
    Field(#[from] cicada_field::PreconditionError),

    /// An encode/decode call rejected its inputs.
    #[error(transparent)]
    Encoding(#[from] cicada_encoding::EncodingError),

    /// PRZS setup or sampling failed.
    #[error(transparent)]
    Przs(#[from] cicada_przs::Error),

    /// A peer sent a malformed wire payload.
    #[error("malformed wire payload: {0}")]
    Protocol(String),

    /// An input violated an operation's precondition.
    #[error("precondition violated: {0}")]
    Precondition(String),
}
