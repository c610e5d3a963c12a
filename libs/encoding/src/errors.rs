//! Crate errors.

use thiserror::Error;

/// An encoding operation could not complete.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// A `Bits`/`Boolean` encode call received a value other than `0`/`1` or
    /// `false`/`true`.
    #[error("value {0} is not a valid bit")]
    InvalidBit(String),

    /// Two operands had incompatible shapes.
    #[error("shapes {0:?} and {1:?} are not compatible")]
    ShapeMismatch(Vec<usize>, Vec<usize>),
}
