//! Crate errors.

use thiserror::Error;

/// A precondition was violated: some value used as an input was outside the
/// field's valid range, or two operands had incompatible shapes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreconditionError {
    /// A value fed into an operation was not in `[0, p)`.
    #[error("value {value} is out of range for field order {modulus}")]
    OutOfRange {
        /// The offending value, rendered as a decimal string.
        value: String,
        /// The field's modulus, rendered as a decimal string.
        modulus: String,
    },

    /// Two array operands did not have compatible shapes.
    #[error("shapes {0:?} and {1:?} are not broadcast-compatible")]
    ShapeMismatch(Vec<usize>, Vec<usize>),

    /// An inverse was requested for a value with none (zero).
    #[error("value has no multiplicative inverse")]
    NotInvertible,

    /// The requested field modulus is not usable (too small).
    #[error("invalid field modulus")]
    InvalidModulus,
}
