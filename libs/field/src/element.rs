//! A single element of a prime field.

use num_bigint::BigUint;
use std::fmt;

/// A value in `[0, p)` for some field `p` known to the caller.
///
/// `FieldElement` does not carry its own modulus -- callers always operate on
/// it through a [`crate::Field`], which is the single source of truth for
/// `p`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldElement(pub(crate) BigUint);

impl FieldElement {
    /// Constructs a field element from an already-reduced value.
    ///
    /// Only [`crate::Field`] should call this directly; it does not itself
    /// reduce modulo `p`.
    pub(crate) fn from_reduced(value: BigUint) -> Self {
        Self(value)
    }

    /// The raw value in `[0, p)`, as an unsigned big integer.
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Whether this element is zero.
    pub fn is_zero(&self) -> bool {
        self.0 == BigUint::from(0u32)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.0)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
