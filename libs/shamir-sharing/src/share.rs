//! The Shamir share type.

use cicada_field::{FieldArray, Shape};

/// One player's point on a degree-`threshold` polynomial whose constant term
/// is the secret. Any `threshold + 1` players can reconstruct it; any
/// `threshold` or fewer learn nothing.
#[derive(Clone)]
pub struct ShamirShare {
    value: FieldArray,
    threshold: u32,
}

impl ShamirShare {
    /// Wraps a raw field array as this player's share at the given
    /// threshold.
    pub fn from_local(value: FieldArray, threshold: u32) -> Self {
        Self { value, threshold }
    }

    /// This player's raw evaluation of the polynomial.
    pub fn value(&self) -> &FieldArray {
        &self.value
    }

    /// Consumes the share, returning its raw field array.
    pub fn into_value(self) -> FieldArray {
        self.value
    }

    /// The logical shape of the shared secret.
    pub fn shape(&self) -> &Shape {
        self.value.shape()
    }

    /// The reconstruction threshold `k`: `k + 1` shares are required to
    /// recover the secret.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
