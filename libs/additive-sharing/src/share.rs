//! The additive share type.

use cicada_field::{FieldArray, Shape};

/// One player's additive share of a secret array: an opaque field array that
/// carries no information about the secret on its own. Summing every
/// player's share (mod `p`) recovers the plaintext.
#[derive(Clone)]
pub struct AdditiveShare {
    value: FieldArray,
}

impl AdditiveShare {
    /// Wraps a raw field array as this player's share, with no validation
    /// beyond what `FieldArray` itself already guarantees.
    pub fn from_local(value: FieldArray) -> Self {
        Self { value }
    }

    /// This player's raw share value.
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
}
