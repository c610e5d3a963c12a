//! Dense arrays of field elements.

use crate::{element::FieldElement, shape::Shape};

/// A dense, row-major array of field elements carrying its logical shape.
///
/// Flat `Vec` plus an explicit shape, rather than a dependency on an ndarray
/// crate.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldArray {
    shape: Shape,
    values: Vec<FieldElement>,
}

impl FieldArray {
    /// Constructs an array from a shape and its flattened values.
    ///
    /// Panics if `values.len()` does not match `shape.size()`; this is an
    /// internal invariant enforced by every constructor in this crate, not a
    /// user-facing precondition.
    pub(crate) fn new(shape: Shape, values: Vec<FieldElement>) -> Self {
        assert_eq!(values.len(), shape.size(), "field array value count must match its shape");
        Self { shape, values }
    }

    /// A single-element array (a scalar).
    pub fn scalar(value: FieldElement) -> Self {
        Self::new(Shape::scalar(), vec![value])
    }

    /// Constructs an array from a shape and its flattened values, checking
    /// that the lengths agree.
    pub fn from_values(shape: Shape, values: Vec<FieldElement>) -> Result<Self, crate::PreconditionError> {
        if values.len() != shape.size() {
            return Err(crate::PreconditionError::ShapeMismatch(shape.dims().to_vec(), vec![values.len()]));
        }
        Ok(Self { shape, values })
    }

    /// The logical shape of this array.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// The flattened values backing this array.
    pub fn values(&self) -> &[FieldElement] {
        &self.values
    }

    /// Consumes the array, returning its flattened values.
    pub fn into_values(self) -> Vec<FieldElement> {
        self.values
    }

    /// The element at `index` if this is a scalar array.
    pub fn as_scalar(&self) -> Option<&FieldElement> {
        if self.shape.is_scalar() { self.values.first() } else { None }
    }

    /// The number of elements in this array.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether this array holds no elements.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl IntoIterator for FieldArray {
    type Item = FieldElement;
    type IntoIter = std::vec::IntoIter<FieldElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}
