//! Array shapes carried alongside shares and field arrays.

use std::fmt;

/// The shape of a dense array, as a list of dimension sizes.
///
/// An empty shape (`Shape::scalar()`) represents a single value. Shapes
/// broadcast against each other the way a host ndarray library would: a
/// scalar broadcasts against any shape, and two equal shapes match directly.
/// Full elementwise-broadcast across mismatched ranks is intentionally not
/// supported here (see DESIGN.md) -- callers needing richer broadcasting
/// should reshape explicitly first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shape(Vec<usize>);

impl Shape {
    /// Constructs a shape from explicit dimensions.
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    /// The shape of a single scalar value.
    pub fn scalar() -> Self {
        Self(Vec::new())
    }

    /// The shape of a flat vector of the given length.
    pub fn vector(len: usize) -> Self {
        Self(vec![len])
    }

    /// Whether this is the scalar shape.
    pub fn is_scalar(&self) -> bool {
        self.0.is_empty()
    }

    /// The dimensions of this shape.
    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    /// The total number of elements this shape describes.
    pub fn size(&self) -> usize {
        self.0.iter().product::<usize>().max(if self.is_scalar() { 1 } else { 0 })
    }

    /// Computes the broadcast result of two shapes, if compatible.
    ///
    /// A scalar broadcasts against anything; otherwise the shapes must be
    /// identical.
    pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
        if self.is_scalar() {
            Some(other.clone())
        } else if other.is_scalar() {
            Some(self.clone())
        } else if self == other {
            Some(self.clone())
        } else {
            None
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_broadcasts_with_anything() {
        let scalar = Shape::scalar();
        let vector = Shape::vector(4);
        assert_eq!(scalar.broadcast(&vector), Some(vector.clone()));
        assert_eq!(vector.broadcast(&scalar), Some(vector));
    }

    #[test]
    fn mismatched_shapes_do_not_broadcast() {
        assert_eq!(Shape::vector(3).broadcast(&Shape::vector(4)), None);
    }

    #[test]
    fn size_of_scalar_is_one() {
        assert_eq!(Shape::scalar().size(), 1);
        assert_eq!(Shape::vector(5).size(), 5);
    }
}
