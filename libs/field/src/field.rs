//! The prime field itself: a modulus plus the operations that live over it.

use crate::{array::FieldArray, element::FieldElement, errors::PreconditionError, shape::Shape};
use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};
use rand_core::RngCore;
use std::sync::Arc;

/// The largest prime below `2^64`, used as the default field order.
///
/// `2^64 - 59 = 18446744073709551557` is prime.
fn default_modulus() -> BigUint {
    BigUint::from(18446744073709551557u128)
}

/// A prime field `Z/pZ` and the arithmetic that operates over it.
///
/// `Field` is cheap to clone (it's an `Arc` around an immutable modulus), so
/// suites and shares can each hold their own copy without worrying about
/// lifetimes.
#[derive(Clone, PartialEq, Eq)]
pub struct Field(Arc<FieldInner>);

struct FieldInner {
    modulus: BigUint,
    bits: u32,
    pos_bound: BigUint,
}

impl PartialEq for FieldInner {
    fn eq(&self, other: &Self) -> bool {
        self.modulus == other.modulus
    }
}
impl Eq for FieldInner {}

impl Default for Field {
    fn default() -> Self {
        Self::new(default_modulus()).expect("default modulus is valid")
    }
}

impl Field {
    /// Constructs a field with the given prime modulus.
    ///
    /// Primality is the caller's responsibility; this only rejects moduli
    /// too small to be useful.
    pub fn new(modulus: BigUint) -> Result<Self, PreconditionError> {
        if modulus < BigUint::from(2u32) {
            return Err(PreconditionError::InvalidModulus);
        }
        let bits = modulus.bits() as u32;
        let pos_bound = &modulus / 2u32;
        Ok(Self(Arc::new(FieldInner { modulus, bits, pos_bound })))
    }

    /// The modulus `p`.
    pub fn modulus(&self) -> &BigUint {
        &self.0.modulus
    }

    /// The bit width `b = ceil(log2 p)`.
    pub fn bits(&self) -> u32 {
        self.0.bits
    }

    /// `p // 2`, the boundary past which a value is interpreted as negative.
    pub fn pos_bound(&self) -> &BigUint {
        &self.0.pos_bound
    }

    fn reduce(&self, value: BigUint) -> BigUint {
        value % &self.0.modulus
    }

    /// Validates that a raw value lies in `[0, p)`.
    pub fn check(&self, value: &BigUint) -> Result<(), PreconditionError> {
        if value >= &self.0.modulus {
            return Err(PreconditionError::OutOfRange { value: value.to_string(), modulus: self.0.modulus.to_string() });
        }
        Ok(())
    }

    /// Constructs a field element from a non-negative raw value, reducing it
    /// modulo `p`.
    pub fn element(&self, value: impl Into<BigUint>) -> FieldElement {
        FieldElement::from_reduced(self.reduce(value.into()))
    }

    /// Constructs a field element from a signed value, wrapping negatives
    /// around `p` the way FixedPoint encoding expects.
    pub fn element_from_i64(&self, value: i64) -> FieldElement {
        if value >= 0 {
            self.element(value as u64)
        } else {
            let magnitude = BigUint::from((-value) as u64) % &self.0.modulus;
            FieldElement::from_reduced((&self.0.modulus - magnitude) % &self.0.modulus)
        }
    }

    /// Constructs a field element from a (possibly negative) big integer,
    /// wrapping it into `[0, p)` the way FixedPoint encoding expects on
    /// overflow: this never fails, it silently wraps.
    pub fn element_from_bigint(&self, value: &BigInt) -> FieldElement {
        let modulus = BigInt::from(self.0.modulus.clone());
        let mut reduced = value % &modulus;
        if reduced.sign() == num_bigint::Sign::Minus {
            reduced += &modulus;
        }
        FieldElement::from_reduced(reduced.to_biguint().expect("reduced value is non-negative"))
    }

    /// The signed value of an element: itself if `<= pos_bound`, otherwise
    /// itself minus `p`.
    pub fn signed_value(&self, value: &FieldElement) -> BigInt {
        if value.value() <= &self.0.pos_bound {
            BigInt::from(value.value().clone())
        } else {
            BigInt::from(value.value().clone()) - BigInt::from(self.0.modulus.clone())
        }
    }

    /// The zero element.
    pub fn zero(&self) -> FieldElement {
        FieldElement::from_reduced(BigUint::zero())
    }

    /// The one element.
    pub fn one(&self) -> FieldElement {
        FieldElement::from_reduced(BigUint::one())
    }

    fn broadcast_shape(&self, a: &FieldArray, b: &FieldArray) -> Result<Shape, PreconditionError> {
        a.shape()
            .broadcast(b.shape())
            .ok_or_else(|| PreconditionError::ShapeMismatch(a.shape().dims().to_vec(), b.shape().dims().to_vec()))
    }

    fn zip_elements<'a>(&self, a: &'a FieldArray, b: &'a FieldArray, shape: &Shape) -> Vec<(&'a FieldElement, &'a FieldElement)> {
        let n = shape.size();
        let a_values = a.values();
        let b_values = b.values();
        (0..n)
            .map(|i| {
                let av = if a.shape().is_scalar() { &a_values[0] } else { &a_values[i] };
                let bv = if b.shape().is_scalar() { &b_values[0] } else { &b_values[i] };
                (av, bv)
            })
            .collect()
    }

    /// Elementwise modular addition.
    pub fn add(&self, a: &FieldArray, b: &FieldArray) -> Result<FieldArray, PreconditionError> {
        let shape = self.broadcast_shape(a, b)?;
        let values = self
            .zip_elements(a, b, &shape)
            .into_iter()
            .map(|(x, y)| FieldElement::from_reduced(self.reduce(&x.0 + &y.0)))
            .collect();
        Ok(FieldArray::new(shape, values))
    }

    /// Elementwise modular subtraction.
    pub fn subtract(&self, a: &FieldArray, b: &FieldArray) -> Result<FieldArray, PreconditionError> {
        let shape = self.broadcast_shape(a, b)?;
        let modulus = &self.0.modulus;
        let values = self
            .zip_elements(a, b, &shape)
            .into_iter()
            .map(|(x, y)| {
                let diff = if x.0 >= y.0 { &x.0 - &y.0 } else { modulus - (&y.0 - &x.0) % modulus };
                FieldElement::from_reduced(diff % modulus)
            })
            .collect();
        Ok(FieldArray::new(shape, values))
    }

    /// Elementwise modular multiplication.
    pub fn multiply(&self, a: &FieldArray, b: &FieldArray) -> Result<FieldArray, PreconditionError> {
        let shape = self.broadcast_shape(a, b)?;
        let values = self
            .zip_elements(a, b, &shape)
            .into_iter()
            .map(|(x, y)| FieldElement::from_reduced(self.reduce(&x.0 * &y.0)))
            .collect();
        Ok(FieldArray::new(shape, values))
    }

    /// Elementwise modular negation.
    pub fn negative(&self, a: &FieldArray) -> FieldArray {
        let modulus = &self.0.modulus;
        let values = a
            .values()
            .iter()
            .map(|x| {
                if x.is_zero() {
                    FieldElement::from_reduced(BigUint::zero())
                } else {
                    FieldElement::from_reduced(modulus - &x.0)
                }
            })
            .collect();
        FieldArray::new(a.shape().clone(), values)
    }

    /// Adds `b` into `a` in place.
    pub fn in_place_add(&self, a: &mut FieldArray, b: &FieldArray) -> Result<(), PreconditionError> {
        *a = self.add(a, b)?;
        Ok(())
    }

    /// Subtracts `b` from `a` in place.
    pub fn in_place_subtract(&self, a: &mut FieldArray, b: &FieldArray) -> Result<(), PreconditionError> {
        *a = self.subtract(a, b)?;
        Ok(())
    }

    /// Reduces an array to a single field element via modular sum.
    pub fn sum(&self, a: &FieldArray) -> FieldElement {
        let total = a.values().iter().fold(BigUint::zero(), |acc, x| self.reduce(acc + &x.0));
        FieldElement::from_reduced(total)
    }

    /// The modular dot product `sum(a_i * b_i)`, without truncation.
    pub fn dot(&self, a: &FieldArray, b: &FieldArray) -> Result<FieldElement, PreconditionError> {
        if a.len() != b.len() {
            return Err(PreconditionError::ShapeMismatch(a.shape().dims().to_vec(), b.shape().dims().to_vec()));
        }
        let total = a
            .values()
            .iter()
            .zip(b.values().iter())
            .fold(BigUint::zero(), |acc, (x, y)| self.reduce(acc + &x.0 * &y.0));
        Ok(FieldElement::from_reduced(total))
    }

    /// Modular exponentiation by squaring.
    pub fn pow_mod(&self, base: &FieldElement, exponent: &BigUint) -> FieldElement {
        FieldElement::from_reduced(base.0.modpow(exponent, &self.0.modulus))
    }

    /// The multiplicative inverse of a nonzero element, via Fermat's little
    /// theorem (`a^(p-2) mod p`, valid because `p` is prime).
    pub fn inv_mod(&self, value: &FieldElement) -> Result<FieldElement, PreconditionError> {
        if value.is_zero() {
            return Err(PreconditionError::NotInvertible);
        }
        let exponent = &self.0.modulus - BigUint::from(2u32);
        Ok(self.pow_mod(value, &exponent))
    }

    /// An array of ones.
    pub fn ones(&self, shape: Shape) -> FieldArray {
        self.full(shape, self.one())
    }

    /// An array of zeros.
    pub fn zeros(&self, shape: Shape) -> FieldArray {
        self.full(shape, self.zero())
    }

    /// An array filled with a single repeated value.
    pub fn full(&self, shape: Shape, value: FieldElement) -> FieldArray {
        let n = shape.size();
        FieldArray::new(shape, vec![value; n])
    }

    /// Draws `shape.size()` elements uniformly from `[0, p)` via rejection
    /// sampling against the generator's raw bitstream.
    pub fn uniform<R: RngCore>(&self, shape: Shape, rng: &mut R) -> FieldArray {
        let n = shape.size();
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            values.push(FieldElement::from_reduced(self.sample_uniform(rng)));
        }
        FieldArray::new(shape, values)
    }

    fn sample_uniform<R: RngCore>(&self, rng: &mut R) -> BigUint {
        let byte_len = (self.0.bits as usize).div_ceil(8);
        let top_bits = self.0.bits as usize % 8;
        let mask: u8 = if top_bits == 0 { 0xff } else { (1u8 << top_bits) - 1 };
        loop {
            let mut bytes = vec![0u8; byte_len];
            rng.fill_bytes(&mut bytes);
            if let Some(last) = bytes.last_mut() {
                *last &= mask;
            }
            let candidate = BigUint::from_bytes_le(&bytes);
            if candidate < self.0.modulus {
                return candidate;
            }
        }
    }

    /// Draws `shape.size()` elements uniformly from `[0, 2^bits)` without
    /// rejection sampling, for use when power-of-two masking suffices (e.g.
    /// PRZS noise ahead of a reveal, where a small bias toward the low end
    /// of the field is tolerable).
    pub fn uniform_pow2<R: RngCore>(&self, shape: Shape, rng: &mut R) -> FieldArray {
        let n = shape.size();
        let byte_len = (self.0.bits as usize).div_ceil(8);
        let top_bits = self.0.bits as usize % 8;
        let mask: u8 = if top_bits == 0 { 0xff } else { (1u8 << top_bits) - 1 };
        let mut values = Vec::with_capacity(n);
        for _ in 0..n {
            let mut bytes = vec![0u8; byte_len];
            rng.fill_bytes(&mut bytes);
            if let Some(last) = bytes.last_mut() {
                *last &= mask;
            }
            let candidate = self.reduce(BigUint::from_bytes_le(&bytes));
            values.push(FieldElement::from_reduced(candidate));
        }
        FieldArray::new(shape, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use rstest::rstest;

    fn small_field() -> Field {
        Field::new(BigUint::from(251u32)).unwrap()
    }

    #[test]
    fn add_wraps_around_modulus() {
        let field = small_field();
        let a = FieldArray::scalar(field.element(250u32));
        let b = FieldArray::scalar(field.element(5u32));
        let sum = field.add(&a, &b).unwrap();
        assert_eq!(sum.as_scalar().unwrap().value(), &BigUint::from(4u32));
    }

    #[test]
    fn subtract_wraps_around_modulus() {
        let field = small_field();
        let a = FieldArray::scalar(field.element(2u32));
        let b = FieldArray::scalar(field.element(5u32));
        let diff = field.subtract(&a, &b).unwrap();
        assert_eq!(diff.as_scalar().unwrap().value(), &BigUint::from(248u32));
    }

    #[test]
    fn negative_and_add_is_zero() {
        let field = small_field();
        let a = FieldArray::scalar(field.element(77u32));
        let neg = field.negative(&a);
        let sum = field.add(&a, &neg).unwrap();
        assert!(sum.as_scalar().unwrap().is_zero());
    }

    #[rstest]
    #[case(3, 4, 12)]
    #[case(0, 9, 0)]
    fn multiply_matches_expectation(#[case] a: u32, #[case] b: u32, #[case] expected: u32) {
        let field = small_field();
        let av = FieldArray::scalar(field.element(a));
        let bv = FieldArray::scalar(field.element(b));
        let product = field.multiply(&av, &bv).unwrap();
        assert_eq!(product.as_scalar().unwrap().value(), &BigUint::from(expected));
    }

    #[test]
    fn dot_product_sums_correctly() {
        let field = small_field();
        let a = FieldArray::new(Shape::vector(3), vec![field.element(1u32), field.element(2u32), field.element(3u32)]);
        let b = FieldArray::new(Shape::vector(3), vec![field.element(4u32), field.element(5u32), field.element(6u32)]);
        let dot = field.dot(&a, &b).unwrap();
        assert_eq!(dot.value(), &BigUint::from(32u32));
    }

    #[test]
    fn inverse_round_trips() {
        let field = small_field();
        let value = field.element(42u32);
        let inv = field.inv_mod(&value).unwrap();
        let product = field.multiply(&FieldArray::scalar(value), &FieldArray::scalar(inv)).unwrap();
        assert!(product.as_scalar().unwrap().value() == &BigUint::from(1u32));
    }

    #[test]
    fn zero_has_no_inverse() {
        let field = small_field();
        assert!(field.inv_mod(&field.zero()).is_err());
    }

    #[test]
    fn uniform_samples_stay_in_range() {
        let field = Field::default();
        let mut rng = StdRng::seed_from_u64(7);
        let array = field.uniform(Shape::vector(32), &mut rng);
        for value in array.values() {
            assert!(field.check(value.value()).is_ok());
        }
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let field = small_field();
        let a = FieldArray::new(Shape::vector(2), vec![field.element(1u32), field.element(2u32)]);
        let b = FieldArray::new(Shape::vector(3), vec![field.element(1u32), field.element(2u32), field.element(3u32)]);
        assert!(field.add(&a, &b).is_err());
    }

    #[test]
    fn default_modulus_is_largest_prime_below_2_64() {
        let field = Field::default();
        assert_eq!(field.modulus(), &BigUint::from(18446744073709551557u128));
    }
}
