//! Bijections-with-error between real/boolean/bit arrays and field elements.
//!
//! Four encodings: [`Encoding::FixedPoint`] for real numbers,
//! [`Encoding::Bits`] and [`Encoding::Boolean`] for `{0,1}`-valued data, and
//! [`Encoding::Identity`] for revealing raw field values.

mod errors;

pub use errors::EncodingError;

use cicada_field::{Field, FieldArray, FieldElement, Shape};
use num_bigint::BigInt;
use num_traits::cast::ToPrimitive;

/// How a real/boolean/bit array maps to and from field elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// `encode(x) = floor(x * 2^precision) mod p`; `decode` treats the upper
    /// half of the field as negative.
    FixedPoint {
        /// Number of fractional bits retained.
        precision: u32,
    },
    /// Identity on `{0, 1}`; decodes to an integer `0` or `1`.
    Bits,
    /// `encode(false) = 0`, `encode(true) = 1`.
    Boolean,
    /// Pass-through: the field element *is* the value, used when revealing
    /// raw field values rather than an encoded real/bit/bool.
    Identity,
}

impl Encoding {
    /// The fixed-point encoding with the given fractional precision.
    pub fn fixed_point(precision: u32) -> Self {
        Self::FixedPoint { precision }
    }

    /// Encodes a single real number (meaningful for `FixedPoint`; other
    /// variants treat the input as already an integer-valued real).
    pub fn encode_real(&self, field: &Field, value: f64) -> FieldElement {
        match self {
            Encoding::FixedPoint { precision } => {
                let scale = 2f64.powi(*precision as i32);
                let scaled = (value * scale).floor();
                let as_bigint = bigint_from_f64(scaled);
                field.element_from_bigint(&as_bigint)
            }
            Encoding::Bits | Encoding::Boolean => {
                let rounded = value.round();
                field.element_from_bigint(&bigint_from_f64(rounded))
            }
            Encoding::Identity => field.element_from_bigint(&bigint_from_f64(value)),
        }
    }

    /// Decodes a single field element back to a real number.
    ///
    /// Error is bounded by `2^-precision` for `FixedPoint`; exact for the
    /// other variants.
    pub fn decode_real(&self, field: &Field, value: &FieldElement) -> f64 {
        let signed = field.signed_value(value);
        match self {
            Encoding::FixedPoint { precision } => {
                let scale = 2f64.powi(*precision as i32);
                bigint_to_f64(&signed) / scale
            }
            Encoding::Bits | Encoding::Boolean | Encoding::Identity => bigint_to_f64(&signed),
        }
    }

    /// Encodes an array of real numbers elementwise.
    pub fn encode(&self, field: &Field, shape: Shape, values: &[f64]) -> Result<FieldArray, EncodingError> {
        if values.len() != shape.size() {
            return Err(EncodingError::ShapeMismatch(shape.dims().to_vec(), vec![values.len()]));
        }
        let encoded = values.iter().map(|v| self.encode_real(field, *v)).collect::<Vec<_>>();
        Ok(array_from_parts(shape, encoded))
    }

    /// Decodes an array of field elements elementwise.
    pub fn decode(&self, field: &Field, array: &FieldArray) -> Vec<f64> {
        array.values().iter().map(|v| self.decode_real(field, v)).collect()
    }

    /// Encodes a single bit (`0` or `1`). Returns an error for `Boolean`
    /// (use [`Encoding::encode_bool`] there) unless the encoding is `Bits`.
    pub fn encode_bit(&self, field: &Field, bit: u8) -> Result<FieldElement, EncodingError> {
        if bit > 1 {
            return Err(EncodingError::InvalidBit(bit.to_string()));
        }
        Ok(field.element(bit as u32))
    }

    /// Decodes a field element to a bit (`0` or `1`). `Bits` is the
    /// identity encoding, so any nonzero stored value decodes to `1`.
    pub fn decode_bit(&self, _field: &Field, value: &FieldElement) -> u8 {
        !value.is_zero() as u8
    }

    /// Encodes a boolean.
    pub fn encode_bool(&self, field: &Field, value: bool) -> FieldElement {
        field.element(value as u32)
    }

    /// Decodes a field element to a boolean (nonzero is `true`).
    pub fn decode_bool(&self, _field: &Field, value: &FieldElement) -> bool {
        !value.is_zero()
    }
}

fn array_from_parts(shape: Shape, values: Vec<FieldElement>) -> FieldArray {
    FieldArray::from_values(shape, values).expect("value count already checked against shape")
}

fn bigint_from_f64(value: f64) -> BigInt {
    if !value.is_finite() {
        return BigInt::from(0);
    }
    // f64 mantissa is 53 bits; round through i128 which comfortably covers
    // every value this library encodes (fixed-point secrets at <= 64-bit
    // field width).
    BigInt::from(value as i128)
}

fn bigint_to_f64(value: &BigInt) -> f64 {
    value.to_i128().map(|v| v as f64).unwrap_or_else(|| value.to_string().parse().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_field::Field;
    use rstest::rstest;

    fn field() -> Field {
        Field::default()
    }

    #[rstest]
    #[case(3.5, 4)]
    #[case(-1.25, 4)]
    #[case(0.0, 8)]
    fn fixed_point_round_trips_within_precision(#[case] value: f64, #[case] precision: u32) {
        let field = field();
        let encoding = Encoding::fixed_point(precision);
        let encoded = encoding.encode_real(&field, value);
        let decoded = encoding.decode_real(&field, &encoded);
        assert!((decoded - value).abs() <= 2f64.powi(-(precision as i32)), "decoded={decoded} value={value}");
    }

    #[test]
    fn boolean_round_trips_exactly() {
        let field = field();
        let encoding = Encoding::Boolean;
        assert!(encoding.decode_bool(&field, &encoding.encode_bool(&field, true)));
        assert!(!encoding.decode_bool(&field, &encoding.encode_bool(&field, false)));
    }

    #[test]
    fn bits_round_trip_exactly() {
        let field = field();
        let encoding = Encoding::Bits;
        for bit in [0u8, 1u8] {
            let encoded = encoding.encode_bit(&field, bit).unwrap();
            assert_eq!(field.signed_value(&encoded), BigInt::from(bit));
        }
        assert!(encoding.encode_bit(&field, 2).is_err());
    }

    #[test]
    fn identity_passes_through() {
        let field = field();
        let encoding = Encoding::Identity;
        let value = field.element(42u32);
        let decoded = encoding.decode_real(&field, &value);
        assert_eq!(decoded, 42.0);
    }
}
