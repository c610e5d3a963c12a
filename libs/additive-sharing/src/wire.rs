//! Fixed-width binary codec for [`FieldArray`] payloads sent over a
//! [`cicada_communicator::Communicator`].
//!
//! Each element is packed into `ceil(field.bits() / 8)` big-endian bytes;
//! the shape itself is never sent, since every caller already knows the
//! shape it's asking a peer to fill.

use crate::errors::Error;
use cicada_field::{Field, FieldArray, Shape};

fn element_byte_len(field: &Field) -> usize {
    (field.bits() as usize).div_ceil(8)
}

pub(crate) fn encode_field_array(field: &Field, array: &FieldArray) -> Vec<u8> {
    let byte_len = element_byte_len(field);
    let mut out = Vec::with_capacity(array.len() * byte_len);
    for element in array.values() {
        let raw = element.value().to_bytes_be();
        let mut padded = vec![0u8; byte_len];
        padded[byte_len - raw.len()..].copy_from_slice(&raw);
        out.extend_from_slice(&padded);
    }
    out
}

pub(crate) fn decode_field_array(field: &Field, shape: Shape, bytes: &[u8]) -> Result<FieldArray, Error> {
    let byte_len = element_byte_len(field);
    if bytes.len() != shape.size() * byte_len {
        return Err(Error::Protocol(format!(
            "expected a {}-element field array ({} bytes), got {} bytes",
            shape.size(),
            shape.size() * byte_len,
            bytes.len()
        )));
    }
    let values = bytes.chunks(byte_len).map(|chunk| field.element(num_bigint::BigUint::from_bytes_be(chunk))).collect();
    FieldArray::from_values(shape, values).map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_field::Shape;

    #[test]
    fn round_trips_a_vector() {
        let field = Field::default();
        let array = FieldArray::from_values(Shape::vector(3), vec![field.element(1u32), field.element(2u32), field.element(3u32)]).unwrap();
        let bytes = encode_field_array(&field, &array);
        let decoded = decode_field_array(&field, Shape::vector(3), &bytes).unwrap();
        assert_eq!(decoded.values(), array.values());
    }

    #[test]
    fn rejects_mismatched_length() {
        let field = Field::default();
        assert!(decode_field_array(&field, Shape::vector(3), &[0u8; 4]).is_err());
    }
}
