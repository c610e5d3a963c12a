//! Minimal [`FieldArray`] codec, used only for the public coin flips
//! [`crate::ActiveSuite::verify_batch`] needs.

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

pub(crate) fn decode_field_array(field: &Field, shape: Shape, bytes: &[u8]) -> Option<FieldArray> {
    let byte_len = element_byte_len(field);
    if bytes.len() != shape.size() * byte_len {
        return None;
    }
    let values = bytes.chunks(byte_len).map(|chunk| field.element(num_bigint::BigUint::from_bytes_be(chunk))).collect();
    FieldArray::from_values(shape, values).ok()
}
