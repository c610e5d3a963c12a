//! Polynomial evaluation and Lagrange interpolation at `x = 0`.
//!
//! Every player's abscissa is `rank + 1` (never `0`, which is reserved for
//! the secret itself).

use cicada_field::{Field, FieldElement};

fn add_mod(field: &Field, a: &FieldElement, b: &FieldElement) -> FieldElement {
    field.element(a.value() + b.value())
}

fn mul_mod(field: &Field, a: &FieldElement, b: &FieldElement) -> FieldElement {
    field.element(a.value() * b.value())
}

/// Evaluates `constant + coeffs[0]*x + coeffs[1]*x^2 + ... + coeffs[k-1]*x^k`
/// via Horner's method.
pub(crate) fn evaluate(field: &Field, constant: &FieldElement, coeffs: &[FieldElement], x: &FieldElement) -> FieldElement {
    let mut acc = field.zero();
    for c in coeffs.iter().rev() {
        acc = add_mod(field, &mul_mod(field, &acc, x), c);
    }
    add_mod(field, &mul_mod(field, &acc, x), constant)
}

/// The Lagrange basis weight `lambda_i` for reconstructing a polynomial's
/// value at `x = 0` from its value at `xs[i]`, given the full set of
/// abscissas `xs`.
fn lagrange_weight(field: &Field, xs: &[u32], i: usize) -> FieldElement {
    let xi = xs[i] as i64;
    let mut num = field.one();
    let mut den = field.one();
    for (j, &xj) in xs.iter().enumerate() {
        if i == j {
            continue;
        }
        let xj = xj as i64;
        num = mul_mod(field, &num, &field.element_from_i64(-xj));
        den = mul_mod(field, &den, &field.element_from_i64(xi - xj));
    }
    let den_inv = field.inv_mod(&den).expect("distinct abscissas always yield an invertible denominator");
    mul_mod(field, &num, &den_inv)
}

/// The weight vector for interpolating at `x = 0` from points at `xs`.
pub(crate) fn lagrange_weights_at_zero(field: &Field, xs: &[u32]) -> Vec<FieldElement> {
    (0..xs.len()).map(|i| lagrange_weight(field, xs, i)).collect()
}

/// Reconstructs a polynomial's value at `x = 0` given `(x, y)` points.
pub(crate) fn lagrange_at_zero(field: &Field, xs: &[u32], ys: &[FieldElement]) -> FieldElement {
    let weights = lagrange_weights_at_zero(field, xs);
    weights.iter().zip(ys.iter()).fold(field.zero(), |acc, (w, y)| add_mod(field, &acc, &mul_mod(field, w, y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_field::Field;

    #[test]
    fn evaluate_matches_direct_computation() {
        let field = Field::default();
        let constant = field.element(7u32);
        let coeffs = vec![field.element(3u32), field.element(2u32)];
        let x = field.element(5u32);
        let result = evaluate(&field, &constant, &coeffs, &x);
        assert_eq!(result.value(), &num_bigint::BigUint::from(7u32 + 3 * 5 + 2 * 25));
    }

    #[test]
    fn lagrange_recovers_the_constant_term() {
        let field = Field::default();
        let constant = field.element(42u32);
        let coeffs = vec![field.element(11u32), field.element(5u32)];
        let xs: Vec<u32> = vec![1, 2, 3, 4];
        let ys: Vec<FieldElement> = xs.iter().map(|&x| evaluate(&field, &constant, &coeffs, &field.element(x))).collect();
        let recovered = lagrange_at_zero(&field, &xs, &ys);
        assert_eq!(recovered.value(), constant.value());
    }
}
