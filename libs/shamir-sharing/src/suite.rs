//! `ShamirSuite`: the full operation surface over threshold sharing.
//! Multiplication raises a share's polynomial degree from `k` to `2k`, so
//! every operation built on it requires `world_size >= 2k + 1` to stay
//! reconstructible; see DESIGN.md for the derivation.

use crate::{basic::ShamirBasicSuite, errors::Error, lagrange::lagrange_weights_at_zero, share::ShamirShare};
use cicada_communicator::Communicator;
use cicada_encoding::Encoding;
use cicada_field::{Field, FieldArray, Shape};
use cicada_party::Rank;
use num_bigint::BigUint;

/// The full Shamir operation surface: everything [`ShamirBasicSuite`] offers
/// plus multiplication and everything built on it.
#[derive(Clone)]
pub struct ShamirSuite {
    basic: ShamirBasicSuite,
    threshold: u32,
}

impl ShamirSuite {
    /// Builds a suite at a fixed reconstruction threshold, rejecting
    /// thresholds too high for multiplication to stay reconstructible in
    /// this communicator (`world_size >= 2*threshold + 1`).
    pub fn new(comm: Communicator, field: Field, encoding: Encoding, threshold: u32) -> Result<Self, Error> {
        let basic = ShamirBasicSuite::new(comm, field, encoding);
        Self::from_basic(basic, threshold)
    }

    fn from_basic(basic: ShamirBasicSuite, threshold: u32) -> Result<Self, Error> {
        let world_size = basic.communicator().world_size();
        if world_size < 2 * threshold as usize + 1 {
            return Err(Error::Precondition(format!("threshold {threshold} needs world_size >= {}, got {world_size}", 2 * threshold + 1)));
        }
        Ok(Self { basic, threshold })
    }

    /// The linear-only subset of this suite's operations.
    pub fn basic(&self) -> &ShamirBasicSuite {
        &self.basic
    }

    /// This suite's fixed reconstruction threshold.
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn precision_bits(&self) -> u32 {
        match self.basic.encoding() {
            Encoding::FixedPoint { precision } => precision,
            _ => 0,
        }
    }

    /// Distributes `secret` (supplied only by `src`) as a sharing at this
    /// suite's threshold.
    pub fn share(&self, src: Rank, secret: Option<&[f64]>, shape: Shape) -> Result<ShamirShare, Error> {
        self.basic.share(src, secret, shape, self.threshold)
    }

    /// Opens a share to `dst` (or every player if `None`), decoding with
    /// `encoding` (or the suite's own encoding if `None`).
    pub fn reveal(&self, share: &ShamirShare, dst: Option<Rank>, encoding: Option<Encoding>) -> Result<Option<Vec<f64>>, Error> {
        self.basic.reveal(share, dst, encoding)
    }

    /// Re-randomizes a share without changing its secret.
    pub fn reshare(&self, share: &ShamirShare) -> Result<ShamirShare, Error> {
        self.basic.reshare(share)
    }

    /// Elementwise share addition.
    pub fn add(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        self.basic.add(a, b)
    }

    /// Elementwise share subtraction.
    pub fn subtract(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        self.basic.subtract(a, b)
    }

    /// Share negation.
    pub fn negative(&self, a: &ShamirShare) -> ShamirShare {
        self.basic.negative(a)
    }

    /// A share of a public real constant.
    pub fn constant(&self, value: f64, shape: Shape) -> ShamirShare {
        self.basic.constant(value, shape, self.threshold)
    }

    /// Exact local reduction: `sum(a)`, without truncation.
    pub fn sum(&self, a: &ShamirShare) -> ShamirShare {
        self.basic.sum(a)
    }

    /// A share of a value uniform over the whole field. Unlike the additive
    /// suite this still needs one round: every player dealing a share of
    /// its own local uniform draw, summed, since a degree-`k` polynomial
    /// can't be assembled purely from independent local contributions the
    /// way an additive share can.
    pub fn field_uniform(&self, shape: Shape) -> Result<ShamirShare, Error> {
        let local = self.basic.field().uniform(shape.clone(), &mut rand::thread_rng());
        let dealt = self.basic.share_raw(self.basic.communicator().rank(), Some(local), shape.clone(), self.threshold)?;
        let mut acc = dealt;
        for dealer in 0..self.basic.communicator().world_size() as u32 {
            let dealer = Rank(dealer);
            if dealer == self.basic.communicator().rank() {
                continue;
            }
            let received = self.basic.share_raw(dealer, None, shape.clone(), self.threshold)?;
            acc = self.basic.add(&acc, &received)?;
        }
        Ok(acc)
    }

    /// Raw field multiplication via the classic BGW degree-reduction
    /// protocol: each player locally multiplies its two points (landing on
    /// the degree-`2k` polynomial through the true product), reshares that
    /// local product at degree `k`, and every player recombines the `n`
    /// resulting sub-shares with the public Lagrange weights for
    /// interpolating the original degree-`2k` polynomial at `x = 0`. No
    /// output truncation.
    pub fn field_multiply(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let shape = a
            .shape()
            .broadcast(b.shape())
            .ok_or_else(|| Error::Precondition(format!("incompatible shapes {} and {} for field_multiply", a.shape(), b.shape())))?;
        let local_product = self.basic.field().multiply(a.value(), b.value())?;

        let n = self.basic.communicator().world_size() as u32;
        let mut sub_shares = Vec::with_capacity(n as usize);
        for dealer in 0..n {
            let dealer = Rank(dealer);
            let secret = if self.basic.communicator().rank() == dealer { Some(local_product.clone()) } else { None };
            sub_shares.push(self.basic.share_raw(dealer, secret, shape.clone(), self.threshold)?);
        }

        let xs: Vec<u32> = (1..=n).collect();
        let weights = lagrange_weights_at_zero(self.basic.field(), &xs);
        let mut acc = self.basic.field().zeros(shape);
        for (weight, sub_share) in weights.iter().zip(sub_shares.iter()) {
            let term = self.basic.field().multiply(sub_share.value(), &FieldArray::scalar(weight.clone()))?;
            acc = self.basic.field().add(&acc, &term)?;
        }
        Ok(ShamirShare::from_local(acc, self.threshold))
    }

    fn mask_party() -> Rank {
        Rank(0)
    }

    /// Probabilistic truncation, identical in spirit to the additive
    /// suite's: rank 0 deals a random mask and its pre-shifted value, the
    /// masked share is opened, the shift happens in the clear, and the
    /// shifted mask is subtracted back out.
    pub fn right_shift(&self, share: &ShamirShare, bits: u32) -> Result<ShamirShare, Error> {
        if bits == 0 {
            return Ok(share.clone());
        }
        let shape = share.shape().clone();
        let masker = Self::mask_party();
        let mask = if self.basic.communicator().rank() == masker {
            Some(self.basic.field().uniform(shape.clone(), &mut rand::thread_rng()))
        } else {
            None
        };
        let mask_shift = mask.as_ref().map(|m| shift_array(self.basic.field(), m, bits));

        let mask_share = self.basic.share_raw(masker, mask, shape.clone(), self.threshold)?;
        let mask_shift_share = self.basic.share_raw(masker, mask_shift, shape.clone(), self.threshold)?;

        let masked = self.basic.add(share, &mask_share)?;
        let opened = self.basic.reveal_array(&masked, None)?.expect("an unrestricted reveal always returns a value");
        let opened_shifted = shift_array(self.basic.field(), &opened, bits);

        let my_piece = if self.basic.communicator().rank() == masker { opened_shifted } else { self.basic.field().zeros(shape) };
        let result = self.basic.field().subtract(&my_piece, mask_shift_share.value())?;
        Ok(ShamirShare::from_local(result, self.threshold))
    }

    /// Fixed-point multiplication: raw multiply then one truncation.
    pub fn multiply(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let product = self.field_multiply(a, b)?;
        self.right_shift(&product, self.precision_bits())
    }

    /// Dot product of two vector shares: elementwise multiply, local sum,
    /// one truncation.
    pub fn dot(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let product = self.field_multiply(a, b)?;
        let summed = ShamirShare::from_local(FieldArray::scalar(self.basic.field().sum(product.value())), self.threshold);
        self.right_shift(&summed, self.precision_bits())
    }

    /// Jointly samples `bit_shape`'s worth of random bits that no single
    /// player individually knows: every player locally draws its own random
    /// `{0,1}` array, deals it out at this suite's threshold, and the
    /// contributions are XOR-combined. Mirrors the additive suite's
    /// `random_bits_share`.
    fn random_bits_share(&self, bit_shape: Shape) -> Result<ShamirShare, Error> {
        use rand::Rng as _;
        let mut acc: Option<ShamirShare> = None;
        for src in 0..self.basic.communicator().world_size() as u32 {
            let src_rank = Rank(src);
            let local = if self.basic.communicator().rank() == src_rank {
                let mut rng = rand::thread_rng();
                let values = (0..bit_shape.size().max(1)).map(|_| self.basic.field().element(rng.gen_range(0..2u32))).collect();
                Some(FieldArray::from_values(bit_shape.clone(), values)?)
            } else {
                None
            };
            let bit_share = self.basic.share_raw(src_rank, local, bit_shape.clone(), self.threshold)?;
            acc = Some(match acc {
                Some(prev) => self.logical_xor(&prev, &bit_share)?,
                None => bit_share,
            });
        }
        Ok(acc.expect("world_size is at least 1"))
    }

    /// XORs a secret bit share with a *public* `{0,1}` array: `c + p -
    /// 2*p*c`, entirely local since `p` is known identically to every
    /// player.
    fn xor_with_public(&self, share: &ShamirShare, public: &FieldArray) -> Result<ShamirShare, Error> {
        let two = self.basic.field().element(2u32);
        let two_p = self.basic.field().multiply(public, &FieldArray::scalar(two))?;
        let one = self.basic.field().ones(public.shape().clone());
        let factor = self.basic.field().subtract(&one, &two_p)?;
        let scaled = ShamirShare::from_local(self.basic.field().multiply(share.value(), &factor)?, self.threshold);
        self.add(&scaled, &ShamirShare::from_local(public.clone(), self.threshold))
    }

    /// `majority(p, r, c)` where `p` is a *public* `{0,1}` array and `r`, `c`
    /// are secret bit shares: `c*r + p*(c + r - 2*c*r)`, which is `AND(c,r)`
    /// when `p = 0` and `OR(c,r)` when `p = 1`. One `field_multiply` round
    /// (`c*r`); everything else is local given the public `p`.
    fn majority_public(&self, c: &ShamirShare, r: &ShamirShare, p: &FieldArray) -> Result<ShamirShare, Error> {
        let cr = self.field_multiply(c, r)?;
        let c_plus_r = self.add(c, r)?;
        let two = self.basic.field().element(2u32);
        let two_cr = self.basic.scalar_multiply(&cr, &two)?;
        let bracket = self.subtract(&c_plus_r, &two_cr)?;
        let p_term = ShamirShare::from_local(self.basic.field().multiply(bracket.value(), p)?, self.threshold);
        self.add(&cr, &p_term)
    }

    /// The single bit at trailing-axis position `pos` (0 = most significant)
    /// of a bit-decomposed share, with the trailing axis dropped rather than
    /// collapsed to a length-1 axis.
    fn extract_single_bit(&self, bits: &ShamirShare, width: usize, pos: usize, outer_shape: Shape) -> Result<ShamirShare, Error> {
        let values = bits.value().values();
        let mut out = Vec::with_capacity(outer_shape.size().max(1));
        for chunk in values.chunks(width) {
            out.push(chunk[pos].clone());
        }
        Ok(ShamirShare::from_local(FieldArray::from_values(outer_shape, out)?, self.threshold))
    }

    /// Bit-decomposes a share into its big-endian bit representation along a
    /// new trailing axis of length `bits` (defaults to the field's full
    /// width), without revealing the input.
    ///
    /// Masks the share with a jointly random value nobody knows
    /// ([`ShamirSuite::random_bits_share`]), opens only the masked
    /// difference (statistically hiding the input), and recovers the
    /// secret bits with a ripple-carry adder over the public masked bits
    /// and the still-secret mask bits: `O(bits)` sequential rounds, one per
    /// carry position, each a single `field_multiply`. Mirrors the additive
    /// suite's `bit_decompose`; previously this opened `share` itself in the
    /// clear before decomposing, which handed every player the plaintext
    /// input -- see DESIGN.md.
    fn bit_decompose(&self, share: &ShamirShare, bits: Option<u32>) -> Result<ShamirShare, Error> {
        let width = bits.unwrap_or_else(|| self.basic.field().bits());
        let outer_shape = share.shape().clone();

        let mut mask_dims = outer_shape.dims().to_vec();
        mask_dims.push(width as usize);
        let bit_shape = Shape::new(mask_dims);
        let mask_bits = self.random_bits_share(bit_shape.clone())?;
        let mask = self.bit_compose(&mask_bits)?;

        let masked = self.subtract(share, &mask)?;
        let masked_plain = self.basic.reveal_array(&masked, None)?.expect("an unrestricted reveal always returns a value");

        let width_usize = width as usize;
        let plain_layers: Vec<FieldArray> = (0..width_usize)
            .map(|pos| {
                let significance = width_usize - 1 - pos;
                let values = masked_plain.values().iter().map(|v| self.basic.field().element(v.value().bit(significance as u64) as u32)).collect();
                FieldArray::from_values(outer_shape.clone(), values)
            })
            .collect::<Result<_, _>>()?;

        let mut carry = ShamirShare::from_local(self.basic.field().zeros(outer_shape.clone()), self.threshold);
        let mut sum_bits: Vec<Option<ShamirShare>> = (0..width_usize).map(|_| None).collect();
        for pos in (0..width_usize).rev() {
            let r_bit = self.extract_single_bit(&mask_bits, width_usize, pos, outer_shape.clone())?;
            let layer = &plain_layers[pos];
            let r_xor_c = self.logical_xor(&r_bit, &carry)?;
            let sum_bit = self.xor_with_public(&r_xor_c, layer)?;
            sum_bits[pos] = Some(sum_bit);
            carry = self.majority_public(&carry, &r_bit, layer)?;
        }

        let mut flat = Vec::with_capacity(outer_shape.size().max(1) * width_usize);
        for e in 0..outer_shape.size().max(1) {
            for pos in 0..width_usize {
                flat.push(sum_bits[pos].as_ref().expect("every position is computed").value().values()[e].clone());
            }
        }
        Ok(ShamirShare::from_local(FieldArray::from_values(bit_shape, flat)?, self.threshold))
    }

    fn bit_compose(&self, bits: &ShamirShare) -> Result<ShamirShare, Error> {
        let dims = bits.shape().dims();
        let width = *dims.last().ok_or_else(|| Error::Precondition("bit_compose requires a trailing bit axis".into()))?;
        let outer_shape = Shape::new(dims[..dims.len() - 1].to_vec());
        let values = bits.value().values();

        let mut composed = Vec::with_capacity(outer_shape.size().max(1));
        for chunk in values.chunks(width) {
            let mut acc = self.basic.field().zero();
            for (i, bit) in chunk.iter().enumerate() {
                let weight = self.basic.field().element(BigUint::from(1u32) << (width - 1 - i));
                let weighted = self.basic.field().multiply(&FieldArray::scalar(bit.clone()), &FieldArray::scalar(weight))?;
                acc = self.basic.field().add(&FieldArray::scalar(acc), &weighted)?.as_scalar().expect("scalar array").clone();
            }
            composed.push(acc);
        }
        Ok(ShamirShare::from_local(FieldArray::from_values(outer_shape, composed)?, self.threshold))
    }

    fn extract_bit_range(&self, bits: &ShamirShare, width: usize, start: usize, end: usize, outer_shape: Shape) -> Result<ShamirShare, Error> {
        let values = bits.value().values();
        let mut out = Vec::with_capacity(outer_shape.size() * (end - start));
        for chunk in values.chunks(width) {
            out.extend_from_slice(&chunk[start..end]);
        }
        let mut dims = outer_shape.dims().to_vec();
        dims.push(end - start);
        Ok(ShamirShare::from_local(FieldArray::from_values(Shape::new(dims), out)?, self.threshold))
    }

    /// Boolean NOT on a `{0,1}`-valued share: `1 - a`, local.
    pub fn logical_not(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let one = self.basic.constant(1.0, a.shape().clone(), self.threshold);
        self.subtract(&one, a)
    }

    /// Boolean AND: `a * b`.
    pub fn logical_and(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        self.field_multiply(a, b)
    }

    /// Boolean OR: `a + b - a*b`.
    pub fn logical_or(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let sum = self.add(a, b)?;
        let prod = self.field_multiply(a, b)?;
        self.subtract(&sum, &prod)
    }

    /// Boolean XOR: `a + b - 2*a*b`.
    pub fn logical_xor(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let sum = self.add(a, b)?;
        let prod = self.field_multiply(a, b)?;
        let two = self.basic.field().element(2u32);
        let two_prod = self.basic.scalar_multiply(&prod, &two)?;
        self.subtract(&sum, &two_prod)
    }

    /// Whether the shared value is strictly negative, as a `{0,1}` share.
    pub fn less_zero(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let bits = self.basic.field().bits();
        let decomposed = self.bit_decompose(a, Some(bits))?;
        self.extract_bit_range(&decomposed, bits as usize, 0, 1, a.shape().clone())
    }

    /// `a < b`, as a `{0,1}` share.
    pub fn less(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let diff = self.subtract(a, b)?;
        self.less_zero(&diff)
    }

    /// `a == b`, as a `{0,1}` share: NOR of every bit of `a - b`.
    pub fn equal(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let diff = self.subtract(a, b)?;
        let bits = self.basic.field().bits();
        let decomposed = self.bit_decompose(&diff, Some(bits))?;
        let width = bits as usize;
        let outer_shape = a.shape().clone();

        let mut acc = self.logical_not(&self.extract_bit_range(&decomposed, width, 0, 1, outer_shape.clone())?)?;
        for i in 1..width {
            let bit = self.extract_bit_range(&decomposed, width, i, i + 1, outer_shape.clone())?;
            let not_bit = self.logical_not(&bit)?;
            acc = self.logical_and(&acc, &not_bit)?;
        }
        Ok(acc)
    }

    /// `|a|`.
    pub fn absolute(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let sign = self.less_zero(a)?;
        let two = self.basic.field().element(2u32);
        let two_sign = self.basic.scalar_multiply(&sign, &two)?;
        let one = self.basic.constant(1.0, a.shape().clone(), self.threshold);
        let factor = self.subtract(&one, &two_sign)?;
        self.field_multiply(a, &factor)
    }

    /// Rounds a fixed-point share toward negative infinity.
    pub fn floor(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let precision = self.precision_bits();
        if precision == 0 {
            return Ok(a.clone());
        }
        let total_bits = self.basic.field().bits();
        let decomposed = self.bit_decompose(a, Some(total_bits))?;
        let fractional = self.extract_bit_range(&decomposed, total_bits as usize, (total_bits - precision) as usize, total_bits as usize, a.shape().clone())?;
        let fractional_value = self.bit_compose(&fractional)?;
        self.subtract(a, &fractional_value)
    }

    /// `max(a, 0)`.
    pub fn relu(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let positive = self.logical_not(&self.less_zero(a)?)?;
        self.field_multiply(a, &positive)
    }

    /// A 3-piece linear approximation of the logistic sigmoid.
    pub fn zigmoid(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let shape = a.shape().clone();
        let half = self.constant(0.5, shape.clone());
        let shifted = self.add(a, &half)?;
        let below = self.less_zero(&shifted)?;

        let one = self.constant(1.0, shape.clone());
        let above = self.less_zero(&self.subtract(&one, &shifted)?)?;

        let indicators = self.add(&below, &above)?;
        let middle = self.logical_not(&indicators)?;
        let middle_term = self.field_multiply(&middle, &shifted)?;
        self.add(&middle_term, &above)
    }

    fn halve(&self, share: &ShamirShare) -> Result<ShamirShare, Error> {
        let inv2 = self.basic.field().inv_mod(&self.basic.field().element(2u32))?;
        self.basic.scalar_multiply(share, &inv2)
    }

    /// `max(a, b) = (a + b + |a - b|) / 2`.
    pub fn maximum(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let diff = self.subtract(a, b)?;
        let abs = self.absolute(&diff)?;
        let numerator = self.add(&self.add(a, b)?, &abs)?;
        self.halve(&numerator)
    }

    /// `min(a, b) = (a + b - |a - b|) / 2`.
    pub fn minimum(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let diff = self.subtract(a, b)?;
        let abs = self.absolute(&diff)?;
        let numerator = self.subtract(&self.add(a, b)?, &abs)?;
        self.halve(&numerator)
    }

    /// Integer exponentiation by repeated squaring.
    pub fn power(&self, a: &ShamirShare, exponent: u32) -> Result<ShamirShare, Error> {
        if exponent == 0 {
            return Ok(self.constant(1.0, a.shape().clone()));
        }
        let mut result: Option<ShamirShare> = None;
        let mut base = a.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = Some(match result {
                    Some(r) => self.multiply(&r, &base)?,
                    None => base.clone(),
                });
            }
            e >>= 1;
            if e > 0 {
                base = self.multiply(&base, &base)?;
            }
        }
        Ok(result.expect("loop runs at least once for a nonzero exponent"))
    }

    /// The exact modular inverse of a nonzero raw field value.
    pub fn multiplicative_inverse(&self, a: &ShamirShare) -> Result<ShamirShare, Error> {
        let shape = a.shape().clone();
        let mask = self.field_uniform(shape)?;
        let product = self.field_multiply(a, &mask)?;
        let opened = self.basic.reveal_array(&product, None)?.expect("an unrestricted reveal always returns a value");
        let inverted = opened.values().iter().map(|v| self.basic.field().inv_mod(v)).collect::<Result<Vec<_>, _>>()?;
        let inverted = FieldArray::from_values(opened.shape().clone(), inverted)?;
        let result = self.basic.field().multiply(mask.value(), &inverted)?;
        Ok(ShamirShare::from_local(result, self.threshold))
    }

    /// Real division `a / b`, revealing `b` and computing the reciprocal in
    /// the clear. TODO: replace with an oblivious reciprocal iteration once
    /// a caller needs the divisor to stay secret.
    pub fn divide(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        let revealed_b = self.reveal(b, None, None)?.expect("an unrestricted reveal always returns a value");
        let reciprocals: Vec<f64> = revealed_b.iter().map(|v| 1.0 / v).collect();
        let encoding = self.basic.encoding();
        let reciprocal_field = encoding.encode(self.basic.field(), b.shape().clone(), &reciprocals)?;
        let product = self.basic.field().multiply(a.value(), &reciprocal_field)?;
        self.right_shift(&ShamirShare::from_local(product, self.threshold), self.precision_bits())
    }

    /// Jointly samples `bits` random bits no single player controls.
    pub fn random_bitwise_secret(&self, bits: u32, shape: Shape) -> Result<(ShamirShare, ShamirShare), Error> {
        let raw = self.field_uniform(shape.clone())?;
        let total_bits = self.basic.field().bits();
        let decomposed = self.bit_decompose(&raw, Some(total_bits))?;
        let low_bits = self.extract_bit_range(&decomposed, total_bits as usize, (total_bits - bits) as usize, total_bits as usize, shape)?;
        let integer = self.bit_compose(&low_bits)?;
        Ok((low_bits, integer))
    }
}

fn shift_array(field: &Field, array: &FieldArray, bits: u32) -> FieldArray {
    let values = array.values().iter().map(|v| field.element(v.value() >> bits)).collect();
    FieldArray::from_values(array.shape().clone(), values).expect("shifting preserves element count")
}
