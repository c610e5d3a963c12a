//! `ShamirBasicSuite`: the linear subset of Shamir sharing, usable at any
//! threshold `k <= n`. Addition, subtraction, negation, and scalar
//! multiplication never raise a share's polynomial degree, so they need no
//! lower bound on `n` relative to `k`.

use crate::{
    errors::Error,
    lagrange::lagrange_at_zero,
    share::ShamirShare,
    tags,
    wire::{decode_field_array, encode_field_array},
};
use cicada_communicator::Communicator;
use cicada_encoding::Encoding;
use cicada_field::{Field, FieldArray, FieldElement, Shape};
use cicada_party::Rank;
use std::sync::Arc;

/// k-out-of-n threshold sharing: the linear operations, valid for any
/// `threshold < world_size`.
#[derive(Clone)]
pub struct ShamirBasicSuite {
    comm: Arc<Communicator>,
    field: Field,
    encoding: Encoding,
}

impl ShamirBasicSuite {
    /// Builds a suite over an existing communicator.
    pub fn new(comm: Communicator, field: Field, encoding: Encoding) -> Self {
        Self { comm: Arc::new(comm), field, encoding }
    }

    /// The communicator this suite runs its protocols over.
    pub fn communicator(&self) -> &Communicator {
        &self.comm
    }

    /// The field this suite's shares live in.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// The encoding this suite's shares carry.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    fn check_threshold(&self, threshold: u32) -> Result<(), Error> {
        if threshold == 0 || threshold as usize >= self.comm.world_size() {
            return Err(Error::Precondition(format!("threshold {threshold} must satisfy 0 < threshold < world_size ({})", self.comm.world_size())));
        }
        Ok(())
    }

    /// Distributes a raw field array from `src` as a degree-`threshold`
    /// Shamir sharing, without going through [`Encoding`]. Used internally
    /// by the full suite's multiplication protocol, which reshares already
    /// field-encoded intermediate values.
    pub(crate) fn share_raw(&self, src: Rank, secret: Option<FieldArray>, shape: Shape, threshold: u32) -> Result<ShamirShare, Error> {
        self.check_threshold(threshold)?;
        let n = self.comm.world_size() as u32;
        if self.comm.rank() == src {
            let secret = secret.ok_or_else(|| Error::Precondition("the source of a share must supply a secret".into()))?;
            let elem_count = shape.size();
            let coeffs: Vec<FieldArray> = (0..threshold).map(|_| self.field.uniform(shape.clone(), &mut rand::thread_rng())).collect();

            let mut own_share = None;
            for x in 1..=n {
                let x_field = self.field.element(x);
                let mut values = Vec::with_capacity(elem_count);
                for elem_idx in 0..elem_count {
                    let constant = &secret.values()[elem_idx];
                    let elem_coeffs: Vec<FieldElement> = coeffs.iter().map(|c| c.values()[elem_idx].clone()).collect();
                    values.push(crate::lagrange::evaluate(&self.field, constant, &elem_coeffs, &x_field));
                }
                let player_share = FieldArray::from_values(shape.clone(), values)?;
                let peer = Rank(x - 1);
                if peer == src {
                    own_share = Some(player_share);
                } else {
                    self.comm.send(peer, tags::SHARE, &encode_field_array(&self.field, &player_share))?;
                }
            }
            Ok(ShamirShare::from_local(own_share.expect("source is always among the n players"), threshold))
        } else {
            let bytes = self.comm.recv(src, tags::SHARE)?;
            Ok(ShamirShare::from_local(decode_field_array(&self.field, shape, &bytes)?, threshold))
        }
    }

    /// Distributes `secret` (supplied only by `src`) as a degree-`threshold`
    /// sharing of the given shape.
    pub fn share(&self, src: Rank, secret: Option<&[f64]>, shape: Shape, threshold: u32) -> Result<ShamirShare, Error> {
        let encoded = if self.comm.rank() == src {
            let secret = secret.ok_or_else(|| Error::Precondition("the source of a share must supply a secret".into()))?;
            Some(self.encoding.encode(&self.field, shape.clone(), secret)?)
        } else {
            None
        };
        self.share_raw(src, encoded, shape, threshold)
    }

    pub(crate) fn reveal_array(&self, share: &ShamirShare, dst: Option<Rank>) -> Result<Option<FieldArray>, Error> {
        let threshold = share.threshold();
        self.check_threshold(threshold)?;
        let bytes = encode_field_array(&self.field, share.value());
        let parts = match dst {
            Some(rank) => match self.comm.gather(rank, &bytes)? {
                Some(parts) => parts,
                None => return Ok(None),
            },
            None => self.comm.allgather(&bytes)?,
        };
        let shape = share.shape().clone();
        let decoded: Vec<FieldArray> = parts.iter().map(|p| decode_field_array(&self.field, shape.clone(), p)).collect::<Result<_, _>>()?;

        let needed = threshold as usize + 1;
        let xs: Vec<u32> = (1..=needed as u32).collect();
        let elem_count = shape.size();
        let mut result_values = Vec::with_capacity(elem_count);
        for elem_idx in 0..elem_count {
            let ys: Vec<FieldElement> = decoded[..needed].iter().map(|d| d.values()[elem_idx].clone()).collect();
            result_values.push(lagrange_at_zero(&self.field, &xs, &ys));
        }
        Ok(Some(FieldArray::from_values(shape, result_values)?))
    }

    /// Opens a share to `dst` (or to every player if `dst` is `None`),
    /// decoding the recovered field array back to real numbers with
    /// `encoding` (or the suite's own encoding if `None`). Requires
    /// `threshold + 1` players to be live and contributing.
    pub fn reveal(&self, share: &ShamirShare, dst: Option<Rank>, encoding: Option<Encoding>) -> Result<Option<Vec<f64>>, Error> {
        let encoding = encoding.unwrap_or(self.encoding);
        Ok(self.reveal_array(share, dst)?.map(|value| encoding.decode(&self.field, &value)))
    }

    /// Re-randomizes a share without changing the secret it represents, by
    /// summing in `n` independently dealt degree-`threshold` sharings of
    /// zero (one per player, so the result is random-looking as long as at
    /// least one dealer is honest).
    pub fn reshare(&self, share: &ShamirShare) -> Result<ShamirShare, Error> {
        let threshold = share.threshold();
        let shape = share.shape().clone();
        let zeros = vec![0.0; shape.size()];
        let mut acc = share.clone();
        for dealer in 0..self.comm.world_size() as u32 {
            let dealer = Rank(dealer);
            let secret = if self.comm.rank() == dealer { Some(zeros.as_slice()) } else { None };
            let zero_share = self.share(dealer, secret, shape.clone(), threshold)?;
            acc = self.add(&acc, &zero_share)?;
        }
        Ok(acc)
    }

    /// Elementwise share addition: local, no communication. Both shares
    /// must carry the same threshold.
    pub fn add(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        self.require_same_threshold(a, b)?;
        Ok(ShamirShare::from_local(self.field.add(a.value(), b.value())?, a.threshold()))
    }

    /// Elementwise share subtraction: local, no communication.
    pub fn subtract(&self, a: &ShamirShare, b: &ShamirShare) -> Result<ShamirShare, Error> {
        self.require_same_threshold(a, b)?;
        Ok(ShamirShare::from_local(self.field.subtract(a.value(), b.value())?, a.threshold()))
    }

    /// Share negation: local, no communication.
    pub fn negative(&self, a: &ShamirShare) -> ShamirShare {
        ShamirShare::from_local(self.field.negative(a.value()), a.threshold())
    }

    /// Multiplies a share by a public scalar: local, degree-preserving.
    pub fn scalar_multiply(&self, a: &ShamirShare, scalar: &FieldElement) -> Result<ShamirShare, Error> {
        Ok(ShamirShare::from_local(self.field.multiply(a.value(), &FieldArray::scalar(scalar.clone()))?, a.threshold()))
    }

    /// Exact local reduction: `sum(a)`, without truncation.
    pub fn sum(&self, a: &ShamirShare) -> ShamirShare {
        ShamirShare::from_local(FieldArray::scalar(self.field.sum(a.value())), a.threshold())
    }

    /// A share of a value known to every player, held as the constant term
    /// of the zero polynomial (every player's evaluation is simply the
    /// value itself).
    pub fn constant(&self, value: f64, shape: Shape, threshold: u32) -> ShamirShare {
        let element = self.encoding.encode_real(&self.field, value);
        ShamirShare::from_local(self.field.full(shape, element), threshold)
    }

    fn require_same_threshold(&self, a: &ShamirShare, b: &ShamirShare) -> Result<(), Error> {
        if a.threshold() != b.threshold() {
            return Err(Error::Precondition(format!("mismatched thresholds: {} vs {}", a.threshold(), b.threshold())));
        }
        Ok(())
    }
}
