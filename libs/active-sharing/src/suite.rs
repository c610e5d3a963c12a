//! Actively secure operations over paired additive/Shamir shares.

use crate::errors::Error;
use crate::share::ActiveShare;
use crate::wire::{decode_field_array, encode_field_array};
use cicada_additive_sharing::{AdditiveShare, AdditiveSuite};
use cicada_field::{FieldArray, Shape};
use cicada_party::Rank;
use cicada_shamir_sharing::ShamirSuite;
use rand::RngCore;

/// Composes an [`AdditiveSuite`] and a [`ShamirSuite`] already bootstrapped
/// over the same set of players. Every operation runs on both halves in
/// lockstep; a reveal compares the two openings and raises
/// [`Error::Tampered`] on disagreement, so a single corrupted player's
/// deviation cannot silently propagate into the opened result.
pub struct ActiveSuite {
    additive: AdditiveSuite,
    shamir: ShamirSuite,
}

impl ActiveSuite {
    /// Pairs an additive suite and a Shamir suite. Both must run over the
    /// same world size; nothing else is checked here, since a caller that
    /// wires up two unrelated meshes has already broken every invariant
    /// this type exists to uphold.
    pub fn new(additive: AdditiveSuite, shamir: ShamirSuite) -> Result<Self, Error> {
        if additive.communicator().world_size() != shamir.basic().communicator().world_size() {
            return Err(Error::Precondition(format!(
                "additive and shamir suites disagree on world size ({} vs {})",
                additive.communicator().world_size(),
                shamir.basic().communicator().world_size()
            )));
        }
        Ok(Self { additive, shamir })
    }

    /// The additive half of this suite.
    pub fn additive(&self) -> &AdditiveSuite {
        &self.additive
    }

    /// The Shamir half of this suite.
    pub fn shamir(&self) -> &ShamirSuite {
        &self.shamir
    }

    /// Splits a secret into an active share, deferring to each half's own
    /// `share` with the Shamir half using this suite's configured
    /// threshold.
    pub fn share(&self, src: Rank, secret: Option<&[f64]>, shape: Shape) -> Result<ActiveShare, Error> {
        let additive = self.additive.share(src, secret, shape.clone())?;
        let shamir = self.shamir.share(src, secret, shape)?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// Opens a share to `dst` (or to everyone if `None`), decoding with
    /// `encoding` (or each half's own encoding if `None`), and comparing the
    /// additive and Shamir openings to reject any disagreement.
    pub fn reveal(&self, share: &ActiveShare, dst: Option<Rank>, encoding: Option<cicada_encoding::Encoding>) -> Result<Option<Vec<f64>>, Error> {
        let from_additive = self.additive.reveal(share.additive(), dst, encoding)?;
        let from_shamir = self.shamir.reveal(share.shamir(), dst, encoding)?;
        match (from_additive, from_shamir) {
            (Some(a), Some(b)) => {
                if a.len() != b.len() || a.iter().zip(&b).any(|(x, y)| (x - y).abs() > 1e-3) {
                    return Err(Error::Tampered);
                }
                Ok(Some(a))
            }
            (None, None) => Ok(None),
            _ => Err(Error::Precondition("additive and shamir reveals disagree on destination".into())),
        }
    }

    /// Re-randomizes both halves of a share without changing the secret.
    pub fn reshare(&self, share: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.reshare(share.additive())?;
        let shamir = self.shamir.reshare(share.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// Elementwise sum of two shares.
    pub fn add(&self, a: &ActiveShare, b: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.add(a.additive(), b.additive())?;
        let shamir = self.shamir.add(a.shamir(), b.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// Elementwise difference of two shares.
    pub fn subtract(&self, a: &ActiveShare, b: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.subtract(a.additive(), b.additive())?;
        let shamir = self.shamir.subtract(a.shamir(), b.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// The additive inverse of a share.
    pub fn negative(&self, a: &ActiveShare) -> ActiveShare {
        ActiveShare::new(self.additive.negative(a.additive()), self.shamir.negative(a.shamir()))
    }

    /// Raw field product of two shares, without FixedPoint rescaling.
    pub fn field_multiply(&self, a: &ActiveShare, b: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.field_multiply(a.additive(), b.additive())?;
        let shamir = self.shamir.field_multiply(a.shamir(), b.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// FixedPoint-aware product of two shares.
    pub fn multiply(&self, a: &ActiveShare, b: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.multiply(a.additive(), b.additive())?;
        let shamir = self.shamir.multiply(a.shamir(), b.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// Dot product of two vector shares.
    pub fn dot(&self, a: &ActiveShare, b: &ActiveShare) -> Result<ActiveShare, Error> {
        let additive = self.additive.dot(a.additive(), b.additive())?;
        let shamir = self.shamir.dot(a.shamir(), b.shamir())?;
        Ok(ActiveShare::new(additive, shamir))
    }

    /// Draws a field element every player agrees on, by having each player
    /// broadcast a locally-drawn element and summing the results. No single
    /// player controls the outcome as long as at least one player's draw is
    /// honest, which is exactly the property a verification coefficient
    /// needs.
    fn public_coin(&self) -> Result<cicada_field::FieldElement, Error> {
        let comm = self.additive.communicator();
        let field = self.additive.field();
        let mut rng = rand::thread_rng();
        let mut bytes = vec![0u8; (field.bits() as usize).div_ceil(8)];
        rng.fill_bytes(&mut bytes);
        let draw = field.element(num_bigint::BigUint::from_bytes_be(&bytes));
        let mine = encode_field_array(field, &FieldArray::scalar(draw));
        let mut sum = FieldArray::scalar(field.element(0u32));
        for payload in comm.allgather(&mine)? {
            let array = decode_field_array(field, Shape::scalar(), &payload)
                .ok_or_else(|| Error::Precondition("malformed coin payload".into()))?;
            sum = field.add(&sum, &array)?;
        }
        Ok(sum.as_scalar().expect("scalar shape").clone())
    }

    /// Verifies a batch of shares at once: draws a public random
    /// coefficient per share, opens the random linear combination through
    /// both halves, and compares. Cheaper than calling [`Self::reveal`] on
    /// every share individually, since disagreement in any single share
    /// shows up in the one combined opening with overwhelming probability.
    pub fn verify_batch(&self, shares: &[ActiveShare]) -> Result<bool, Error> {
        if shares.is_empty() {
            return Ok(true);
        }
        let field = self.additive.field();
        let mut combined_additive = self.additive.constant(0.0, shares[0].shape().clone());
        let mut combined_shamir = self.shamir.constant(0.0, shares[0].shape().clone());
        for share in shares {
            let coefficient = self.public_coin()?;
            // A public scalar times a share is purely local: every player
            // multiplies their own share value by the same known constant.
            let scaled_value = field.multiply(share.additive().value(), &FieldArray::scalar(coefficient.clone()))?;
            let scaled_additive = AdditiveShare::from_local(scaled_value);
            combined_additive = self.additive.add(&combined_additive, &scaled_additive)?;
            let scaled_shamir = self.shamir.basic().scalar_multiply(share.shamir(), &coefficient)?;
            combined_shamir = self.shamir.add(&combined_shamir, &scaled_shamir)?;
        }
        // `reveal` itself raises `Error::Tampered` on disagreement; reaching
        // this point at all means the batch checked out.
        let combined = ActiveShare::new(combined_additive, combined_shamir);
        self.reveal(&combined, None, None)?;
        Ok(true)
    }
}
