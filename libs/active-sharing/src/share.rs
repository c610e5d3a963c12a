//! The active share type.

use cicada_additive_sharing::AdditiveShare;
use cicada_field::Shape;
use cicada_shamir_sharing::ShamirShare;

/// A secret held simultaneously as an additive share and a Shamir share.
/// Every operation is applied to both in lockstep; disagreement between
/// their openings signals that some player deviated from the protocol.
#[derive(Clone)]
pub struct ActiveShare {
    pub(crate) additive: AdditiveShare,
    pub(crate) shamir: ShamirShare,
}

impl ActiveShare {
    /// Pairs an additive share and a Shamir share of the same secret.
    pub fn new(additive: AdditiveShare, shamir: ShamirShare) -> Self {
        Self { additive, shamir }
    }

    /// The additive half of this share.
    pub fn additive(&self) -> &AdditiveShare {
        &self.additive
    }

    /// The Shamir half of this share.
    pub fn shamir(&self) -> &ShamirShare {
        &self.shamir
    }

    /// The logical shape of the shared secret (both halves always agree on
    /// shape by construction).
    pub fn shape(&self) -> &Shape {
        self.additive.shape()
    }
}
