//! Party identity and rank bookkeeping.
//!
//! `PartyId` is an opaque, hashable, orderable identity independent of a
//! communicator's current rank assignment. Rank is derived by sorting:
//! `Rank(i)` is the position of the `i`-th smallest `PartyId` in a member
//! list.

use std::fmt;
use thiserror::Error;

/// Opaque identifier for one player, stable across a communicator's life and
/// across `split`/`shrink` operations that carry it forward.
#[derive(Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PartyId(Vec<u8>);

impl PartyId {
    /// Constructs a party id directly from bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl fmt::Debug for PartyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartyId({self})")
    }
}

impl AsRef<[u8]> for PartyId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for PartyId {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<u32> for PartyId {
    fn from(rank: u32) -> Self {
        Self(rank.to_be_bytes().to_vec())
    }
}

impl From<usize> for PartyId {
    fn from(rank: usize) -> Self {
        Self(rank.to_le_bytes().to_vec())
    }
}

/// `rank ∈ [0, world_size)`: a player's position within a particular
/// communicator, immutable for that communicator's life.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rank(pub u32);

impl Rank {
    /// This rank as a plain index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<usize> for Rank {
    fn from(value: usize) -> Self {
        Self(value as u32)
    }
}

/// Deterministically assigns ranks to a set of party ids by ascending sort
/// order, so `split`/`shrink` derive child ranks in ascending order of
/// their parent ranks.
#[derive(Debug, Clone)]
pub struct PartyRoster {
    parties: Vec<PartyId>,
}

impl PartyRoster {
    /// Builds a roster, sorting the given parties into rank order.
    pub fn new(mut parties: Vec<PartyId>) -> Result<Self, TooManyParties> {
        parties.sort();
        parties.dedup();
        if parties.len() > u32::MAX as usize {
            return Err(TooManyParties);
        }
        Ok(Self { parties })
    }

    /// The number of parties in this roster (the world size).
    pub fn len(&self) -> usize {
        self.parties.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    /// The rank assigned to a party id, if it is a member.
    pub fn rank_of(&self, party: &PartyId) -> Option<Rank> {
        self.parties.iter().position(|p| p == party).map(Rank::from)
    }

    /// The party id assigned to a rank, if in range.
    pub fn party_at(&self, rank: Rank) -> Option<&PartyId> {
        self.parties.get(rank.index())
    }

    /// All party ids in rank order.
    pub fn parties(&self) -> &[PartyId] {
        &self.parties
    }
}

/// More parties were supplied than ranks can represent.
#[derive(Debug, Error)]
#[error("too many parties")]
pub struct TooManyParties;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_follow_ascending_party_id_order() {
        let roster = PartyRoster::new(vec![PartyId::from(42u32), PartyId::from(1337u32), PartyId::from(13u32)]).unwrap();
        assert_eq!(roster.rank_of(&PartyId::from(13u32)), Some(Rank(0)));
        assert_eq!(roster.rank_of(&PartyId::from(42u32)), Some(Rank(1)));
        assert_eq!(roster.rank_of(&PartyId::from(1337u32)), Some(Rank(2)));
        assert_eq!(roster.party_at(Rank(0)), Some(&PartyId::from(13u32)));
    }

    #[test]
    fn duplicate_parties_are_collapsed() {
        let roster = PartyRoster::new(vec![PartyId::from(1u32), PartyId::from(1u32)]).unwrap();
        assert_eq!(roster.len(), 1);
    }
}
