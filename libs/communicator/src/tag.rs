//! Message tags.
//!
//! Collectives each occupy one reserved tag, backed by straightforward
//! per-tag FIFO queues rather than a fancy scheduler.

/// A message tag: either one of the reserved collective tags, an internal
/// tag used by PRZS setup, or a user tag (`>= 1024`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag(pub u16);

impl Tag {
    /// `ALLGATHER` collective.
    pub const ALLGATHER: Tag = Tag(1);
    /// `BARRIER` collective.
    pub const BARRIER: Tag = Tag(2);
    /// `BROADCAST` collective.
    pub const BROADCAST: Tag = Tag(3);
    /// `GATHER` collective.
    pub const GATHER: Tag = Tag(4);
    /// `GATHERV` collective.
    pub const GATHERV: Tag = Tag(5);
    /// `REVOKE` poison frame.
    pub const REVOKE: Tag = Tag(6);
    /// `SCATTER` collective.
    pub const SCATTER: Tag = Tag(7);
    /// `SCATTERV` collective.
    pub const SCATTERV: Tag = Tag(8);
    /// `SPLIT` membership mutation.
    pub const SPLIT: Tag = Tag(9);
    /// `SHRINK` membership mutation.
    pub const SHRINK: Tag = Tag(10);
    /// `LOGSYNC` reserved tag.
    pub const LOGSYNC: Tag = Tag(11);
    /// Internal tag used for PRZS neighbour-seed exchange.
    pub const PRZS_SEED: Tag = Tag(12);

    /// The first tag value available to user `send`/`recv` calls.
    pub const USER_TAG_BASE: u16 = 1024;

    /// Whether this tag falls in the reserved range (`< 1024`).
    pub fn is_reserved(&self) -> bool {
        self.0 < Self::USER_TAG_BASE
    }

    /// Constructs a user tag, rejecting values that collide with the
    /// reserved range.
    pub fn user(value: u16) -> Result<Tag, InvalidUserTag> {
        if value < Self::USER_TAG_BASE {
            return Err(InvalidUserTag(value));
        }
        Ok(Tag(value))
    }
}

/// A user-supplied tag collided with the reserved tag range.
#[derive(Debug, thiserror::Error)]
#[error("tag {0} collides with the reserved tag range (< {base})", base = Tag::USER_TAG_BASE)]
pub struct InvalidUserTag(pub u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_tags_are_recognized() {
        assert!(Tag::BARRIER.is_reserved());
        assert!(!Tag::user(1024).unwrap().is_reserved());
    }

    #[test]
    fn user_tags_below_base_are_rejected() {
        assert!(Tag::user(5).is_err());
    }
}
