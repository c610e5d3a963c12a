//! Internal message tag used for the point-to-point half of [`crate::AdditiveSuite::share`].

use cicada_communicator::Tag;

pub(crate) const SHARE: Tag = Tag(1024);
