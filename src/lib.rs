//! Cicada: a fault-tolerant library for Secure Multiparty Computation.
//!
//! This facade crate re-exports the workspace's `libs/*` crates behind a
//! single [`prelude`] and does not itself add protocol logic: `cicada-field`
//! and `cicada-encoding` are pure value types, `cicada-communicator` owns
//! the network, `cicada-przs` generates correlated randomness, and the
//! three sharing crates (`cicada-additive-sharing`, `cicada-shamir-sharing`,
//! `cicada-active-sharing`) build the suites callers actually construct a
//! computation against.
//!
//! A typical session: connect a [`Communicator`](cicada_communicator::Communicator),
//! build a suite bound to it, `share` secrets, run operations, `reveal` results.

/// Re-exports of every type a caller needs to build and run a computation,
/// without reaching into individual `libs/*` crates by name.
pub mod prelude {
    pub use cicada_active_sharing::{ActiveShare, ActiveSuite, Error as ActiveError};
    pub use cicada_additive_sharing::{AdditiveShare, AdditiveSuite, Error as AdditiveError};
    pub use cicada_communicator::{connect, connect_rendezvous, Address, Communicator, Error as CommunicatorError, Tag, TlsMaterial};
    pub use cicada_encoding::Encoding;
    pub use cicada_field::{Field, FieldArray, FieldElement, Shape};
    pub use cicada_party::{PartyId, Rank};
    pub use cicada_przs::Przs;
    pub use cicada_shamir_sharing::{Error as ShamirError, ShamirBasicSuite, ShamirShare, ShamirSuite};
}
