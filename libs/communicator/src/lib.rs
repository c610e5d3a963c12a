//! Socket-based, MPI-flavoured communicator: point-to-point messaging,
//! collectives, and dynamic membership over a netstring-framed wire
//! protocol, optionally secured with mutual TLS.
//!
//! The public API is entirely synchronous: a small Tokio runtime is held
//! internally per communicator and driven with `block_on`.

mod address;
mod bootstrap;
mod communicator;
mod config;
mod connection;
mod errors;
mod stream;
mod tag;
mod tls;
mod wire;

pub use address::{Address, InvalidAddress};
pub use bootstrap::TlsMaterial;
pub use communicator::Communicator;
pub use config::{env, CommunicatorConfig, EnvConfigError};
pub use errors::{Error, Result};
pub use tag::{InvalidUserTag, Tag};
pub use tls::{Identity, TrustBundle};

use cicada_party::Rank;
use std::time::Duration;

/// Establishes a communicator given every player's address up front.
pub fn connect(
    rank: Rank,
    addresses: Vec<Address>,
    listen_on: Address,
    default_timeout: Option<Duration>,
    tls: Option<TlsMaterial<'_>>,
    bootstrap_deadline: Duration,
    name: impl Into<String>,
) -> Result<Communicator> {
    let runtime = std::sync::Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(Error::from)?,
    );
    let world_size = addresses.len();
    let connections = runtime.block_on(bootstrap::bootstrap_direct(rank, &addresses, &listen_on, tls, bootstrap_deadline))?;
    Ok(Communicator::new(rank, world_size, name.into(), connections, default_timeout, runtime))
}

/// Establishes a communicator via rendezvous: every non-root player only
/// needs the root's address up front.
#[allow(clippy::too_many_arguments)]
pub fn connect_rendezvous(
    rank: Rank,
    world_size: usize,
    own_address: Address,
    root_address: Address,
    listen_on: Address,
    default_timeout: Option<Duration>,
    tls: Option<TlsMaterial<'_>>,
    bootstrap_deadline: Duration,
    name: impl Into<String>,
) -> Result<Communicator> {
    let runtime = std::sync::Arc::new(
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(Error::from)?,
    );
    let connections = runtime.block_on(bootstrap::bootstrap_rendezvous(
        rank,
        world_size,
        &own_address,
        &root_address,
        &listen_on,
        tls,
        bootstrap_deadline,
    ))?;
    Ok(Communicator::new(rank, world_size, name.into(), connections, default_timeout, runtime))
}
