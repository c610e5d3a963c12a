//! Establishing the initial full mesh of connections.
//!
//! Two patterns are supported, "direct" and "rendezvous" bootstrap modes:
//!
//! - **Direct**: every player is handed the full address list up front
//!   (e.g. from a config file or orchestrator) and dials accordingly.
//! - **Rendezvous**: every non-root player only knows the root's address;
//!   the root collects everyone's address and broadcasts the full list
//!   before the mesh is formed.
//!
//! To avoid forming each edge twice, pair `(i, j)` with `i < j` always has
//! `j` dial out and `i` accept.

use crate::{
    address::Address,
    connection::Connection,
    errors::{Error, Result},
    tls::{build_configs, Identity, TrustBundle},
};
use cicada_party::Rank;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    time::{timeout, Duration},
};

use crate::stream::MaybeTlsStream;

/// TLS material for a bootstrap, if mutual TLS is enabled for this mesh.
pub struct TlsMaterial<'a> {
    /// This player's own identity.
    pub identity: &'a Identity,
    /// The certificates this player trusts, keyed by peer rank.
    pub trust: &'a TrustBundle,
}

/// Forms a full mesh given every player's address, indexed by rank.
///
/// Blocks until every edge has been established or `deadline` elapses.
pub async fn bootstrap_direct(
    own_rank: Rank,
    addresses: &[Address],
    listen_on: &Address,
    tls: Option<TlsMaterial<'_>>,
    deadline: Duration,
) -> Result<FxHashMap<Rank, Arc<Connection>>> {
    let world_size = addresses.len();
    let listener = bind(listen_on).await?;

    let (configs, trust) = match tls {
        Some(material) => (Some(build_configs(material.identity, material.trust)?), Some(material.trust)),
        None => (None, None),
    };

    let expected_accepts = addresses.iter().enumerate().filter(|(rank, _)| *rank as u32 > own_rank.0).count();

    let accept_fut = accept_peers(listener, expected_accepts, configs.clone(), trust);
    let dial_fut = dial_peers(own_rank, addresses, configs, trust);

    let (accepted, dialed) = timeout(deadline, futures_join(accept_fut, dial_fut)).await.map_err(|_| Error::BootstrapTimeout)??;

    let mut connections = FxHashMap::default();
    connections.extend(accepted);
    connections.extend(dialed);
    if connections.len() != world_size - 1 {
        return Err(Error::ProtocolError(format!(
            "bootstrap formed {} edges, expected {}",
            connections.len(),
            world_size - 1
        )));
    }
    Ok(connections)
}

/// Rendezvous bootstrap: non-root players only know the root's address.
/// The root gathers every address over a plain handshake connection, then
/// broadcasts the assembled list, after which every player proceeds as in
/// [`bootstrap_direct`].
pub async fn bootstrap_rendezvous(
    own_rank: Rank,
    world_size: usize,
    own_address: &Address,
    root_address: &Address,
    listen_on: &Address,
    tls: Option<TlsMaterial<'_>>,
    deadline: Duration,
) -> Result<FxHashMap<Rank, Arc<Connection>>> {
    let addresses = if own_rank == Rank(0) {
        collect_addresses(world_size, listen_on, own_address.clone(), deadline).await?
    } else {
        fetch_addresses(root_address, own_rank, own_address, world_size, deadline).await?
    };
    bootstrap_direct(own_rank, &addresses, listen_on, tls, deadline).await
}

async fn bind(address: &Address) -> Result<TcpListener> {
    let socket_addr = address
        .socket_addr_string()
        .ok_or_else(|| Error::InvalidConfiguration(format!("cannot listen on {address}: not a bindable TCP address")))?;
    TcpListener::bind(&socket_addr).await.map_err(Error::from)
}

async fn accept_peers(
    listener: TcpListener,
    expected: usize,
    configs: Option<(Arc<rustls::ClientConfig>, Arc<rustls::ServerConfig>)>,
    trust: Option<&TrustBundle>,
) -> Result<Vec<(Rank, Arc<Connection>)>> {
    let mut out = Vec::with_capacity(expected);
    for _ in 0..expected {
        let (mut stream, _peer_addr) = listener.accept().await?;
        let peer_rank = read_rank_handshake(&mut stream).await?;
        let stream = match &configs {
            Some((_, server_config)) => {
                let acceptor = tokio_rustls::TlsAcceptor::from(server_config.clone());
                MaybeTlsStream::TlsServer(Box::new(acceptor.accept(stream).await.map_err(|e| Error::AuthenticationFailed(e.to_string()))?))
            }
            None => MaybeTlsStream::Plain(stream),
        };
        verify_peer_identity(&stream, peer_rank, trust)?;
        out.push((peer_rank, Connection::spawn(peer_rank, stream)));
    }
    Ok(out)
}

async fn dial_peers(
    own_rank: Rank,
    addresses: &[Address],
    configs: Option<(Arc<rustls::ClientConfig>, Arc<rustls::ServerConfig>)>,
    trust: Option<&TrustBundle>,
) -> Result<Vec<(Rank, Arc<Connection>)>> {
    let mut out = Vec::new();
    for (idx, address) in addresses.iter().enumerate() {
        let peer_rank = Rank(idx as u32);
        if peer_rank.0 >= own_rank.0 {
            continue;
        }
        let socket_addr = address
            .socket_addr_string()
            .ok_or_else(|| Error::InvalidConfiguration(format!("cannot dial {address}: not a connectable TCP address")))?;
        let mut stream = TcpStream::connect(&socket_addr).await?;
        write_rank_handshake(&mut stream, own_rank).await?;
        let stream = match &configs {
            Some((client_config, _)) => {
                let connector = tokio_rustls::TlsConnector::from(client_config.clone());
                let server_name = rustls::pki_types::ServerName::try_from(host_of(address)?.to_string())
                    .map_err(|e| Error::AuthenticationFailed(e.to_string()))?;
                MaybeTlsStream::TlsClient(Box::new(connector.connect(server_name, stream).await.map_err(|e| Error::AuthenticationFailed(e.to_string()))?))
            }
            None => MaybeTlsStream::Plain(stream),
        };
        verify_peer_identity(&stream, peer_rank, trust)?;
        out.push((peer_rank, Connection::spawn(peer_rank, stream)));
    }
    Ok(out)
}

/// After a TLS handshake, checks that the peer claiming `peer_rank` over the
/// plaintext rank handshake actually presented `peer_rank`'s pinned
/// certificate. A no-op when TLS is disabled (`trust` is `None`); the
/// plaintext rank is the only identity signal available in that mode.
fn verify_peer_identity(stream: &MaybeTlsStream, peer_rank: Rank, trust: Option<&TrustBundle>) -> Result<()> {
    let Some(trust) = trust else {
        return Ok(());
    };
    let leaf = stream
        .peer_leaf_certificate()
        .ok_or_else(|| Error::AuthenticationFailed(format!("peer claiming rank {peer_rank} presented no certificate")))?;
    trust.verify_rank(peer_rank, &leaf)
}

fn host_of(address: &Address) -> Result<&str> {
    match address {
        Address::Tcp { host, .. } => Ok(host),
        Address::Unix(_) => Err(Error::InvalidConfiguration("TLS requires a TCP address".into())),
    }
}

async fn read_rank_handshake(stream: &mut TcpStream) -> Result<Rank> {
    let mut buf = [0u8; 4];
    stream.read_exact(&mut buf).await?;
    Ok(Rank(u32::from_be_bytes(buf)))
}

async fn write_rank_handshake(stream: &mut TcpStream, rank: Rank) -> Result<()> {
    stream.write_all(&rank.0.to_be_bytes()).await?;
    Ok(())
}

/// Root side of rendezvous: accept `world_size - 1` plaintext connections,
/// each announcing its rank and listen address, then broadcast the
/// assembled address table.
async fn collect_addresses(world_size: usize, listen_on: &Address, own_address: Address, deadline: Duration) -> Result<Vec<Address>> {
    let listener = bind(listen_on).await?;
    let mut table = vec![None; world_size];
    table[0] = Some(own_address);
    let mut streams = Vec::with_capacity(world_size - 1);
    for _ in 1..world_size {
        let (mut stream, _) = timeout(deadline, listener.accept()).await.map_err(|_| Error::BootstrapTimeout)??;
        let rank = read_rank_handshake(&mut stream).await?;
        let address = read_address(&mut stream).await?;
        table[rank.index()] = Some(address);
        streams.push(stream);
    }
    let resolved: Vec<Address> = table.into_iter().collect::<Option<Vec<_>>>().ok_or_else(|| Error::ProtocolError("rendezvous did not hear from every player".into()))?;
    for mut stream in streams {
        for address in &resolved {
            write_address(&mut stream, address).await?;
        }
    }
    Ok(resolved)
}

/// Non-root side of rendezvous: announce this player's rank and address to
/// the root, then read back the full table.
async fn fetch_addresses(root_address: &Address, own_rank: Rank, own_address: &Address, world_size: usize, deadline: Duration) -> Result<Vec<Address>> {
    let socket_addr = root_address
        .socket_addr_string()
        .ok_or_else(|| Error::InvalidConfiguration("rendezvous root address must be a TCP address".into()))?;
    let mut stream = timeout(deadline, TcpStream::connect(&socket_addr)).await.map_err(|_| Error::BootstrapTimeout)??;
    write_rank_handshake(&mut stream, own_rank).await?;
    write_address(&mut stream, own_address).await?;
    let mut table = Vec::with_capacity(world_size);
    for _ in 0..world_size {
        table.push(read_address(&mut stream).await?);
    }
    Ok(table)
}

async fn read_address(stream: &mut TcpStream) -> Result<Address> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    let text = String::from_utf8(buf).map_err(|e| Error::ProtocolError(e.to_string()))?;
    Address::parse(&text).map_err(|e| Error::ProtocolError(e.to_string()))
}

async fn write_address(stream: &mut TcpStream, address: &Address) -> Result<()> {
    let text = address.to_string();
    stream.write_all(&(text.len() as u32).to_be_bytes()).await?;
    stream.write_all(text.as_bytes()).await?;
    Ok(())
}

async fn futures_join<A, B, T, U>(a: A, b: B) -> Result<(T, U)>
where
    A: std::future::Future<Output = Result<T>>,
    B: std::future::Future<Output = Result<U>>,
{
    let (a, b) = tokio::join!(a, b);
    Ok((a?, b?))
}
