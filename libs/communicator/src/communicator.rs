//! The `Communicator`: a synchronous, MPI-flavoured handle to a fixed set of
//! peer connections.
//!
//! Every public operation blocks the calling thread; internally each one
//! drives a small `async` body to completion on a dedicated multi-threaded
//! Tokio runtime owned by the communicator. Callers never see a `Future`.

use crate::{
    connection::Connection,
    errors::{Error, Result},
    tag::Tag,
};
use cicada_party::Rank;
use rustc_hash::FxHashMap;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
    time::Duration,
};

/// A live handle to a fixed group of players, able to exchange point-to-point
/// messages and run collectives among them.
pub struct Communicator {
    rank: Rank,
    world_size: usize,
    name: String,
    connections: FxHashMap<Rank, Arc<Connection>>,
    default_timeout: RwLock<Option<Duration>>,
    revoked: AtomicBool,
    freed: AtomicBool,
    runtime: Arc<tokio::runtime::Runtime>,
}

impl Communicator {
    pub(crate) fn new(
        rank: Rank,
        world_size: usize,
        name: String,
        connections: FxHashMap<Rank, Arc<Connection>>,
        default_timeout: Option<Duration>,
        runtime: Arc<tokio::runtime::Runtime>,
    ) -> Self {
        Self {
            rank,
            world_size,
            name,
            connections,
            default_timeout: RwLock::new(default_timeout),
            revoked: AtomicBool::new(false),
            freed: AtomicBool::new(false),
            runtime,
        }
    }

    /// This player's rank within the communicator.
    pub fn rank(&self) -> Rank {
        self.rank
    }

    /// The number of players in the communicator.
    pub fn world_size(&self) -> usize {
        self.world_size
    }

    /// A human-readable name for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn check_live(&self) -> Result<()> {
        if self.freed.load(Ordering::SeqCst) {
            return Err(Error::Freed);
        }
        if self.revoked.load(Ordering::SeqCst) {
            return Err(Error::Revoked);
        }
        Ok(())
    }

    fn connection(&self, peer: Rank) -> Result<&Arc<Connection>> {
        self.connections
            .get(&peer)
            .ok_or_else(|| Error::PreconditionError(format!("rank {peer} is not a member of this communicator")))
    }

    fn timeout(&self) -> Option<Duration> {
        *self.default_timeout.read().expect("lock poisoned")
    }

    /// Runs `body` with the communicator's default timeout replaced for the
    /// lifetime of the call, restoring the previous timeout on return.
    pub fn with_timeout<T>(&self, timeout: Option<Duration>, body: impl FnOnce() -> Result<T>) -> Result<T> {
        let previous = {
            let mut guard = self.default_timeout.write().expect("lock poisoned");
            std::mem::replace(&mut *guard, timeout)
        };
        let result = body();
        *self.default_timeout.write().expect("lock poisoned") = previous;
        result
    }

    /// Sends `payload` to `dest` tagged `tag`, blocking until the write
    /// completes (not until it is received).
    pub fn send(&self, dest: Rank, tag: Tag, payload: &[u8]) -> Result<()> {
        self.check_live()?;
        let connection = self.connection(dest)?.clone();
        let rank = self.rank.0;
        let payload = payload.to_vec();
        self.runtime.block_on(connection.send(tag, rank, payload))
    }

    /// Blocks until a message tagged `tag` arrives from `src`, or the
    /// effective timeout elapses.
    pub fn recv(&self, src: Rank, tag: Tag) -> Result<Vec<u8>> {
        self.check_live()?;
        let connection = self.connection(src)?.clone();
        let timeout = self.timeout();
        self.runtime.block_on(connection.recv(tag, timeout))
    }

    /// All ranks other than this player's own, in ascending order.
    fn other_ranks(&self) -> Vec<Rank> {
        (0..self.world_size as u32).map(Rank).filter(|r| *r != self.rank).collect()
    }

    /// Sends `data` from `root` to every player; every player (including
    /// `root`) returns the same bytes.
    pub fn broadcast(&self, root: Rank, data: Option<Vec<u8>>) -> Result<Vec<u8>> {
        self.check_live()?;
        if self.rank == root {
            let payload = data.ok_or_else(|| Error::PreconditionError("root must supply data to broadcast".into()))?;
            for peer in self.other_ranks() {
                self.send(peer, Tag::BROADCAST, &payload)?;
            }
            Ok(payload)
        } else {
            self.recv(root, Tag::BROADCAST)
        }
    }

    /// Collects one payload per player at `root`; returns `None` elsewhere.
    pub fn gather(&self, root: Rank, data: &[u8]) -> Result<Option<Vec<Vec<u8>>>> {
        self.check_live()?;
        if self.rank != root {
            self.send(root, Tag::GATHER, data)?;
            return Ok(None);
        }
        let mut results = vec![Vec::new(); self.world_size];
        results[self.rank.index()] = data.to_vec();
        for peer in self.other_ranks() {
            results[peer.index()] = self.recv(peer, Tag::GATHER)?;
        }
        Ok(Some(results))
    }

    /// Subset variant of [`Communicator::gather`]: only players listed in
    /// `sources` contribute. Players outside `sources` (and outside `root`)
    /// send nothing and are unaffected by the call. The returned vector is
    /// still indexed by rank and sized to the whole world, but only the
    /// entries named in `sources` are populated; every other entry is empty.
    pub fn gatherv(&self, root: Rank, data: &[u8], sources: &[Rank]) -> Result<Option<Vec<Vec<u8>>>> {
        self.check_live()?;
        if self.rank != root {
            if sources.contains(&self.rank) {
                self.send(root, Tag::GATHERV, data)?;
            }
            return Ok(None);
        }
        let mut results = vec![Vec::new(); self.world_size];
        for &source in sources {
            if source == self.rank {
                results[source.index()] = data.to_vec();
            } else {
                results[source.index()] = self.recv(source, Tag::GATHERV)?;
            }
        }
        Ok(Some(results))
    }

    /// Equivalent to `gather` followed by `broadcast`: every player ends up
    /// with every player's contribution.
    pub fn allgather(&self, data: &[u8]) -> Result<Vec<Vec<u8>>> {
        self.check_live()?;
        let root = Rank(0);
        let gathered = self.gather(root, data)?;
        let gathered = match gathered {
            Some(values) => {
                let encoded = encode_vecs(&values);
                for peer in self.other_ranks() {
                    self.send(peer, Tag::ALLGATHER, &encoded)?;
                }
                values
            }
            None => decode_vecs(&self.recv(root, Tag::ALLGATHER)?)?,
        };
        Ok(gathered)
    }

    /// Distributes one payload per player from `root`; every non-root player
    /// returns its own share.
    pub fn scatter(&self, root: Rank, data: Option<Vec<Vec<u8>>>) -> Result<Vec<u8>> {
        self.check_live()?;
        if self.rank == root {
            let values = data.ok_or_else(|| Error::PreconditionError("root must supply data to scatter".into()))?;
            if values.len() != self.world_size {
                return Err(Error::PreconditionError("scatter data must have one entry per player".into()));
            }
            for peer in self.other_ranks() {
                self.send(peer, Tag::SCATTER, &values[peer.index()])?;
            }
            Ok(values[self.rank.index()].clone())
        } else {
            self.recv(root, Tag::SCATTER)
        }
    }

    /// Subset variant of [`Communicator::scatter`]: `root` sends only to the
    /// players listed in `destinations`, and `values` must have exactly one
    /// entry per destination, in the same order. Players outside
    /// `destinations` (other than `root`, if included) receive nothing and
    /// get back `None`.
    pub fn scatterv(&self, root: Rank, data: Option<Vec<Vec<u8>>>, destinations: &[Rank]) -> Result<Option<Vec<u8>>> {
        self.check_live()?;
        if self.rank == root {
            let values = data.ok_or_else(|| Error::PreconditionError("root must supply data to scatterv".into()))?;
            if values.len() != destinations.len() {
                return Err(Error::PreconditionError("scatterv data must have one entry per destination".into()));
            }
            let mut own_value = None;
            for (destination, value) in destinations.iter().zip(values.iter()) {
                if *destination == self.rank {
                    own_value = Some(value.clone());
                } else {
                    self.send(*destination, Tag::SCATTERV, value)?;
                }
            }
            Ok(own_value)
        } else if destinations.contains(&self.rank) {
            Ok(Some(self.recv(root, Tag::SCATTERV)?))
        } else {
            Ok(None)
        }
    }

    /// Blocks every player until all have reached this call.
    pub fn barrier(&self) -> Result<()> {
        self.check_live()?;
        let root = Rank(0);
        if self.rank == root {
            for peer in self.other_ranks() {
                self.recv(peer, Tag::BARRIER)?;
            }
            for peer in self.other_ranks() {
                self.send(peer, Tag::BARRIER, &[])?;
            }
        } else {
            self.send(root, Tag::BARRIER, &[])?;
            self.recv(root, Tag::BARRIER)?;
        }
        Ok(())
    }

    /// Marks this communicator poisoned: every in-flight and future blocking
    /// call on every player returns [`Error::Revoked`]. Irreversible.
    pub fn revoke(&self) -> Result<()> {
        self.check_live()?;
        self.revoked.store(true, Ordering::SeqCst);
        for peer in self.other_ranks() {
            let connection = self.connections[&peer].clone();
            let _ = self.runtime.block_on(connection.send(Tag::REVOKE, self.rank.0, Vec::new()));
        }
        Ok(())
    }

    /// Releases this communicator's connections. Further calls return
    /// [`Error::Freed`].
    pub fn free(&self) {
        if self.freed.swap(true, Ordering::SeqCst) {
            return;
        }
        for connection in self.connections.values() {
            connection.close();
        }
    }

    /// Rebuilds a communicator over the subset of current members who pass
    /// `colors.get(rank) == Some(color)`, renumbering ranks in ascending
    /// order of parent rank.
    pub fn split(&self, color: Option<u32>) -> Result<Option<Communicator>> {
        self.check_live()?;
        let my_color = color;
        let all_colors = self.allgather(&encode_color(my_color))?;
        let mut members: Vec<Rank> = Vec::new();
        for (idx, encoded) in all_colors.iter().enumerate() {
            if decode_color(encoded) == my_color && my_color.is_some() {
                members.push(Rank(idx as u32));
            }
        }
        if my_color.is_none() {
            return Ok(None);
        }
        members.sort();
        let new_rank = members.iter().position(|r| *r == self.rank).expect("self is a member of its own color");
        let mut connections = FxHashMap::default();
        for (new_idx, old_rank) in members.iter().enumerate() {
            if *old_rank == self.rank {
                continue;
            }
            if let Some(connection) = self.connections.get(old_rank) {
                connections.insert(Rank(new_idx as u32), connection.clone());
            }
        }
        Ok(Some(Communicator::new(
            Rank(new_rank as u32),
            members.len(),
            format!("{}-split", self.name),
            connections,
            self.timeout(),
            self.runtime.clone(),
        )))
    }

    /// Rebuilds a communicator excluding `failed`, renumbering the survivors
    /// in ascending order of parent rank.
    pub fn shrink(&self, failed: &[Rank]) -> Result<Communicator> {
        self.check_live()?;
        let survivors: Vec<Rank> = (0..self.world_size as u32).map(Rank).filter(|r| !failed.contains(r)).collect();
        let new_rank = survivors.iter().position(|r| *r == self.rank).ok_or_else(|| Error::PreconditionError("this rank was excluded from its own shrink".into()))?;
        let mut connections = FxHashMap::default();
        for (new_idx, old_rank) in survivors.iter().enumerate() {
            if *old_rank == self.rank {
                continue;
            }
            if let Some(connection) = self.connections.get(old_rank) {
                connections.insert(Rank(new_idx as u32), connection.clone());
            }
        }
        Ok(Communicator::new(
            Rank(new_rank as u32),
            survivors.len(),
            format!("{}-shrink", self.name),
            connections,
            self.timeout(),
            self.runtime.clone(),
        ))
    }
}

fn encode_color(color: Option<u32>) -> Vec<u8> {
    match color {
        Some(value) => value.to_be_bytes().to_vec(),
        None => Vec::new(),
    }
}

fn decode_color(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 4 {
        return None;
    }
    Some(u32::from_be_bytes(bytes.try_into().expect("checked length")))
}

fn encode_vecs(values: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.extend_from_slice(&(values.len() as u32).to_be_bytes());
    for value in values {
        buf.extend_from_slice(&(value.len() as u32).to_be_bytes());
        buf.extend_from_slice(value);
    }
    buf
}

fn decode_vecs(bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let bad = || Error::ProtocolError("malformed allgather payload".into());
    if bytes.len() < 4 {
        return Err(bad());
    }
    let count = u32::from_be_bytes(bytes[0..4].try_into().map_err(|_| bad())?) as usize;
    let mut offset = 4;
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        if bytes.len() < offset + 4 {
            return Err(bad());
        }
        let len = u32::from_be_bytes(bytes[offset..offset + 4].try_into().map_err(|_| bad())?) as usize;
        offset += 4;
        if bytes.len() < offset + len {
            return Err(bad());
        }
        values.push(bytes[offset..offset + len].to_vec());
        offset += len;
    }
    Ok(values)
}
