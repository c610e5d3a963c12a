//! Pseudo-random zero sharing (PRZS).
//!
//! At construction, each player exchanges a fresh 128-bit seed with its
//! right neighbour and receives one from its left neighbour, giving every
//! player two per-pair deterministic stream generators, `left` and `right`.
//! Each subsequent call to [`Przs::next`] draws one sample from each and
//! returns their difference; because a pair of neighbours share the same
//! seed and call `next` the same number of times, the terms telescope to
//! zero when summed across the whole ring.

use cicada_communicator::{Communicator, Tag};
use cicada_field::{Field, FieldArray, Shape};
use cicada_party::Rank;
use rand::RngCore as _;
use rand_chacha::ChaCha20Rng;
use rand_core::SeedableRng;
use std::sync::Mutex;
use thiserror::Error;

const SEED_LEN: usize = 16;

/// Errors raised while setting up or drawing from a PRZS generator.
#[derive(Debug, Error)]
pub enum Error {
    /// The neighbour seed exchange failed.
    #[error("PRZS seed exchange failed: {0}")]
    SeedExchange(#[from] cicada_communicator::Error),
    /// A peer sent a malformed seed.
    #[error("peer sent a seed of {0} bytes, expected {SEED_LEN}")]
    MalformedSeed(usize),
}

/// Per-player PRZS state: two deterministic generators seeded from a
/// neighbour-seed exchange, fixed for the life of the suite that owns it.
pub struct Przs {
    field: Field,
    left: Mutex<ChaCha20Rng>,
    right: Mutex<ChaCha20Rng>,
}

impl Przs {
    /// Performs the neighbour-seed exchange over `comm` and returns the
    /// resulting generator pair.
    ///
    /// With a single player there is no neighbour to exchange seeds with;
    /// both generators are seeded identically, so `next` always returns
    /// zero, which is the correct PRZS output for a one-player ring.
    pub fn setup(comm: &Communicator, field: Field) -> Result<Self, Error> {
        let world_size = comm.world_size() as u32;
        let own_rank = comm.rank();

        let mut own_seed = [0u8; SEED_LEN];
        rand::thread_rng().fill_bytes(&mut own_seed);

        if world_size == 1 {
            return Ok(Self { field, left: Mutex::new(rng_from_seed(&own_seed)), right: Mutex::new(rng_from_seed(&own_seed)) });
        }

        let right = Rank((own_rank.0 + 1) % world_size);
        let left = Rank((own_rank.0 + world_size - 1) % world_size);

        tracing::debug!(rank = %own_rank, %left, %right, "przs: exchanging neighbour seeds");

        // Even ranks send first and then receive, odd ranks receive then
        // send, so a 2-player ring doesn't deadlock on a mutual blocking
        // send to the same peer.
        let seed_left = if own_rank.0 % 2 == 0 {
            comm.send(right, Tag::PRZS_SEED, &own_seed)?;
            read_seed(comm.recv(left, Tag::PRZS_SEED)?)?
        } else {
            let received = read_seed(comm.recv(left, Tag::PRZS_SEED)?)?;
            comm.send(right, Tag::PRZS_SEED, &own_seed)?;
            received
        };

        Ok(Self { field, left: Mutex::new(rng_from_seed(&seed_left)), right: Mutex::new(rng_from_seed(&own_seed)) })
    }

    /// Draws one PRZS sample of the given shape: `G_L.next(shape) -
    /// G_R.next(shape) mod p`.
    pub fn next(&self, shape: impl Into<Shape>) -> FieldArray {
        let shape = shape.into();
        let left_sample = self.field.uniform(shape.clone(), &mut *self.left.lock().expect("lock poisoned"));
        let right_sample = self.field.uniform(shape, &mut *self.right.lock().expect("lock poisoned"));
        self.field.subtract(&left_sample, &right_sample).expect("both samples share the caller's shape")
    }

    /// Draws one PRZS sample using power-of-two masking rather than
    /// rejection sampling, for callers (e.g. truncation masks) that accept
    /// the small resulting bias in exchange for a constant number of draws.
    pub fn next_pow2(&self, shape: impl Into<Shape>) -> FieldArray {
        let shape = shape.into();
        let left_sample = self.field.uniform_pow2(shape.clone(), &mut *self.left.lock().expect("lock poisoned"));
        let right_sample = self.field.uniform_pow2(shape, &mut *self.right.lock().expect("lock poisoned"));
        self.field.subtract(&left_sample, &right_sample).expect("both samples share the caller's shape")
    }
}

fn read_seed(bytes: Vec<u8>) -> Result<[u8; SEED_LEN], Error> {
    if bytes.len() != SEED_LEN {
        return Err(Error::MalformedSeed(bytes.len()));
    }
    let mut seed = [0u8; SEED_LEN];
    seed.copy_from_slice(&bytes);
    Ok(seed)
}

/// Expands a 128-bit exchanged seed into the 256-bit seed `ChaCha20Rng`
/// requires, by duplicating it. This halves the generator's effective
/// security margin relative to a native 256-bit seed, which is acceptable
/// here since PRZS noise only needs to be unpredictable to an outsider of
/// the pair, not cryptographically independent per generator.
fn rng_from_seed(seed: &[u8; SEED_LEN]) -> ChaCha20Rng {
    let mut expanded = [0u8; 32];
    expanded[..SEED_LEN].copy_from_slice(seed);
    expanded[SEED_LEN..].copy_from_slice(seed);
    ChaCha20Rng::from_seed(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_communicator::{connect, Address};
    use std::{sync::Arc, time::Duration};

    fn ring(world_size: u32) -> Vec<Arc<Communicator>> {
        let base_port = 20_000 + (world_size * 7) as u16;
        let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
        let mut handles = Vec::new();
        for rank in 0..world_size {
            let addresses = addresses.clone();
            let listen_on = addresses[rank as usize].clone();
            handles.push(std::thread::spawn(move || {
                connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("przs-test-{rank}")).expect("bootstrap succeeds")
            }));
        }
        handles.into_iter().map(|h| Arc::new(h.join().expect("bootstrap thread panics"))).collect()
    }

    #[test]
    fn przs_outputs_sum_to_zero_across_a_ring() {
        let field = Field::default();
        let comms = ring(3);
        let mut handles = Vec::new();
        for comm in comms {
            let field = field.clone();
            handles.push(std::thread::spawn(move || {
                let przs = Przs::setup(&comm, field.clone()).expect("setup succeeds");
                przs.next(Shape::vector(4))
            }));
        }
        let outputs: Vec<FieldArray> = handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect();
        let mut total = field.zeros(Shape::vector(4));
        for output in &outputs {
            total = field.add(&total, output).expect("accumulator and output share the same shape");
        }
        assert!(total.values().iter().all(|v| v.is_zero()));
    }
}
