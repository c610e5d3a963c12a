//! k-out-of-n threshold secret sharing via Shamir polynomials: any
//! `threshold + 1` players can reconstruct a secret, any `threshold` or
//! fewer learn nothing about it.

mod basic;
mod errors;
mod lagrange;
mod share;
mod suite;
mod tags;
mod wire;

pub use basic::ShamirBasicSuite;
pub use errors::Error;
pub use share::ShamirShare;
pub use suite::ShamirSuite;

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_communicator::{connect, Address};
    use cicada_encoding::Encoding;
    use cicada_field::{Field, Shape};
    use cicada_party::Rank;
    use std::time::Duration;

    fn ring(world_size: u32, base_port: u16, threshold: u32) -> Vec<ShamirSuite> {
        let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
        let mut handles = Vec::new();
        for rank in 0..world_size {
            let addresses = addresses.clone();
            let listen_on = addresses[rank as usize].clone();
            handles.push(std::thread::spawn(move || {
                let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("shamir-test-{rank}")).expect("bootstrap succeeds");
                ShamirSuite::new(comm, Field::default(), Encoding::fixed_point(16), threshold).expect("threshold suits this world size")
            }));
        }
        handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect()
    }

    #[test]
    fn share_and_reveal_round_trips() {
        let suites = ring(5, 22_000, 1);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.basic().communicator().rank();
                let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[9.25]) } else { None }, Shape::scalar()).unwrap();
                suite.reveal(&share, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 9.25).abs() < 1e-3, "revealed={revealed}");
        }
    }

    #[test]
    fn multiply_computes_the_product() {
        let suites = ring(5, 22_100, 1);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.basic().communicator().rank();
                let a = suite.share(Rank(0), if rank == Rank(0) { Some(&[6.0]) } else { None }, Shape::scalar()).unwrap();
                let b = suite.share(Rank(1), if rank == Rank(1) { Some(&[7.0]) } else { None }, Shape::scalar()).unwrap();
                let product = suite.multiply(&a, &b).unwrap();
                suite.reveal(&product, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 42.0).abs() < 1e-2, "revealed={revealed}");
        }
    }

    #[test]
    fn thresholds_that_cannot_reconstruct_after_multiply_are_rejected() {
        let world_size = 3u32;
        let base_port = 22_200u16;
        let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
        let mut handles = Vec::new();
        for rank in 0..world_size {
            let addresses = addresses.clone();
            let listen_on = addresses[rank as usize].clone();
            handles.push(std::thread::spawn(move || {
                connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("shamir-threshold-test-{rank}")).expect("bootstrap succeeds")
            }));
        }
        let comms: Vec<_> = handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect();
        let comm = comms.into_iter().next().unwrap();
        // world_size 3 supports threshold 1 (2*1+1 = 3) but not threshold 2.
        assert!(ShamirSuite::new(comm, Field::default(), Encoding::fixed_point(16), 2).is_err());
    }
}
