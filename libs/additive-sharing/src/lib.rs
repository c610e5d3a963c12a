//! n-out-of-n additive secret sharing: every player holds one piece of a
//! secret, the pieces sum to the secret mod `p`, and any player missing
//! means the secret cannot be recovered.

mod errors;
mod share;
mod suite;
mod tags;
mod wire;

pub use errors::Error;
pub use share::AdditiveShare;
pub use suite::AdditiveSuite;

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_communicator::{connect, Address};
    use cicada_encoding::Encoding;
    use cicada_field::{Field, Shape};
    use cicada_party::Rank;
    use std::time::Duration;

    fn ring(world_size: u32, base_port: u16) -> Vec<AdditiveSuite> {
        let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
        let mut handles = Vec::new();
        for rank in 0..world_size {
            let addresses = addresses.clone();
            let listen_on = addresses[rank as usize].clone();
            handles.push(std::thread::spawn(move || {
                let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("additive-test-{rank}")).expect("bootstrap succeeds");
                AdditiveSuite::new(comm, Field::default(), Encoding::fixed_point(16)).expect("przs setup succeeds")
            }));
        }
        handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect()
    }

    #[test]
    fn add_and_reveal_round_trips() {
        let suites = ring(3, 21_000);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let share = suite.share(Rank(0), if suite.communicator().rank() == Rank(0) { Some(&[3.5]) } else { None }, Shape::scalar()).unwrap();
                let constant = suite.constant(1.5, Shape::scalar());
                let sum = suite.add(&share, &constant).unwrap();
                suite.reveal(&sum, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 5.0).abs() < 1e-3, "revealed={revealed}");
        }
    }

    #[test]
    fn multiply_computes_the_product() {
        let suites = ring(3, 21_100);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.communicator().rank();
                let a = suite.share(Rank(0), if rank == Rank(0) { Some(&[3.0]) } else { None }, Shape::scalar()).unwrap();
                let b = suite.share(Rank(1), if rank == Rank(1) { Some(&[4.0]) } else { None }, Shape::scalar()).unwrap();
                let product = suite.multiply(&a, &b).unwrap();
                suite.reveal(&product, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 12.0).abs() < 1e-2, "revealed={revealed}");
        }
    }

    #[test]
    fn less_zero_detects_sign() {
        let suites = ring(3, 21_200);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.communicator().rank();
                let neg = suite.share(Rank(0), if rank == Rank(0) { Some(&[-2.0]) } else { None }, Shape::scalar()).unwrap();
                let indicator = suite.less_zero(&neg).unwrap();
                suite.reveal(&indicator, None, Some(Encoding::Bits)).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert_eq!(revealed, 1.0);
        }
    }

    #[test]
    fn dot_product_matches_expectation() {
        let suites = ring(3, 21_300);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.communicator().rank();
                let a = suite.share(Rank(0), if rank == Rank(0) { Some(&[1.0, 2.0, 3.0]) } else { None }, Shape::vector(3)).unwrap();
                let b = suite.share(Rank(1), if rank == Rank(1) { Some(&[4.0, 5.0, 6.0]) } else { None }, Shape::vector(3)).unwrap();
                let dot = suite.dot(&a, &b).unwrap();
                suite.reveal(&dot, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 32.0).abs() < 1e-2, "revealed={revealed}");
        }
    }
}
