//! Actively secure sharing: an [`AdditiveShare`] and a [`ShamirShare`] of
//! the same secret, kept in lockstep. A deviating player can corrupt one
//! half without detection, but not both identically, so comparing the two
//! openings catches tampering that either sharing alone would miss.

mod errors;
mod share;
mod suite;
mod wire;

pub use cicada_additive_sharing::AdditiveShare;
pub use cicada_shamir_sharing::ShamirShare;
pub use errors::Error;
pub use share::ActiveShare;
pub use suite::ActiveSuite;

#[cfg(test)]
mod tests {
    use super::*;
    use cicada_additive_sharing::AdditiveSuite;
    use cicada_communicator::{connect, Address};
    use cicada_encoding::Encoding;
    use cicada_field::{Field, Shape};
    use cicada_party::Rank;
    use cicada_shamir_sharing::ShamirSuite;
    use std::time::Duration;

    fn ring(world_size: u32, base_port: u16, threshold: u32) -> Vec<ActiveSuite> {
        let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
        let mut handles = Vec::new();
        for rank in 0..world_size {
            let addresses = addresses.clone();
            let additive_listen = addresses[rank as usize].clone();
            let shamir_addresses: Vec<Address> = addresses.iter().map(|a| match a {
                Address::Tcp { host, port } => Address::Tcp { host: host.clone(), port: port.map(|p| p + 1000) },
                other => other.clone(),
            }).collect();
            let shamir_listen = shamir_addresses[rank as usize].clone();
            handles.push(std::thread::spawn(move || {
                let additive_comm = connect(Rank(rank), addresses, additive_listen, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("active-test-additive-{rank}")).expect("additive bootstrap succeeds");
                let shamir_comm = connect(Rank(rank), shamir_addresses, shamir_listen, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("active-test-shamir-{rank}")).expect("shamir bootstrap succeeds");
                let additive = AdditiveSuite::new(additive_comm, Field::default(), Encoding::fixed_point(16)).expect("additive suite builds");
                let shamir = ShamirSuite::new(shamir_comm, Field::default(), Encoding::fixed_point(16), threshold).expect("threshold suits this world size");
                ActiveSuite::new(additive, shamir).expect("world sizes agree")
            }));
        }
        handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect()
    }

    #[test]
    fn share_and_reveal_round_trips() {
        let suites = ring(5, 23_000, 1);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.additive().communicator().rank();
                let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[4.5]) } else { None }, Shape::scalar()).unwrap();
                suite.reveal(&share, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 4.5).abs() < 1e-3, "revealed={revealed}");
        }
    }

    #[test]
    fn multiply_and_add_compose_through_both_halves() {
        let suites = ring(5, 23_100, 1);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.additive().communicator().rank();
                let a = suite.share(Rank(0), if rank == Rank(0) { Some(&[3.0]) } else { None }, Shape::scalar()).unwrap();
                let b = suite.share(Rank(1), if rank == Rank(1) { Some(&[4.0]) } else { None }, Shape::scalar()).unwrap();
                let product = suite.multiply(&a, &b).unwrap();
                let sum = suite.add(&product, &a).unwrap();
                suite.reveal(&sum, None, None).unwrap().unwrap()[0]
            }));
        }
        for handle in handles {
            let revealed = handle.join().unwrap();
            assert!((revealed - 15.0).abs() < 1e-2, "revealed={revealed}");
        }
    }

    #[test]
    fn tampering_with_one_half_is_caught_on_reveal() {
        let suites = ring(5, 23_200, 1);
        let mut handles = Vec::new();
        for suite in suites {
            handles.push(std::thread::spawn(move || {
                let rank = suite.additive().communicator().rank();
                let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[1.0]) } else { None }, Shape::scalar()).unwrap();
                let share = if rank == Rank(2) {
                    // Corrupt only the additive half on one player: the two
                    // openings should now disagree.
                    let field = suite.additive().field();
                    let bumped = field.add(share.additive().value(), &cicada_field::FieldArray::scalar(field.element(1u32))).unwrap();
                    ActiveShare::new(AdditiveShare::from_local(bumped), share.shamir().clone())
                } else {
                    share
                };
                suite.reveal(&share, None, None)
            }));
        }
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.into_iter().any(|r| r.is_err()), "tampering with one player's additive share must be detected");
    }
}
