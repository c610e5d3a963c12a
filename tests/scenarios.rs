//! Cross-crate integration tests for six concrete end-to-end scenarios,
//! each run with `world_size=3` (or as noted) over real loopback TCP
//! communicators.

use cicada::prelude::*;
use std::time::Duration;

fn additive_ring(world_size: u32, base_port: u16) -> Vec<AdditiveSuite> {
    let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
    let mut handles = Vec::new();
    for rank in 0..world_size {
        let addresses = addresses.clone();
        let listen_on = addresses[rank as usize].clone();
        handles.push(std::thread::spawn(move || {
            let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-additive-{rank}")).expect("bootstrap succeeds");
            AdditiveSuite::new(comm, Field::default(), Encoding::fixed_point(16)).expect("suite builds")
        }));
    }
    handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect()
}

fn active_ring(world_size: u32, base_port: u16, threshold: u32) -> Vec<ActiveSuite> {
    let addresses: Vec<Address> = (0..world_size).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(base_port + i as u16) }).collect();
    let mut handles = Vec::new();
    for rank in 0..world_size {
        let addresses = addresses.clone();
        let additive_listen = addresses[rank as usize].clone();
        let shamir_addresses: Vec<Address> = addresses
            .iter()
            .map(|a| match a {
                Address::Tcp { host, port } => Address::Tcp { host: host.clone(), port: port.map(|p| p + 1000) },
                other => other.clone(),
            })
            .collect();
        let shamir_listen = shamir_addresses[rank as usize].clone();
        handles.push(std::thread::spawn(move || {
            let additive_comm = connect(Rank(rank), addresses, additive_listen, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-active-additive-{rank}")).expect("bootstrap succeeds");
            let shamir_comm = connect(Rank(rank), shamir_addresses, shamir_listen, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-active-shamir-{rank}")).expect("bootstrap succeeds");
            let additive = AdditiveSuite::new(additive_comm, Field::default(), Encoding::fixed_point(16)).expect("additive suite builds");
            let shamir = ShamirSuite::new(shamir_comm, Field::default(), Encoding::fixed_point(16), threshold).expect("threshold suits this world size");
            ActiveSuite::new(additive, shamir).expect("world sizes agree")
        }));
    }
    handles.into_iter().map(|h| h.join().expect("worker thread panics")).collect()
}

/// Scenario 1: Millionaires. Inputs 10 (rank 0), 20 (rank 1), 15 (rank 2);
/// the richest player is found by pairwise `less` comparisons. Result
/// revealed to all: rank 1.
#[test]
fn millionaires() {
    let suites = additive_ring(3, 24_000);
    let mut handles = Vec::new();
    for suite in suites {
        handles.push(std::thread::spawn(move || {
            let rank = suite.communicator().rank();
            let values = [10.0, 20.0, 15.0];
            let mine = values[rank.index()];
            let shares: Vec<_> = (0..3).map(|src| suite.share(Rank(src), if rank == Rank(src) { Some(&[mine]) } else { None }, Shape::scalar()).unwrap()).collect();

            // `less` yields an unscaled `{0,1}` share, so gating a
            // FixedPoint-encoded update by it is a `field_multiply` (plain
            // field product), not a rescaling `multiply`.
            let mut richest_index = suite.constant(0.0, Shape::scalar());
            let mut richest_value = shares[0].clone();
            for (i, candidate) in shares.iter().enumerate().skip(1) {
                let candidate_is_greater = suite.less(&richest_value, candidate).unwrap();
                let index_diff = suite.subtract(&suite.constant(i as f64, Shape::scalar()), &richest_index).unwrap();
                let update = suite.field_multiply(&candidate_is_greater, &index_diff).unwrap();
                richest_index = suite.add(&richest_index, &update).unwrap();

                let value_diff = suite.subtract(candidate, &richest_value).unwrap();
                let value_update = suite.field_multiply(&candidate_is_greater, &value_diff).unwrap();
                richest_value = suite.add(&richest_value, &value_update).unwrap();
            }
            suite.reveal(&richest_index, None, None).unwrap().unwrap()[0]
        }));
    }
    for handle in handles {
        let revealed = handle.join().unwrap();
        assert!((revealed - 1.0).abs() < 1e-2, "revealed={revealed}");
    }
}

/// Scenario 2: dot product of `[1,2,3]` (rank 0) and `[4,5,6]` (rank 1),
/// revealed as `32.0` within fixed-point tolerance.
#[test]
fn dot_product() {
    let suites = additive_ring(3, 24_100);
    let mut handles = Vec::new();
    for suite in suites {
        handles.push(std::thread::spawn(move || {
            let rank = suite.communicator().rank();
            let a = suite.share(Rank(0), if rank == Rank(0) { Some(&[1.0, 2.0, 3.0]) } else { None }, Shape::vector(3)).unwrap();
            let b = suite.share(Rank(1), if rank == Rank(1) { Some(&[4.0, 5.0, 6.0]) } else { None }, Shape::vector(3)).unwrap();
            let product = suite.dot(&a, &b).unwrap();
            suite.reveal(&product, None, None).unwrap().unwrap()[0]
        }));
    }
    for handle in handles {
        let revealed = handle.join().unwrap();
        assert!((revealed - 32.0).abs() <= 2e-5_f64.max(1e-2), "revealed={revealed}");
    }
}

/// Scenario 3: rank 0 shares `x=42`; rank 1 tampers with its additive
/// component by adding `65536` (one unit at `precision=16`). `reveal` must
/// raise a tamper error; an untampered run must still yield `42.0`.
#[test]
fn active_tamper_detection() {
    let suites = active_ring(3, 24_200, 1);
    let mut handles = Vec::new();
    for suite in suites {
        handles.push(std::thread::spawn(move || {
            let rank = suite.additive().communicator().rank();
            let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[42.0]) } else { None }, Shape::scalar()).unwrap();
            let share = if rank == Rank(1) {
                let field = suite.additive().field();
                let bumped = field.add(share.additive().value(), &FieldArray::scalar(field.element(65_536u32))).unwrap();
                ActiveShare::new(AdditiveShare::from_local(bumped), share.shamir().clone())
            } else {
                share
            };
            suite.reveal(&share, None, None)
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.into_iter().any(|r| r.is_err()), "a tampered additive component must be detected on reveal");

    let suites = active_ring(3, 24_210, 1);
    let mut handles = Vec::new();
    for suite in suites {
        handles.push(std::thread::spawn(move || {
            let rank = suite.additive().communicator().rank();
            let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[42.0]) } else { None }, Shape::scalar()).unwrap();
            suite.reveal(&share, None, None).unwrap().unwrap()[0]
        }));
    }
    for handle in handles {
        let revealed = handle.join().unwrap();
        assert!((revealed - 42.0).abs() < 1e-3, "revealed={revealed}");
    }
}

/// Scenario 4: every player draws one PRZS sample of shape `(4,)`; summing
/// the three per-player outputs across the ring telescopes to zero.
#[test]
fn przs_cancellation() {
    let addresses: Vec<Address> = (0..3).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(24_300 + i as u16) }).collect();
    let mut handles = Vec::new();
    for rank in 0..3u32 {
        let addresses = addresses.clone();
        let listen_on = addresses[rank as usize].clone();
        handles.push(std::thread::spawn(move || {
            let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-przs-{rank}")).expect("bootstrap succeeds");
            let field = Field::default();
            let przs = Przs::setup(&comm, field.clone()).expect("przs setup succeeds");
            (field, przs.next(Shape::vector(4)))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let (field, _) = &results[0];
    let mut total = field.zeros(Shape::vector(4));
    for (_, sample) in &results {
        total = field.add(&total, sample).unwrap();
    }
    for value in total.values() {
        assert_eq!(value.value(), &num_bigint::BigUint::from(0u32));
    }
}

/// Scenario 5: field order 251, `FixedPoint(precision=4)`, secret `3.5`;
/// big-endian bit decomposition is `[0,0,1,1,1,0,0,0]` (3.5 encodes to
/// `56 = 0b00111000` at 4 bits of fractional precision).
#[test]
fn bit_decompose_scenario() {
    let addresses: Vec<Address> = (0..3).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(24_400 + i as u16) }).collect();
    let mut handles = Vec::new();
    for rank in 0..3u32 {
        let addresses = addresses.clone();
        let listen_on = addresses[rank as usize].clone();
        handles.push(std::thread::spawn(move || {
            let field = Field::new(num_bigint::BigUint::from(251u32)).expect("251 is prime");
            let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-bits-{rank}")).expect("bootstrap succeeds");
            let suite = AdditiveSuite::new(comm, field, Encoding::fixed_point(4)).expect("suite builds");
            let share = suite.share(Rank(0), if rank == Rank(0) { Some(&[3.5]) } else { None }, Shape::scalar()).unwrap();
            let bits = suite.bit_decompose(&share, Some(8)).unwrap();
            suite.reveal(&bits, None, Some(Encoding::Bits)).unwrap().unwrap()
        }));
    }
    let expected = [0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0];
    for handle in handles {
        let revealed = handle.join().unwrap();
        for (got, want) in revealed.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 1e-6, "revealed={revealed:?}");
        }
    }
}

/// Scenario 6: world=4, rank 3 exits before a collective; surviving ranks
/// {0,1,2} `shrink` into a new 3-player communicator whose rank order
/// matches their ascending parent ranks.
#[test]
fn shrink_after_failure() {
    let addresses: Vec<Address> = (0..4).map(|i| Address::Tcp { host: "127.0.0.1".into(), port: Some(24_500 + i as u16) }).collect();
    let mut handles = Vec::new();
    for rank in 0..4u32 {
        let addresses = addresses.clone();
        let listen_on = addresses[rank as usize].clone();
        handles.push(std::thread::spawn(move || {
            let comm = connect(Rank(rank), addresses, listen_on, Some(Duration::from_secs(5)), None, Duration::from_secs(5), format!("scenario-shrink-{rank}")).expect("bootstrap succeeds");
            if rank == 3 {
                drop(comm);
                return None;
            }
            let survivors = comm.shrink(&[Rank(3)]).expect("shrink succeeds among survivors");
            Some((rank, survivors.rank(), survivors.world_size()))
        }));
    }
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in results {
        if let Some((parent_rank, new_rank, new_world_size)) = result {
            assert_eq!(new_world_size, 3);
            assert_eq!(new_rank.index() as u32, parent_rank);
        }
    }
}
