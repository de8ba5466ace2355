#![no_main]
use crypto_bigint::rand_core::OsRng;
use crypto_bigint::U1024;
use jpake::{Participant, PrimeOrderGroup, Round1Payload, Round2Payload, SchnorrProof, State};
use libfuzzer_sys::fuzz_target;

const WIDTH: usize = U1024::BYTES;

/// Reads up to `WIDTH` bytes as a big-endian integer, zero padded on the left.
fn take_uint(data: &mut &[u8]) -> U1024 {
    let len = data.len().min(WIDTH);
    let mut buf = [0u8; WIDTH];
    buf[WIDTH - len..].copy_from_slice(&data[..len]);
    *data = &data[len..];
    U1024::from_be_slice(&buf)
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let group = PrimeOrderGroup::sun_jce_1024();
    let id_len = (data[0] as usize % 16) + 1;
    let rest = &data[1..];
    let (id_bytes, mut values) = rest.split_at(id_len.min(rest.len()));
    let sender = String::from_utf8_lossy(id_bytes).into_owned();

    let gx1 = take_uint(&mut values);
    let gx2 = take_uint(&mut values);
    let proof1 = SchnorrProof::new(take_uint(&mut values), take_uint(&mut values));
    let proof2 = SchnorrProof::new(take_uint(&mut values), take_uint(&mut values));

    // Forged round 1 payload: a Schnorr proof over random values must not verify
    let mut alice = Participant::new("alice", "password", &group, OsRng).expect("alice");
    alice.create_round1_payload().expect("alice round 1");
    if let Ok(forged) = Round1Payload::new(sender.as_str(), gx1, gx2, proof1, proof2) {
        assert!(alice.validate_round1_payload(&forged).is_err());
        assert_eq!(alice.state(), State::Round1Created);
    }

    // Forged round 2 payload after an honest round 1
    let mut bob = Participant::new("bob", "password", &group, OsRng).expect("bob");
    let mut carol = Participant::new("carol", "password", &group, OsRng).expect("carol");
    let carol1 = carol.create_round1_payload().expect("carol round 1");
    bob.create_round1_payload().expect("bob round 1");
    bob.validate_round1_payload(&carol1).expect("bob validates round 1");
    bob.create_round2_payload().expect("bob round 2");

    if let Ok(forged) = Round2Payload::new("carol", gx1, proof1) {
        assert!(bob.validate_round2_payload(&forged).is_err());
        assert_eq!(bob.state(), State::Round2Created);
    }
});
