//! Shows what a password mismatch looks like: rounds 1 and 2 succeed, the keys
//! silently differ, and only key confirmation notices.

use crypto_bigint::rand_core::OsRng;
use jpake::{Error, Participant, PrimeOrderGroup, ValidationError};
use tracing::{info, warn};

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt().init();

    let group = PrimeOrderGroup::sun_jce_1024();
    let mut alice = Participant::new("alice", "open sesame", &group, OsRng)?;
    let mut bob = Participant::new("bob", "open sesame!", &group, OsRng)?;

    let alice1 = alice.create_round1_payload()?;
    let bob1 = bob.create_round1_payload()?;
    alice.validate_round1_payload(&bob1)?;
    bob.validate_round1_payload(&alice1)?;
    info!("Round 1 validated on both sides");

    let alice2 = alice.create_round2_payload()?;
    let bob2 = bob.create_round2_payload()?;
    alice.validate_round2_payload(&bob2)?;
    bob.validate_round2_payload(&alice2)?;
    info!("Round 2 validated on both sides");

    let alice_key = alice.calculate_keying_material()?;
    let bob_key = bob.calculate_keying_material()?;
    info!("Keys equal: {}", alice_key == bob_key);

    let alice3 = alice.create_round3_payload(&alice_key)?;
    let bob3 = bob.create_round3_payload(&bob_key)?;
    for (name, result) in [
        ("alice", alice.validate_round3_payload(&bob3, &alice_key)),
        ("bob", bob.validate_round3_payload(&alice3, &bob_key)),
    ] {
        match result {
            Err(Error::Validation(ValidationError::MacTagMismatch)) => {
                warn!("{name} rejected the key confirmation tag")
            }
            Err(error) => return Err(error),
            Ok(()) => info!("{name} accepted the key confirmation tag"),
        }
    }
    Ok(())
}
