//! Runs a full J-PAKE exchange between two in-process participants.
//!
//! Settings are read from `demos/key_exchange.toml`; confy writes a default
//! file there on first run.

use crypto_bigint::rand_core::OsRng;
use crypto_bigint::Uint;
use jpake::{GroupName, Participant, PrimeOrderGroup, State};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Configuration for the exchange
#[derive(Debug, Serialize, Deserialize)]
struct ExchangeConfig {
    /// Name of a predefined group, e.g. `nist-2048`
    group: String,
    /// Id and password of the first participant
    alice_id: String,
    alice_password: String,
    /// Id and password of the second participant
    bob_id: String,
    bob_password: String,
    /// Whether to run the key confirmation round
    confirm_key: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            group: GroupName::Nist2048.to_string(),
            alice_id: "alice".to_owned(),
            alice_password: "correct horse battery staple".to_owned(),
            bob_id: "bob".to_owned(),
            bob_password: "correct horse battery staple".to_owned(),
            confirm_key: true,
        }
    }
}

/// Drives both participants through the exchange and reports whether their
/// keys agree.
fn run_exchange<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    cfg: &ExchangeConfig,
) -> Result<bool, jpake::Error> {
    let mut alice = Participant::new(cfg.alice_id.as_str(), &cfg.alice_password, group, OsRng)?;
    let mut bob = Participant::new(cfg.bob_id.as_str(), &cfg.bob_password, group, OsRng)?;

    debug!("Round 1");
    let alice1 = alice.create_round1_payload()?;
    let bob1 = bob.create_round1_payload()?;
    alice.validate_round1_payload(&bob1)?;
    bob.validate_round1_payload(&alice1)?;

    debug!("Round 2");
    let alice2 = alice.create_round2_payload()?;
    let bob2 = bob.create_round2_payload()?;
    alice.validate_round2_payload(&bob2)?;
    bob.validate_round2_payload(&alice2)?;

    let alice_key = alice.calculate_keying_material()?;
    let bob_key = bob.calculate_keying_material()?;
    info!("Alice's keying material: {}", short_hex(&alice_key));
    info!("Bob's keying material:   {}", short_hex(&bob_key));

    if !cfg.confirm_key {
        return Ok(alice_key == bob_key);
    }

    debug!("Round 3");
    let alice3 = alice.create_round3_payload(&alice_key)?;
    let bob3 = bob.create_round3_payload(&bob_key)?;
    let alice_confirmed = alice.validate_round3_payload(&bob3, &alice_key).is_ok();
    let bob_confirmed = bob.validate_round3_payload(&alice3, &bob_key).is_ok();
    debug!("Final states: alice {}, bob {}", alice.state(), bob.state());

    Ok(alice_confirmed && bob_confirmed && alice.state() == State::Round3Validated)
}

/// The leading 64 bits of a value, enough to eyeball agreement
fn short_hex<const LIMBS: usize>(value: &Uint<LIMBS>) -> String {
    let top = value.as_limbs().last().map(|limb| limb.0).unwrap_or_default();
    format!("{top:016x}...")
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().init();
    info!("Begin J-PAKE exchange");

    let config_path = PathBuf::from("demos/key_exchange.toml");
    let cfg: ExchangeConfig = confy::load_path(config_path)?;
    debug!("Loaded config: {:?}", cfg);

    let group_name = GroupName::from_str(&cfg.group)?;
    info!("Using group {} ({} bits)", group_name, group_name.modulus_bits());

    let agreed = match group_name {
        GroupName::SunJce1024 => run_exchange(&PrimeOrderGroup::sun_jce_1024(), &cfg)?,
        GroupName::Nist2048 => run_exchange(&PrimeOrderGroup::nist_2048(), &cfg)?,
        GroupName::Nist3072 => run_exchange(&PrimeOrderGroup::nist_3072(), &cfg)?,
    };

    if agreed {
        info!("Both participants derived the same key");
    } else {
        warn!("Key confirmation failed, the passwords do not match");
    }
    Ok(())
}
