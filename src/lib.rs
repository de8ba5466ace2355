//! # jpake: Password Authenticated Key Exchange by Juggling
//!
//! jpake is a Rust library implementing the J-PAKE protocol over a prime-order
//! subgroup of the multiplicative group modulo a prime `p`. Two parties who
//! share a low-entropy password derive a strong shared secret without revealing
//! the password to each other or to anyone watching the exchange.
//!
//! ## Quick Start
//!
//! Add jpake to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! jpake = "0.1.0"
//! ```
//!
//! ## Protocol
//!
//! Each side is a [`Participant`]. The caller moves the payloads between the
//! two participants, over whatever transport it likes:
//!
//! | Round | Alice                                   | Bob                                     |
//! |-------|-----------------------------------------|-----------------------------------------|
//! | 1     | `create_round1_payload` -> bob          | `create_round1_payload` -> alice        |
//! |       | `validate_round1_payload`               | `validate_round1_payload`               |
//! | 2     | `create_round2_payload` -> bob          | `create_round2_payload` -> alice        |
//! |       | `validate_round2_payload`               | `validate_round2_payload`               |
//! |       | `calculate_keying_material`             | `calculate_keying_material`             |
//! | 3     | `create_round3_payload` -> bob          | `create_round3_payload` -> alice        |
//! |       | `validate_round3_payload`               | `validate_round3_payload`               |
//!
//! Round 3 (key confirmation) is optional. It is the only step that notices
//! a password mismatch.
//!
//! ## Basic Usage
//!
//! ```rust
//! use jpake::{Error, Participant, PrimeOrderGroup, ValidationError};
//! use crypto_bigint::rand_core::OsRng;
//!
//! # fn main() -> Result<(), Error> {
//! let group = PrimeOrderGroup::nist_2048();
//! let mut alice = Participant::new("alice", "correct horse", &group, OsRng)?;
//! let mut bob = Participant::new("bob", "correct horse", &group, OsRng)?;
//!
//! let (alice1, bob1) = (alice.create_round1_payload()?, bob.create_round1_payload()?);
//! alice.validate_round1_payload(&bob1)?;
//! bob.validate_round1_payload(&alice1)?;
//!
//! let (alice2, bob2) = (alice.create_round2_payload()?, bob.create_round2_payload()?);
//! alice.validate_round2_payload(&bob2)?;
//! bob.validate_round2_payload(&alice2)?;
//!
//! let alice_key = alice.calculate_keying_material()?;
//! let bob_key = bob.calculate_keying_material()?;
//!
//! let alice3 = alice.create_round3_payload(&alice_key)?;
//! let bob3 = bob.create_round3_payload(&bob_key)?;
//! alice.validate_round3_payload(&bob3, &alice_key)?;
//! bob.validate_round3_payload(&alice3, &bob_key)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Components
//!
//! - [`Participant`]: the state machine driving one side of the exchange
//! - [`Round1Payload`], [`Round2Payload`], [`Round3Payload`]: the messages
//! - [`PrimeOrderGroup`]: the group `(p, q, g)`, with three predefined choices
//! - [`zkp`]: Schnorr proofs of knowledge of a discrete logarithm
//! - [`primitives`]: the stateless arithmetic underneath the participant
//!
//! ## Security
//!
//! The keying material is a group element, not a uniformly random key; derive
//! session keys from it with a KDF. Secret exponents and the password are wiped
//! with [`zeroize`] as soon as the protocol is done with them. The password is
//! mapped to an exponent by reading its UTF-8 bytes as a two's complement
//! integer, see [`primitives::calculate_s`].
//!
//! ## Further Reading
//!
//! F. Hao, P. Ryan, "Password Authenticated Key Exchange by Juggling", 2008,
//! and [RFC 8236](https://www.rfc-editor.org/rfc/rfc8236).

mod error;
mod group;
mod participant;
mod payload;
pub mod primitives;
pub(crate) mod utils;
pub mod zkp;

pub use crate::error::{Error, Result, ValidationError};
pub use crate::group::{GroupName, PrimeOrderGroup};
pub use crate::participant::{Participant, State};
pub use crate::payload::{Round1Payload, Round2Payload, Round3Payload};
pub use crate::zkp::SchnorrProof;
