//! Non-interactive Schnorr proofs of knowledge of a discrete logarithm.
//!
//! The prover shows it knows `x` such that `gx = generator^x mod p` without
//! revealing `x`. The interactive challenge is replaced by a hash (Fiat-Shamir)
//! over the generator, the commitment, the public value and the prover's id:
//!
//! ```text
//! v  <- [0, q-1]
//! gv  = generator^v mod p
//! h   = H(generator || gv || gx || owner_id)
//! r   = v - x * h mod q
//! ```
//!
//! The verifier accepts when `generator^r * gx^h mod p == gv`. Every element of
//! the hash input is framed by its length as a four-byte big-endian integer,
//! and the digest is read as a big-endian two's complement integer, so a digest
//! whose first byte is 0x80 or above yields a negative challenge.
//! Binding the owner id into the hash stops a proof being replayed under a
//! different identity.

use crate::error::{Result, ValidationError};
use crate::group::PrimeOrderGroup;
use crate::utils::{reduce_twos_complement_be_bytes, to_unsigned_be_bytes};
use crypto_bigint::modular::MontyForm;
use crypto_bigint::rand_core::{CryptoRng, RngCore};
use crypto_bigint::{RandomMod, Uint};
use digest::Digest;
use zeroize::Zeroize;

/// A Schnorr proof `(g^v, r)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SchnorrProof<const LIMBS: usize> {
    gv: Uint<LIMBS>,
    r: Uint<LIMBS>,
}

impl<const LIMBS: usize> SchnorrProof<LIMBS> {
    /// Assembles a proof from its two components, e.g. after decoding one
    /// received from the network.
    pub fn new(gv: Uint<LIMBS>, r: Uint<LIMBS>) -> Self {
        Self { gv, r }
    }

    /// The commitment `generator^v mod p`
    pub fn gv(&self) -> &Uint<LIMBS> {
        &self.gv
    }

    /// The response `v - x * h mod q`
    pub fn r(&self) -> &Uint<LIMBS> {
        &self.r
    }
}

/// Proves knowledge of `x` where `gx = generator^x mod p`.
///
/// # Arguments
/// * `group`: the group the exchange runs in
/// * `generator`: the base of the exponentiation; `g` in round 1, `gA` in round 2
/// * `gx`: the public value `generator^x mod p`
/// * `x`: the secret exponent, in `[0, q-1]`
/// * `owner_id`: the participant id of the prover
/// * `rng`: the source for the one-time exponent `v`
pub fn compute_proof<const LIMBS: usize, D, R>(
    group: &PrimeOrderGroup<LIMBS>,
    generator: &Uint<LIMBS>,
    gx: &Uint<LIMBS>,
    x: &Uint<LIMBS>,
    owner_id: &str,
    rng: &mut R,
) -> SchnorrProof<LIMBS>
where
    D: Digest,
    R: RngCore + CryptoRng,
{
    let mut v = Uint::random_mod(&mut *rng, group.q_nonzero());
    let gv = group.mod_p(generator).pow(&v).retrieve();
    let h = challenge::<LIMBS, D>(group, generator, &gv, gx, owner_id);
    let r = (group.mod_q(&v) - group.mod_q(x) * h).retrieve();
    v.zeroize();

    SchnorrProof { gv, r }
}

/// Checks a proof that the owner of `gx` knows its discrete log to `generator`.
///
/// Fails with [`ValidationError::ZeroKnowledgeProof`] unless all of the
/// following hold:
///
/// 1. `0 < gx < p`
/// 2. `gx^q mod p == 1`, i.e. `gx` lies in the order-`q` subgroup
/// 3. `generator^r * gx^h mod p == gv` for the recomputed challenge `h`
///
/// The error never says which of the checks failed.
pub fn verify_proof<const LIMBS: usize, D>(
    group: &PrimeOrderGroup<LIMBS>,
    generator: &Uint<LIMBS>,
    gx: &Uint<LIMBS>,
    proof: &SchnorrProof<LIMBS>,
    owner_id: &str,
) -> Result<()>
where
    D: Digest,
{
    let in_range = *gx > Uint::ZERO && gx < group.p();
    let valid = in_range
        && group.mod_p(gx).pow(group.q()).retrieve() == Uint::ONE
        && {
            let h = challenge::<LIMBS, D>(group, generator, &proof.gv, gx, owner_id).retrieve();
            let lhs = group.mod_p(generator).pow(&proof.r) * group.mod_p(gx).pow(&h);
            lhs.retrieve() == proof.gv
        };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::ZeroKnowledgeProof.into())
    }
}

/// `H(generator || gv || gx || owner_id)` read as a signed integer and reduced
/// modulo `q`
fn challenge<const LIMBS: usize, D: Digest>(
    group: &PrimeOrderGroup<LIMBS>,
    generator: &Uint<LIMBS>,
    gv: &Uint<LIMBS>,
    gx: &Uint<LIMBS>,
    owner_id: &str,
) -> MontyForm<LIMBS> {
    let mut digest = D::new();
    update_with_length(&mut digest, &to_unsigned_be_bytes(generator));
    update_with_length(&mut digest, &to_unsigned_be_bytes(gv));
    update_with_length(&mut digest, &to_unsigned_be_bytes(gx));
    update_with_length(&mut digest, owner_id.as_bytes());
    reduce_twos_complement_be_bytes(&digest.finalize(), group.q_params())
}

fn update_with_length<D: Digest>(digest: &mut D, bytes: &[u8]) {
    digest.update((bytes.len() as u32).to_be_bytes());
    digest.update(bytes);
}
