//! Stateless building blocks of the J-PAKE exchange.
//!
//! These are the arithmetic steps the [`Participant`](crate::Participant) state
//! machine strings together. They carry no state and perform no sequencing;
//! calling them in the wrong order, or with values from different exchanges,
//! silently produces garbage rather than an error. Most callers want the
//! participant instead.
//!
//! Naming follows the protocol description: `x1`, `x2` are a participant's
//! ephemeral exponents, `gx1`, `gx2` its commitments and `gx3`, `gx4` the
//! commitments received from the other side.

use crate::error::{Error, Result, ValidationError};
use crate::group::PrimeOrderGroup;
use crate::utils::{reduce_twos_complement_be_bytes, to_unsigned_be_bytes};
use crypto_bigint::modular::MontyForm;
use crypto_bigint::rand_core::{CryptoRng, RngCore};
use crypto_bigint::{RandomMod, Uint};
use digest::core_api::BlockSizeUser;
use digest::Digest;
use hmac::{Mac, SimpleHmac};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// Label hashed with the keying material to derive the MAC key
const MAC_KEY_LABEL: &[u8] = b"JPAKE_KC";

/// Label prefixed to the key confirmation MAC input.
///
/// It stands for unilateral key confirmation and is the same for both
/// participants; each side treats itself as the initiator of its own tag.
const KEY_CONFIRMATION_LABEL: &[u8] = b"KC_1_U";

/// Draws `x1` uniformly from `[0, q-1]`.
pub fn generate_x1<const LIMBS: usize, R>(
    group: &PrimeOrderGroup<LIMBS>,
    rng: &mut R,
) -> Uint<LIMBS>
where
    R: RngCore + CryptoRng,
{
    Uint::random_mod(&mut *rng, group.q_nonzero())
}

/// Draws `x2` uniformly from `[1, q-1]`.
///
/// `x2` is later used as a multiplicative blinding factor, so it must not be 0.
pub fn generate_x2<const LIMBS: usize, R>(
    group: &PrimeOrderGroup<LIMBS>,
    rng: &mut R,
) -> Uint<LIMBS>
where
    R: RngCore + CryptoRng,
{
    Uint::random_mod(&mut *rng, group.q_minus_one()).wrapping_add(&Uint::ONE)
}

/// Maps the password to the exponent `s`, reduced modulo `q`.
///
/// The UTF-8 bytes of the password are read as a big-endian two's complement
/// integer. A password whose first byte is 0x80 or above therefore maps to a
/// negative number before reduction. Peers must use the same reading or their
/// keys silently diverge.
///
/// # Returns
/// * `Ok(s)` - `s` in `[1, q-1]`
/// * `Err(Error::InvalidPassword)` - the password reduces to 0, which would make
///   the keying material independent of the password
pub fn calculate_s<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    password: &[u8],
) -> Result<Uint<LIMBS>> {
    let s = reduce_twos_complement_be_bytes(password, group.q_params()).retrieve();
    if s == Uint::ZERO {
        return Err(Error::InvalidPassword);
    }
    Ok(s)
}

/// `gA = gx_a * gx_b * gx_c mod p`.
///
/// The sender of round 2 uses `gx1 * gx3 * gx4`; the receiver mirrors it with
/// `gx3 * gx1 * gx2`.
pub fn calculate_ga<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    gx_a: &Uint<LIMBS>,
    gx_b: &Uint<LIMBS>,
    gx_c: &Uint<LIMBS>,
) -> Uint<LIMBS> {
    (group.mod_p(gx_a) * group.mod_p(gx_b) * group.mod_p(gx_c)).retrieve()
}

/// `x2 * s mod q`
pub fn calculate_x2s<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    x2: &Uint<LIMBS>,
    s: &Uint<LIMBS>,
) -> Uint<LIMBS> {
    (group.mod_q(x2) * group.mod_q(s)).retrieve()
}

/// `A = gA^(x2 * s) mod p`
pub fn calculate_a<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    ga: &Uint<LIMBS>,
    x2s: &Uint<LIMBS>,
) -> Uint<LIMBS> {
    group.mod_p(ga).pow(x2s).retrieve()
}

/// Computes the shared keying material
///
/// ```text
/// K = (B / gx4^(x2 * s))^x2 mod p
///   = ((gx4^(-x2 * s mod q) mod p) * B)^x2 mod p
/// ```
///
/// Both participants arrive at the same `K` exactly when they used the same
/// password. Nothing here can tell whether they did; that is what round 3 is
/// for.
pub fn calculate_keying_material<const LIMBS: usize>(
    group: &PrimeOrderGroup<LIMBS>,
    gx4: &Uint<LIMBS>,
    x2: &Uint<LIMBS>,
    s: &Uint<LIMBS>,
    b: &Uint<LIMBS>,
) -> Uint<LIMBS> {
    let x2s = group.mod_q(x2) * group.mod_q(s);
    let negated = Zeroizing::new((MontyForm::zero(group.q_params()) - x2s).retrieve());
    let blinded = group.mod_p(gx4).pow(&*negated) * group.mod_p(b);
    blinded.pow(x2).retrieve()
}

/// Checks that a combined commitment is not 1.
///
/// Applied to the peer's `gx4` after round 1 and to `gB` after round 2. A value
/// of 1 would remove the peer's contribution from the key.
pub fn validate_ga<const LIMBS: usize>(ga: &Uint<LIMBS>) -> Result<()> {
    if *ga == Uint::ONE {
        return Err(ValidationError::DegenerateCommitment.into());
    }
    Ok(())
}

/// Checks that the two participants are not using the same id.
pub fn validate_participant_ids_differ(participant_id: &str, partner_id: &str) -> Result<()> {
    if participant_id == partner_id {
        return Err(ValidationError::ParticipantIdsEqual.into());
    }
    Ok(())
}

/// Checks that a payload comes from the participant seen in round 1.
pub fn validate_participant_ids_equal(expected_id: &str, received_id: &str) -> Result<()> {
    if expected_id != received_id {
        return Err(ValidationError::ParticipantIdMismatch.into());
    }
    Ok(())
}

/// Computes the key confirmation tag sent in round 3
///
/// ```text
/// mac_key = H(K || "JPAKE_KC")
/// tag     = HMAC(mac_key, "KC_1_U" || participant_id || partner_id || gx1 || gx2 || gx3 || gx4)
/// ```
///
/// Integers are fed as minimal unsigned big-endian bytes and ids as UTF-8, with
/// no length framing. The MAC key is wiped before returning.
///
/// # Arguments
/// * `participant_id`, `partner_id`: the sender's id, then the receiver's
/// * `gx1`, `gx2`: the sender's round-1 commitments
/// * `gx3`, `gx4`: the receiver's round-1 commitments
/// * `keying_material`: the sender's `K`
#[allow(clippy::too_many_arguments)]
pub fn calculate_mac_tag<const LIMBS: usize, D>(
    participant_id: &str,
    partner_id: &str,
    gx1: &Uint<LIMBS>,
    gx2: &Uint<LIMBS>,
    gx3: &Uint<LIMBS>,
    gx4: &Uint<LIMBS>,
    keying_material: &Uint<LIMBS>,
) -> Result<Box<[u8]>>
where
    D: Digest + BlockSizeUser,
{
    let mac_key = calculate_mac_key::<LIMBS, D>(keying_material);
    let mut mac = <SimpleHmac<D> as Mac>::new_from_slice(&mac_key)
        .map_err(|_| Error::InvalidArgument("MAC key length rejected by HMAC"))?;

    mac.update(KEY_CONFIRMATION_LABEL);
    mac.update(participant_id.as_bytes());
    mac.update(partner_id.as_bytes());
    for value in [gx1, gx2, gx3, gx4] {
        mac.update(&to_unsigned_be_bytes(value));
    }

    Ok(mac.finalize().into_bytes().to_vec().into_boxed_slice())
}

/// Checks the tag received in round 3.
///
/// The expected tag is what the partner would have computed: ids swapped and
/// `gx1 <-> gx3`, `gx2 <-> gx4`. Comparison is constant time. A mismatch means
/// the passwords differ or a payload was tampered with; the two cases are not
/// distinguished.
///
/// # Arguments
/// * `participant_id`, `partner_id`: the receiver's id, then the sender's
/// * `gx1`, `gx2`: the receiver's round-1 commitments
/// * `gx3`, `gx4`: the sender's round-1 commitments
/// * `keying_material`: the receiver's `K`
/// * `partner_mac_tag`: the tag from the partner's round-3 payload
#[allow(clippy::too_many_arguments)]
pub fn validate_mac_tag<const LIMBS: usize, D>(
    participant_id: &str,
    partner_id: &str,
    gx1: &Uint<LIMBS>,
    gx2: &Uint<LIMBS>,
    gx3: &Uint<LIMBS>,
    gx4: &Uint<LIMBS>,
    keying_material: &Uint<LIMBS>,
    partner_mac_tag: &[u8],
) -> Result<()>
where
    D: Digest + BlockSizeUser,
{
    let expected = calculate_mac_tag::<LIMBS, D>(
        partner_id,
        participant_id,
        gx3,
        gx4,
        gx1,
        gx2,
        keying_material,
    )?;

    if bool::from(expected.as_ref().ct_eq(partner_mac_tag)) {
        Ok(())
    } else {
        Err(ValidationError::MacTagMismatch.into())
    }
}

/// `H(K || "JPAKE_KC")`
fn calculate_mac_key<const LIMBS: usize, D: Digest>(
    keying_material: &Uint<LIMBS>,
) -> Zeroizing<Vec<u8>> {
    let encoded = Zeroizing::new(to_unsigned_be_bytes(keying_material));
    let mut digest = D::new();
    digest.update(&*encoded);
    digest.update(MAC_KEY_LABEL);
    Zeroizing::new(digest.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_bigint::U1024;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sha2::Sha256;

    const L: usize = U1024::LIMBS;

    fn group() -> PrimeOrderGroup<L> {
        PrimeOrderGroup::sun_jce_1024()
    }

    fn exp_g(group: &PrimeOrderGroup<L>, x: &U1024) -> U1024 {
        group.mod_p(group.g()).pow(x).retrieve()
    }

    mod exponents {
        use super::*;

        #[test]
        fn test_generated_exponents_in_range() {
            let group = group();
            let mut rng = StdRng::seed_from_u64(11);
            for _ in 0..64 {
                let x1 = generate_x1(&group, &mut rng);
                let x2 = generate_x2(&group, &mut rng);
                assert!(x1 < *group.q());
                assert!(x2 < *group.q());
                assert!(x2 > U1024::ZERO);
            }
        }

        #[test]
        fn test_x2_in_tiny_group_is_never_zero() {
            // q = 11: x2 must land in [1, 10]
            let group = PrimeOrderGroup::<{ U1024::LIMBS }>::new_unchecked(
                U1024::from_u8(23),
                U1024::from_u8(11),
                U1024::from_u8(2),
            )
            .expect("toy group");
            let mut rng = StdRng::seed_from_u64(12);
            let mut seen = [false; 11];
            for _ in 0..500 {
                let x2 = generate_x2(&group, &mut rng);
                let index = x2.as_limbs()[0].0 as usize;
                assert!((1..11).contains(&index));
                seen[index] = true;
            }
            assert!(seen[1..].iter().all(|&s| s), "x2 should cover [1, q-1]");
        }
    }

    mod password {
        use super::*;

        #[test]
        fn test_ascii_password_is_big_endian() {
            let group = group();
            let s = calculate_s(&group, b"password").expect("nonzero");
            assert_eq!(s, U1024::from_u64(u64::from_be_bytes(*b"password")));
        }

        #[test]
        fn test_high_bit_password_is_negative() {
            let group = group();
            // "é" is 0xc3 0xa9, read as -(0x10000 - 0xc3a9)
            let s = calculate_s(&group, "é".as_bytes()).expect("nonzero");
            let magnitude = U1024::from_u64(0x10000 - 0xc3a9);
            assert_eq!(s, group.q().wrapping_sub(&magnitude));
        }

        #[test]
        fn test_password_congruent_to_zero_rejected() {
            let group = group();
            let mut q_bytes = to_unsigned_be_bytes(group.q());
            // q starts with 0x97, so prefix a zero byte to keep it positive
            q_bytes.insert(0, 0);
            assert_eq!(calculate_s(&group, &q_bytes), Err(Error::InvalidPassword));
            assert_eq!(calculate_s(&group, b""), Err(Error::InvalidPassword));
        }
    }

    mod keying_material {
        use super::*;

        #[test]
        fn test_both_sides_agree() {
            let group = group();
            let mut rng = StdRng::seed_from_u64(13);
            let s = calculate_s(&group, b"shared secret").expect("nonzero");

            let (x1, x2) = (generate_x1(&group, &mut rng), generate_x2(&group, &mut rng));
            let (x3, x4) = (generate_x1(&group, &mut rng), generate_x2(&group, &mut rng));
            let (gx1, gx2, gx3, gx4) = (
                exp_g(&group, &x1),
                exp_g(&group, &x2),
                exp_g(&group, &x3),
                exp_g(&group, &x4),
            );

            let ga = calculate_ga(&group, &gx1, &gx3, &gx4);
            let a = calculate_a(&group, &ga, &calculate_x2s(&group, &x2, &s));
            let gb = calculate_ga(&group, &gx3, &gx1, &gx2);
            let b = calculate_a(&group, &gb, &calculate_x2s(&group, &x4, &s));

            let alice = calculate_keying_material(&group, &gx4, &x2, &s, &b);
            let bob = calculate_keying_material(&group, &gx2, &x4, &s, &a);
            assert_eq!(alice, bob);

            // K = g^((x1 + x3) * x2 * x4 * s)
            let x1_plus_x3 = group.mod_q(&x1) + group.mod_q(&x3);
            let exponent =
                (x1_plus_x3 * group.mod_q(&x2) * group.mod_q(&x4) * group.mod_q(&s)).retrieve();
            assert_eq!(alice, exp_g(&group, &exponent));
        }

        #[test]
        fn test_different_passwords_diverge() {
            let group = group();
            let mut rng = StdRng::seed_from_u64(14);
            let s_alice = calculate_s(&group, b"correct horse").expect("nonzero");
            let s_bob = calculate_s(&group, b"battery staple").expect("nonzero");

            let (x1, x2) = (generate_x1(&group, &mut rng), generate_x2(&group, &mut rng));
            let (x3, x4) = (generate_x1(&group, &mut rng), generate_x2(&group, &mut rng));
            let (gx1, gx2, gx3, gx4) = (
                exp_g(&group, &x1),
                exp_g(&group, &x2),
                exp_g(&group, &x3),
                exp_g(&group, &x4),
            );
            let a = calculate_a(
                &group,
                &calculate_ga(&group, &gx1, &gx3, &gx4),
                &calculate_x2s(&group, &x2, &s_alice),
            );
            let b = calculate_a(
                &group,
                &calculate_ga(&group, &gx3, &gx1, &gx2),
                &calculate_x2s(&group, &x4, &s_bob),
            );

            let alice = calculate_keying_material(&group, &gx4, &x2, &s_alice, &b);
            let bob = calculate_keying_material(&group, &gx2, &x4, &s_bob, &a);
            assert_ne!(alice, bob);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn test_ga_of_one_rejected() {
            assert_eq!(
                validate_ga(&U1024::ONE),
                Err(Error::Validation(ValidationError::DegenerateCommitment))
            );
            assert!(validate_ga(&U1024::from_u8(2)).is_ok());
        }

        #[test]
        fn test_participant_ids() {
            assert!(validate_participant_ids_differ("alice", "bob").is_ok());
            assert_eq!(
                validate_participant_ids_differ("alice", "alice"),
                Err(Error::Validation(ValidationError::ParticipantIdsEqual))
            );
            assert!(validate_participant_ids_equal("bob", "bob").is_ok());
            assert_eq!(
                validate_participant_ids_equal("bob", "mallory"),
                Err(Error::Validation(ValidationError::ParticipantIdMismatch))
            );
        }
    }

    mod mac_tag {
        use super::*;
        use sha3::Sha3_256;

        fn values() -> [U1024; 5] {
            [
                U1024::from_u64(0x1111),
                U1024::from_u64(0x2222),
                U1024::from_u64(0x3333),
                U1024::from_u64(0x4444),
                U1024::from_u64(0xdead_beef),
            ]
        }

        #[test]
        fn test_tag_matches_manual_hmac() {
            let [gx1, gx2, gx3, gx4, k] = values();
            let tag = calculate_mac_tag::<L, Sha256>("alice", "bob", &gx1, &gx2, &gx3, &gx4, &k)
                .expect("tag");

            let mac_key = Sha256::new()
                .chain_update([0xdeu8, 0xad, 0xbe, 0xef])
                .chain_update(b"JPAKE_KC")
                .finalize();
            let mut mac = <SimpleHmac<Sha256> as Mac>::new_from_slice(&mac_key).expect("key");
            mac.update(b"KC_1_Ualicebob");
            mac.update(&[0x11, 0x11, 0x22, 0x22, 0x33, 0x33, 0x44, 0x44]);
            assert_eq!(&*tag, mac.finalize().into_bytes().as_slice());
            assert_eq!(tag.len(), 32);
        }

        #[test]
        fn test_partner_tag_validates() {
            let [gx1, gx2, gx3, gx4, k] = values();
            // alice sends, bob checks with his own view of the commitments
            let tag = calculate_mac_tag::<L, Sha3_256>("alice", "bob", &gx1, &gx2, &gx3, &gx4, &k)
                .expect("tag");
            assert!(validate_mac_tag::<L, Sha3_256>(
                "bob", "alice", &gx3, &gx4, &gx1, &gx2, &k, &tag
            )
            .is_ok());
        }

        #[test]
        fn test_mismatches_rejected() {
            let [gx1, gx2, gx3, gx4, k] = values();
            let tag = calculate_mac_tag::<L, Sha256>("alice", "bob", &gx1, &gx2, &gx3, &gx4, &k)
                .expect("tag");
            let mismatch = Err(Error::Validation(ValidationError::MacTagMismatch));

            let other_k = k.wrapping_add(&U1024::ONE);
            assert_eq!(
                validate_mac_tag::<L, Sha256>("bob", "alice", &gx3, &gx4, &gx1, &gx2, &other_k, &tag),
                mismatch
            );
            // roles not swapped
            assert_eq!(
                validate_mac_tag::<L, Sha256>("alice", "bob", &gx1, &gx2, &gx3, &gx4, &k, &tag),
                mismatch
            );
            // truncated tag
            assert_eq!(
                validate_mac_tag::<L, Sha256>("bob", "alice", &gx3, &gx4, &gx1, &gx2, &k, &tag[..31]),
                mismatch
            );
        }
    }

    mod fuzz {
        use super::*;
        use quickcheck_macros::quickcheck;

        #[quickcheck]
        fn fuzz_ga_is_symmetric(a: u64, b: u64, c: u64) -> bool {
            let group = group();
            let (a, b, c) = (U1024::from_u64(a), U1024::from_u64(b), U1024::from_u64(c));
            calculate_ga(&group, &a, &b, &c) == calculate_ga(&group, &c, &a, &b)
        }

        #[quickcheck]
        fn fuzz_a_matches_exponent_product(x2: u64, s: u64) -> bool {
            let group = group();
            let (x2, s) = (U1024::from_u64(x2), U1024::from_u64(s));
            // (g^x2)^s == g^(x2 * s mod q)
            let gx2 = exp_g(&group, &x2);
            calculate_a(&group, &gx2, &s) == exp_g(&group, &calculate_x2s(&group, &x2, &s))
        }

        #[quickcheck]
        fn fuzz_password_prefix_zero_is_positive(bytes: Vec<u8>) -> bool {
            let group = group();
            let mut padded = vec![0u8];
            padded.extend_from_slice(&bytes);
            // a leading zero byte never changes an unsigned reading
            let unsigned = crate::utils::reduce_be_bytes(&bytes, group.q_params()).retrieve();
            match calculate_s(&group, &padded) {
                Ok(s) => s == unsigned,
                Err(error) => error == Error::InvalidPassword && unsigned == U1024::ZERO,
            }
        }
    }
}
