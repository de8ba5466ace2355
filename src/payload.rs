//! Messages exchanged between the two participants.
//!
//! Each payload is produced by one participant's `create_round*_payload` and
//! consumed by the other's `validate_round*_payload`. How they travel between
//! the two is up to the caller; the crate defines no wire encoding. Fields are
//! private and exposed as borrows, so a payload cannot be altered once built.

use crate::error::{Error, Result};
use crate::zkp::SchnorrProof;
use crypto_bigint::Uint;

fn require_participant_id(participant_id: String) -> Result<String> {
    if participant_id.is_empty() {
        return Err(Error::InvalidArgument("participant id must not be empty"));
    }
    Ok(participant_id)
}

/// The first message: two commitments and a proof for each exponent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round1Payload<const LIMBS: usize> {
    participant_id: String,
    gx1: Uint<LIMBS>,
    gx2: Uint<LIMBS>,
    knowledge_proof_for_x1: SchnorrProof<LIMBS>,
    knowledge_proof_for_x2: SchnorrProof<LIMBS>,
}

impl<const LIMBS: usize> Round1Payload<LIMBS> {
    /// Builds a round-1 payload, failing if `participant_id` is empty.
    pub fn new(
        participant_id: impl Into<String>,
        gx1: Uint<LIMBS>,
        gx2: Uint<LIMBS>,
        knowledge_proof_for_x1: SchnorrProof<LIMBS>,
        knowledge_proof_for_x2: SchnorrProof<LIMBS>,
    ) -> Result<Self> {
        Ok(Self {
            participant_id: require_participant_id(participant_id.into())?,
            gx1,
            gx2,
            knowledge_proof_for_x1,
            knowledge_proof_for_x2,
        })
    }

    /// Id of the sender
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// `g^x1 mod p`
    pub fn gx1(&self) -> &Uint<LIMBS> {
        &self.gx1
    }

    /// `g^x2 mod p`
    pub fn gx2(&self) -> &Uint<LIMBS> {
        &self.gx2
    }

    /// Proof of knowledge of `x1`
    pub fn knowledge_proof_for_x1(&self) -> &SchnorrProof<LIMBS> {
        &self.knowledge_proof_for_x1
    }

    /// Proof of knowledge of `x2`
    pub fn knowledge_proof_for_x2(&self) -> &SchnorrProof<LIMBS> {
        &self.knowledge_proof_for_x2
    }
}

/// The second message: `A = gA^(x2 * s)` and a proof of knowledge of `x2 * s`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round2Payload<const LIMBS: usize> {
    participant_id: String,
    a: Uint<LIMBS>,
    knowledge_proof_for_x2s: SchnorrProof<LIMBS>,
}

impl<const LIMBS: usize> Round2Payload<LIMBS> {
    /// Builds a round-2 payload, failing if `participant_id` is empty.
    pub fn new(
        participant_id: impl Into<String>,
        a: Uint<LIMBS>,
        knowledge_proof_for_x2s: SchnorrProof<LIMBS>,
    ) -> Result<Self> {
        Ok(Self {
            participant_id: require_participant_id(participant_id.into())?,
            a,
            knowledge_proof_for_x2s,
        })
    }

    /// Id of the sender
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// `A`, called `B` by the receiver
    pub fn a(&self) -> &Uint<LIMBS> {
        &self.a
    }

    /// Proof of knowledge of `x2 * s`, relative to the base `gA`
    pub fn knowledge_proof_for_x2s(&self) -> &SchnorrProof<LIMBS> {
        &self.knowledge_proof_for_x2s
    }
}

/// The optional third message: a key confirmation tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round3Payload {
    participant_id: String,
    mac_tag: Box<[u8]>,
}

impl Round3Payload {
    /// Builds a round-3 payload, failing if `participant_id` or `mac_tag` is
    /// empty.
    pub fn new(participant_id: impl Into<String>, mac_tag: impl Into<Box<[u8]>>) -> Result<Self> {
        let mac_tag = mac_tag.into();
        if mac_tag.is_empty() {
            return Err(Error::InvalidArgument("MAC tag must not be empty"));
        }
        Ok(Self {
            participant_id: require_participant_id(participant_id.into())?,
            mac_tag,
        })
    }

    /// Id of the sender
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// The HMAC key confirmation tag
    pub fn mac_tag(&self) -> &[u8] {
        &self.mac_tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crypto_bigint::U1024;

    fn proof() -> SchnorrProof<{ U1024::LIMBS }> {
        SchnorrProof::new(U1024::from_u8(3), U1024::from_u8(4))
    }

    #[test]
    fn test_empty_participant_id_rejected() {
        let expected = Some(Error::InvalidArgument("participant id must not be empty"));
        assert_eq!(
            Round1Payload::new("", U1024::ONE, U1024::ONE, proof(), proof()).err(),
            expected
        );
        assert_eq!(Round2Payload::new("", U1024::ONE, proof()).err(), expected);
        assert_eq!(Round3Payload::new("", vec![1u8]).err(), expected);
    }

    #[test]
    fn test_empty_mac_tag_rejected() {
        assert_eq!(
            Round3Payload::new("alice", Vec::<u8>::new()).err(),
            Some(Error::InvalidArgument("MAC tag must not be empty"))
        );
    }

    #[test]
    fn test_accessors_return_constructor_values() {
        let payload =
            Round1Payload::new("alice", U1024::from_u8(5), U1024::from_u8(6), proof(), proof())
                .expect("valid payload");
        assert_eq!(payload.participant_id(), "alice");
        assert_eq!(payload.gx1(), &U1024::from_u8(5));
        assert_eq!(payload.gx2(), &U1024::from_u8(6));
        assert_eq!(payload.knowledge_proof_for_x1().gv(), &U1024::from_u8(3));

        let payload = Round2Payload::new("bob", U1024::from_u8(7), proof()).expect("valid payload");
        assert_eq!(payload.a(), &U1024::from_u8(7));
        assert_eq!(payload.knowledge_proof_for_x2s().r(), &U1024::from_u8(4));

        let mut tag = vec![9u8, 8, 7];
        let payload = Round3Payload::new("bob", tag.clone()).expect("valid payload");
        tag[0] = 0;
        assert_eq!(payload.mac_tag(), &[9, 8, 7]);
    }
}
