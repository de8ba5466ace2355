//! The per-party J-PAKE state machine.
//!
//! A [`Participant`] owns one side of an exchange. The caller drives it through
//! up to seven calls and carries the payloads to the other side:
//!
//! ```text
//! create_round1_payload     validate_round1_payload(peer round 1)
//! create_round2_payload     validate_round2_payload(peer round 2)
//! calculate_keying_material
//! create_round3_payload(K)  validate_round3_payload(peer round 3, K)
//! ```
//!
//! Within a round, call `create` before `validate`. Validating first is
//! accepted, but it moves the state past `create`, after which the
//! participant can no longer finish the exchange.
//!
//! Round 3 is optional, but without it a password mismatch goes unnoticed
//! until the derived keys are first used.
//!
//! The keying material returned by
//! [`calculate_keying_material`](Participant::calculate_keying_material) is
//! not meant to be used as a session key directly. Run it through a key
//! derivation function first.

use crate::error::{Error, Result};
use crate::group::PrimeOrderGroup;
use crate::payload::{Round1Payload, Round2Payload, Round3Payload};
use crate::primitives;
use crate::zkp;
use crypto_bigint::rand_core::{CryptoRng, RngCore};
use crypto_bigint::Uint;
use digest::core_api::BlockSizeUser;
use digest::Digest;
use sha2::Sha256;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, instrument, warn};
use zeroize::{Zeroize, Zeroizing};

/// Progress of a [`Participant`] through the exchange.
///
/// States only ever move forward. The numeric [`code`](State::code) leaves
/// gaps so that states compare by their position in the protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum State {
    /// Constructed, nothing sent or received
    Initialized,
    /// Round 1 payload created
    Round1Created,
    /// Partner's round 1 payload validated
    Round1Validated,
    /// Round 2 payload created
    Round2Created,
    /// Partner's round 2 payload validated
    Round2Validated,
    /// Keying material calculated
    KeyCalculated,
    /// Round 3 payload created
    Round3Created,
    /// Partner's round 3 payload validated
    Round3Validated,
}

impl State {
    /// Numeric code of the state, `0` for [`State::Initialized`] up to `70`
    /// for [`State::Round3Validated`] in steps of ten.
    pub fn code(&self) -> u8 {
        match self {
            State::Initialized => 0,
            State::Round1Created => 10,
            State::Round1Validated => 20,
            State::Round2Created => 30,
            State::Round2Validated => 40,
            State::KeyCalculated => 50,
            State::Round3Created => 60,
            State::Round3Validated => 70,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Initialized => "initialized",
            State::Round1Created => "round 1 created",
            State::Round1Validated => "round 1 validated",
            State::Round2Created => "round 2 created",
            State::Round2Validated => "round 2 validated",
            State::KeyCalculated => "key calculated",
            State::Round3Created => "round 3 created",
            State::Round3Validated => "round 3 validated",
        };
        f.write_str(name)
    }
}

/// One side of a J-PAKE exchange.
///
/// # Type parameters
/// * `LIMBS`: width of the group's integers, e.g. `U2048::LIMBS`
/// * `R`: the randomness source for the ephemeral exponents and proofs
/// * `D`: the digest used for the proof challenges and key confirmation
///
/// Secret material is wiped as soon as the protocol no longer needs it: the
/// password, `x1`, `x2` and the partner's `B` when the keying material is
/// calculated, the four commitments once round 3 validates. Whatever is left
/// is wiped on drop.
///
/// # Examples
///
/// ```
/// use jpake::{Participant, PrimeOrderGroup};
/// use crypto_bigint::rand_core::OsRng;
///
/// let group = PrimeOrderGroup::sun_jce_1024();
/// let mut alice = Participant::new("alice", "password", &group, OsRng).unwrap();
/// let mut bob = Participant::new("bob", "password", &group, OsRng).unwrap();
///
/// let alice1 = alice.create_round1_payload().unwrap();
/// let bob1 = bob.create_round1_payload().unwrap();
/// alice.validate_round1_payload(&bob1).unwrap();
/// bob.validate_round1_payload(&alice1).unwrap();
///
/// let alice2 = alice.create_round2_payload().unwrap();
/// let bob2 = bob.create_round2_payload().unwrap();
/// alice.validate_round2_payload(&bob2).unwrap();
/// bob.validate_round2_payload(&alice2).unwrap();
///
/// let alice_key = alice.calculate_keying_material().unwrap();
/// let bob_key = bob.calculate_keying_material().unwrap();
/// assert_eq!(alice_key, bob_key);
/// ```
pub struct Participant<const LIMBS: usize, R, D = Sha256> {
    participant_id: String,
    password: Option<Zeroizing<Vec<u8>>>,
    group: PrimeOrderGroup<LIMBS>,
    rng: R,
    x1: Option<Uint<LIMBS>>,
    x2: Option<Uint<LIMBS>>,
    gx1: Option<Uint<LIMBS>>,
    gx2: Option<Uint<LIMBS>>,
    gx3: Option<Uint<LIMBS>>,
    gx4: Option<Uint<LIMBS>>,
    b: Option<Uint<LIMBS>>,
    partner_participant_id: Option<String>,
    state: State,
    digest: PhantomData<D>,
}

impl<const LIMBS: usize, R> Participant<LIMBS, R, Sha256>
where
    R: RngCore + CryptoRng,
{
    /// Creates a participant that hashes with SHA-256.
    ///
    /// # Arguments
    /// * `participant_id`: a non-empty id, different from the partner's
    /// * `password`: the shared secret, non-empty; it is copied
    /// * `group`: the group both participants agreed on
    /// * `rng`: the randomness source
    ///
    /// # Returns
    /// * `Err(Error::InvalidArgument)` - the id or the password is empty
    pub fn new(
        participant_id: impl Into<String>,
        password: &str,
        group: &PrimeOrderGroup<LIMBS>,
        rng: R,
    ) -> Result<Self> {
        Self::with_digest(participant_id, password, group, rng)
    }
}

impl<const LIMBS: usize, R, D> Participant<LIMBS, R, D>
where
    R: RngCore + CryptoRng,
    D: Digest + BlockSizeUser,
{
    /// Creates a participant that hashes with `D`.
    ///
    /// Both sides must use the same digest; a mismatch shows up as a failed
    /// proof in round 1.
    pub fn with_digest(
        participant_id: impl Into<String>,
        password: &str,
        group: &PrimeOrderGroup<LIMBS>,
        rng: R,
    ) -> Result<Self> {
        let participant_id = participant_id.into();
        if participant_id.is_empty() {
            return Err(Error::InvalidArgument("participant id must not be empty"));
        }
        if password.is_empty() {
            return Err(Error::InvalidArgument("password must not be empty"));
        }

        Ok(Self {
            participant_id,
            password: Some(Zeroizing::new(password.as_bytes().to_vec())),
            group: *group,
            rng,
            x1: None,
            x2: None,
            gx1: None,
            gx2: None,
            gx3: None,
            gx4: None,
            b: None,
            partner_participant_id: None,
            state: State::Initialized,
            digest: PhantomData,
        })
    }

    /// This participant's id
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// The current state
    pub fn state(&self) -> State {
        self.state
    }

    /// The group the exchange runs in
    pub fn group(&self) -> &PrimeOrderGroup<LIMBS> {
        &self.group
    }

    /// Generates `x1` and `x2` and returns their commitments with a proof of
    /// knowledge for each.
    ///
    /// Must be called first, and only once.
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn create_round1_payload(&mut self) -> Result<Round1Payload<LIMBS>> {
        const OPERATION: &str = "create_round1_payload";
        self.check_state(OPERATION, None, State::Round1Created)?;

        let x1 = Zeroizing::new(primitives::generate_x1(&self.group, &mut self.rng));
        let x2 = Zeroizing::new(primitives::generate_x2(&self.group, &mut self.rng));
        let gx1 = self.group.mod_p(self.group.g()).pow(&*x1).retrieve();
        let gx2 = self.group.mod_p(self.group.g()).pow(&*x2).retrieve();

        let knowledge_proof_for_x1 = zkp::compute_proof::<LIMBS, D, R>(
            &self.group,
            self.group.g(),
            &gx1,
            &x1,
            &self.participant_id,
            &mut self.rng,
        );
        let knowledge_proof_for_x2 = zkp::compute_proof::<LIMBS, D, R>(
            &self.group,
            self.group.g(),
            &gx2,
            &x2,
            &self.participant_id,
            &mut self.rng,
        );
        let payload = Round1Payload::new(
            self.participant_id.clone(),
            gx1,
            gx2,
            knowledge_proof_for_x1,
            knowledge_proof_for_x2,
        )?;

        self.x1 = Some(*x1);
        self.x2 = Some(*x2);
        self.gx1 = Some(gx1);
        self.gx2 = Some(gx2);
        self.advance(State::Round1Created);
        Ok(payload)
    }

    /// Checks the partner's round 1 payload and stores its commitments.
    ///
    /// # Returns
    /// * `Err(Error::Validation(_))` - the ids are equal, the partner's `gx4`
    ///   is 1, or either proof fails
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn validate_round1_payload(&mut self, payload: &Round1Payload<LIMBS>) -> Result<()> {
        const OPERATION: &str = "validate_round1_payload";
        self.check_state(OPERATION, None, State::Round1Validated)?;

        let checked = primitives::validate_participant_ids_differ(
            &self.participant_id,
            payload.participant_id(),
        )
        .and_then(|()| primitives::validate_ga(payload.gx2()))
        .and_then(|()| {
            zkp::verify_proof::<LIMBS, D>(
                &self.group,
                self.group.g(),
                payload.gx1(),
                payload.knowledge_proof_for_x1(),
                payload.participant_id(),
            )
        })
        .and_then(|()| {
            zkp::verify_proof::<LIMBS, D>(
                &self.group,
                self.group.g(),
                payload.gx2(),
                payload.knowledge_proof_for_x2(),
                payload.participant_id(),
            )
        });
        self.log_rejection(OPERATION, payload.participant_id(), checked)?;

        self.gx3 = Some(*payload.gx1());
        self.gx4 = Some(*payload.gx2());
        self.partner_participant_id = Some(payload.participant_id().to_owned());
        self.advance(State::Round1Validated);
        Ok(())
    }

    /// Computes `A = (gx1 * gx3 * gx4)^(x2 * s)` and a proof of knowledge of
    /// `x2 * s`.
    ///
    /// # Returns
    /// * `Err(Error::InvalidPassword)` - the password reduces to 0 modulo `q`
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn create_round2_payload(&mut self) -> Result<Round2Payload<LIMBS>> {
        const OPERATION: &str = "create_round2_payload";
        self.check_state(OPERATION, Some(State::Round1Validated), State::Round2Created)?;

        let gx1 = self.stored(&self.gx1, OPERATION)?;
        let gx3 = self.stored(&self.gx3, OPERATION)?;
        let gx4 = self.stored(&self.gx4, OPERATION)?;
        let x2 = self.stored(&self.x2, OPERATION)?;
        let password = self
            .password
            .as_ref()
            .ok_or(Error::IllegalState { operation: OPERATION, state: self.state })?;

        let ga = primitives::calculate_ga(&self.group, gx1, gx3, gx4);
        let s = Zeroizing::new(primitives::calculate_s(&self.group, password)?);
        let x2s = Zeroizing::new(primitives::calculate_x2s(&self.group, x2, &s));
        let a = primitives::calculate_a(&self.group, &ga, &x2s);
        let knowledge_proof_for_x2s = zkp::compute_proof::<LIMBS, D, R>(
            &self.group,
            &ga,
            &a,
            &x2s,
            &self.participant_id,
            &mut self.rng,
        );
        let payload = Round2Payload::new(self.participant_id.clone(), a, knowledge_proof_for_x2s)?;

        self.advance(State::Round2Created);
        Ok(payload)
    }

    /// Checks the partner's round 2 payload and stores its `A` as `B`.
    ///
    /// # Returns
    /// * `Err(Error::Validation(_))` - the sender differs from round 1, the
    ///   partner's `gB` is 1, or the proof fails
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn validate_round2_payload(&mut self, payload: &Round2Payload<LIMBS>) -> Result<()> {
        const OPERATION: &str = "validate_round2_payload";
        self.check_state(OPERATION, Some(State::Round1Validated), State::Round2Validated)?;

        let gx1 = self.stored(&self.gx1, OPERATION)?;
        let gx2 = self.stored(&self.gx2, OPERATION)?;
        let gx3 = self.stored(&self.gx3, OPERATION)?;
        let partner_id = self.partner_id(OPERATION)?;

        let gb = primitives::calculate_ga(&self.group, gx3, gx1, gx2);
        let checked = primitives::validate_participant_ids_differ(
            &self.participant_id,
            payload.participant_id(),
        )
        .and_then(|()| {
            primitives::validate_participant_ids_equal(partner_id, payload.participant_id())
        })
        .and_then(|()| primitives::validate_ga(&gb))
        .and_then(|()| {
            zkp::verify_proof::<LIMBS, D>(
                &self.group,
                &gb,
                payload.a(),
                payload.knowledge_proof_for_x2s(),
                payload.participant_id(),
            )
        });
        self.log_rejection(OPERATION, payload.participant_id(), checked)?;

        self.b = Some(*payload.a());
        self.advance(State::Round2Validated);
        Ok(())
    }

    /// Calculates the keying material `K` shared with the partner.
    ///
    /// The password, `x1`, `x2` and `B` are wiped before returning. Both sides
    /// get the same `K` only if they used the same password; this call cannot
    /// tell whether they did.
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn calculate_keying_material(&mut self) -> Result<Uint<LIMBS>> {
        const OPERATION: &str = "calculate_keying_material";
        self.check_state(OPERATION, Some(State::Round2Validated), State::KeyCalculated)?;

        let gx4 = self.stored(&self.gx4, OPERATION)?;
        let x2 = self.stored(&self.x2, OPERATION)?;
        let b = self.stored(&self.b, OPERATION)?;
        let password = self
            .password
            .as_ref()
            .ok_or(Error::IllegalState { operation: OPERATION, state: self.state })?;

        let s = Zeroizing::new(primitives::calculate_s(&self.group, password)?);
        let keying_material = primitives::calculate_keying_material(&self.group, gx4, x2, &s, b);

        self.password = None;
        self.x1.zeroize();
        self.x2.zeroize();
        self.b.zeroize();
        self.advance(State::KeyCalculated);
        Ok(keying_material)
    }

    /// Builds the key confirmation tag for the partner.
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn create_round3_payload(
        &mut self,
        keying_material: &Uint<LIMBS>,
    ) -> Result<Round3Payload> {
        const OPERATION: &str = "create_round3_payload";
        self.check_state(OPERATION, Some(State::KeyCalculated), State::Round3Created)?;

        let mac_tag = primitives::calculate_mac_tag::<LIMBS, D>(
            &self.participant_id,
            self.partner_id(OPERATION)?,
            self.stored(&self.gx1, OPERATION)?,
            self.stored(&self.gx2, OPERATION)?,
            self.stored(&self.gx3, OPERATION)?,
            self.stored(&self.gx4, OPERATION)?,
            keying_material,
        )?;
        let payload = Round3Payload::new(self.participant_id.clone(), mac_tag)?;

        self.advance(State::Round3Created);
        Ok(payload)
    }

    /// Checks the partner's key confirmation tag against `keying_material`.
    ///
    /// On success the four commitments are wiped.
    ///
    /// # Returns
    /// * `Err(Error::Validation(ValidationError::MacTagMismatch))` - the
    ///   partner derived a different key, most likely from a different password
    ///
    /// [`ValidationError::MacTagMismatch`]: crate::ValidationError::MacTagMismatch
    #[instrument(skip_all, fields(participant = %self.participant_id))]
    pub fn validate_round3_payload(
        &mut self,
        payload: &Round3Payload,
        keying_material: &Uint<LIMBS>,
    ) -> Result<()> {
        const OPERATION: &str = "validate_round3_payload";
        self.check_state(OPERATION, Some(State::KeyCalculated), State::Round3Validated)?;

        let gx1 = self.stored(&self.gx1, OPERATION)?;
        let gx2 = self.stored(&self.gx2, OPERATION)?;
        let gx3 = self.stored(&self.gx3, OPERATION)?;
        let gx4 = self.stored(&self.gx4, OPERATION)?;
        let partner_id = self.partner_id(OPERATION)?;

        let checked = primitives::validate_participant_ids_differ(
            &self.participant_id,
            payload.participant_id(),
        )
        .and_then(|()| {
            primitives::validate_participant_ids_equal(partner_id, payload.participant_id())
        })
        .and_then(|()| {
            primitives::validate_mac_tag::<LIMBS, D>(
                &self.participant_id,
                partner_id,
                gx1,
                gx2,
                gx3,
                gx4,
                keying_material,
                payload.mac_tag(),
            )
        });
        self.log_rejection(OPERATION, payload.participant_id(), checked)?;

        self.gx1.zeroize();
        self.gx2.zeroize();
        self.gx3.zeroize();
        self.gx4.zeroize();
        self.advance(State::Round3Validated);
        Ok(())
    }

    /// Fails unless `required <= state < completed`.
    fn check_state(
        &self,
        operation: &'static str,
        required: Option<State>,
        completed: State,
    ) -> Result<()> {
        let too_early = required.is_some_and(|required| self.state < required);
        if too_early || self.state >= completed {
            warn!(%operation, state = %self.state, "operation called out of order");
            return Err(Error::IllegalState { operation, state: self.state });
        }
        Ok(())
    }

    /// A value that an earlier step should have stored.
    ///
    /// Missing values only happen when `validate` ran before `create` in the
    /// same round, so this is reported as a sequencing error.
    fn stored<'a>(
        &self,
        value: &'a Option<Uint<LIMBS>>,
        operation: &'static str,
    ) -> Result<&'a Uint<LIMBS>> {
        value.as_ref().ok_or(Error::IllegalState { operation, state: self.state })
    }

    fn partner_id(&self, operation: &'static str) -> Result<&str> {
        self.partner_participant_id
            .as_deref()
            .ok_or(Error::IllegalState { operation, state: self.state })
    }

    fn log_rejection(
        &self,
        operation: &'static str,
        sender: &str,
        checked: Result<()>,
    ) -> Result<()> {
        if let Err(error) = &checked {
            warn!(%operation, %sender, %error, "payload rejected");
        }
        checked
    }

    fn advance(&mut self, state: State) {
        debug!(from = %self.state, to = %state, "state transition");
        self.state = state;
    }
}

impl<const LIMBS: usize, R, D> fmt::Debug for Participant<LIMBS, R, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Participant")
            .field("participant_id", &self.participant_id)
            .field("partner_participant_id", &self.partner_participant_id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<const LIMBS: usize, R, D> Drop for Participant<LIMBS, R, D> {
    fn drop(&mut self) {
        self.x1.zeroize();
        self.x2.zeroize();
        self.gx1.zeroize();
        self.gx2.zeroize();
        self.gx3.zeroize();
        self.gx4.zeroize();
        self.b.zeroize();
    }
}
