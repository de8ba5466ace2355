//! Prime-order subgroups of `Z_p^*` used as the setting for J-PAKE.
//!
//! A group is described by three integers:
//!
//! - `p`: a large prime modulus
//! - `q`: a prime dividing `p - 1`, the order of the subgroup
//! - `g`: a generator of the order-`q` subgroup, so `g^q = 1 (mod p)`
//!
//! Both participants of an exchange must use the same group. The group is never
//! carried in a payload, so a mismatch shows up only as a failed proof in round 1.
//!
//! All modular arithmetic is done in Montgomery form through `crypto_bigint`'s
//! `MontyForm`, with parameters for both `p` and `q` computed once when the group
//! is built. The three predefined groups are the parameter sets J-PAKE
//! deployments commonly agree on; they are built without rerunning the
//! primality checks.

use crate::error::{Error, Result};
use crypto_bigint::modular::{MontyForm, MontyParams};
use crypto_bigint::rand_core::{CryptoRng, OsRng, RngCore};
use crypto_bigint::{NonZero, Odd, RandomMod, Uint, U1024, U2048, U256, U3072};
use std::fmt;
use std::str::FromStr;

/// Number of Miller-Rabin rounds used when validating `p` and `q`
const MILLER_RABIN_ROUNDS: usize = 20;

const SUN_JCE_1024_P: U1024 = U1024::from_be_hex(concat!(
    "fd7f53811d75122952df4a9c2eece4e7f611b7523cef4400c31e3f80b6512669",
    "455d402251fb593d8d58fabfc5f5ba30f6cb9b556cd7813b801d346ff26660b7",
    "6b9950a5a49f9fe8047b1022c24fbba9d7feb7c61bf83b57e7c6a8a6150f04fb",
    "83f6d3c51ec3023554135a169132f675f3ae2b61d72aeff22203199dd14801c7",
));
const SUN_JCE_1024_Q: U256 = U256::from_be_hex("0000000000000000000000009760508f15230bccb292b982a2eb840bf0581cf5");
const SUN_JCE_1024_G: U1024 = U1024::from_be_hex(concat!(
    "f7e1a085d69b3ddecbbcab5c36b857b97994afbbfa3aea82f9574c0b3d078267",
    "5159578ebad4594fe67107108180b449167123e84c281613b7cf09328cc8a6e1",
    "3c167a8b547c8d28e0a3ae1e2bb3a675916ea37f0bfa213562f1fb627a01243b",
    "cca4f1bea8519089a883dfe15ae59f06928b665e807b552564014c3bfecf492a",
));

const NIST_2048_P: U2048 = U2048::from_be_hex(concat!(
    "c196ba05ac29e1f9c3c72d56dffc6154a033f1477ac88ec37f09be6c5bb95f51",
    "c296dd20d1a28a067ccc4d4316a4bd1dca55ed1066d438c35aebaabf57e7dae4",
    "28782a95eca1c143db701fd48533a3c18f0fe23557ea7ae619ecacc7e0b51652",
    "a8776d02a425567ded36eabd90ca33a1e8d988f0bbb92d02d1d20290113bb562",
    "ce1fc856eeb7cdd92d33eea6f410859b179e7e789a8f75f645fae2e136d252bf",
    "faff89528945c1abe705a38dbc2d364aade99be0d0aad82e5320121496dc65b3",
    "930e38047294ff877831a16d5228418de8ab275d7d75651cefed65f78afc3ea7",
    "fe4d79b35f62a0402a1117599adac7b269a59f353cf450e6982d3b1702d9ca83",
));
const NIST_2048_Q: U256 = U256::from_be_hex("0000000090eaf4d1af0708b1b612ff35e0a2997eb9e9d263c9ce659528945c0d");
const NIST_2048_G: U2048 = U2048::from_be_hex(concat!(
    "a59a749a11242c58c894e9e5a91804e8fa0ac64b56288f8d47d51b1edc4d6544",
    "4feca0111d78f35fc9fdd4cb1f1b79a3ba9cbee83a3f811012503c8117f98e50",
    "48b089e387af6949bf8784ebd9ef45876f2e6a5a495be64b6e770409494b7fee",
    "1dbb1e4b2bc2a53d4f893d418b7159592e4fffdf6969e91d770daebd0b5cb14c",
    "00ad68ec7dc1e5745ea55c706c4a1c5c88964e34d09deb753ad418c1ad0f4fdf",
    "d049a955e5d78491c0b7a2f1575a008ccd727ab376db6e695515b05bd412f5b8",
    "c2f4c77ee10da48abd53f5dd498927ee7b692bbbcda2fb23a516c5b4533d7398",
    "0b2a3b60e384ed200ae21b40d273651ad6060c13d97fd69aa13c5611a51b9085",
));

const NIST_3072_P: U3072 = U3072::from_be_hex(concat!(
    "90066455b5cfc38f9caa4a48b4281f292c260feef01fd61037e56258a7795a1c",
    "7ad46076982ce6bb956936c6ab4dcfe05e6784586940ca544b9b2140e1eb523f",
    "009d20a7e7880e4e5bfa690f1b9004a27811cd9904af70420eefd6ea11ef7da1",
    "29f58835ff56b89faa637bc9ac2efaab903402229f491d8d3485261cd068699b",
    "6ba58a1ddbbef6db51e8fe34e8a78e542d7ba351c21ea8d8f1d29f5d5d159394",
    "87e27f4416b0ca632c59efd1b1eb66511a5a0fbf615b766c5862d0bd8a3fe7a0",
    "e0da0fb2fe1fcb19e8f9996a8ea0fccde538175238fc8b0ee6f29af7f642773e",
    "be8cd5402415a01451a840476b2fceb0e388d30d4b376c37fe401c2a2c2f941d",
    "ad179c540c1c8ce030d460c4d983be9ab0b20f69144c1ae13f9383ea1c08504f",
    "b0bf321503efe43488310dd8dc77ec5b8349b8bfe97c2c560ea878de87c11e3d",
    "597f1fea742d73eec7f37be43949ef1a0d15c3f3e3fc0a8335617055ac91328e",
    "c22b50fc15b941d3d1624cd88bc25f3e941fddc6200689581bfec416b4b2cb73",
));
const NIST_3072_Q: U256 = U256::from_be_hex("cfa0478a54717b08ce64805b76e5b14249a77a4838469df7f7dc987efccfb11d");
const NIST_3072_G: U3072 = U3072::from_be_hex(concat!(
    "5e5cba992e0a680d885eb903aea78e4a45a469103d448ede3b7accc54d521e37",
    "f84a4bdd5b06b0970cc2d2bbb715f7b82846f9a0c393914c792e6a923e2117ab",
    "805276a975aadb5261d91673ea9aaffeecbfa6183dfcb5d3b7332aa19275afa1",
    "f8ec0b60fb6f66cc23ae4870791d5982aad1aa9485fd8f4a60126feb2cf05db8",
    "a7f0f09b3397f3937f2e90b9e5b9c9b6efef642bc48351c46fb171b9bfa9ef17",
    "a961ce96c7e7a7cc3d3d03dfad1078ba21da425198f07d2481622bce45969d9c",
    "4d6063d72ab7a0f08b2f49a7cc6af335e08c4720e31476b67299e231f8bd90b3",
    "9ac3ae3be0c6b6cacef8289a2e2873d58e51e029cafbd55e6841489ab66b5b4b",
    "9ba6e2f784660896aff387d92844ccb8b69475496de19da2e58259b090489ac8",
    "e62363cdf82cfd8ef2a427abcd65750b506f56dde3b988567a88126b914d7828",
    "e2b63a6d7ed0747ec59e0e0a23ce7d8a74c1d2c2a7afb6a29799620f00e11c33",
    "787f7ded3b30e1a22d09f1fbda1abbbfbf25cae05a13f812e34563f99410e73b",
));

/// A prime-order group `(p, q, g)` together with the Montgomery parameters used
/// to compute in it.
#[derive(Clone, Copy, Debug)]
pub struct PrimeOrderGroup<const LIMBS: usize> {
    p: Uint<LIMBS>,
    q: Uint<LIMBS>,
    g: Uint<LIMBS>,
    p_params: MontyParams<LIMBS>,
    q_params: MontyParams<LIMBS>,
    q_nonzero: NonZero<Uint<LIMBS>>,
    q_minus_one: NonZero<Uint<LIMBS>>,
}

impl<const LIMBS: usize> PrimeOrderGroup<LIMBS> {
    /// Builds a group after checking that it really is a prime-order group.
    ///
    /// # Arguments
    /// * `p`: the prime modulus
    /// * `q`: the prime order of the subgroup, which must divide `p - 1`
    /// * `g`: the generator, in `[2, p - 1]` with `g^q = 1 (mod p)`
    ///
    /// # Returns
    /// * `Ok(PrimeOrderGroup)` - if every check passes
    /// * `Err(Error::InvalidGroup)` - naming the first check that failed
    ///
    /// The primality checks are probabilistic (Miller-Rabin with random bases
    /// drawn from the operating system RNG) and cost a few hundred modular
    /// exponentiations, so prefer [`PrimeOrderGroup::new_unchecked`] for
    /// parameters that are already known to be good.
    pub fn new(p: Uint<LIMBS>, q: Uint<LIMBS>, g: Uint<LIMBS>) -> Result<Self> {
        Self::new_with_rng(p, q, g, &mut OsRng)
    }

    /// Same as [`PrimeOrderGroup::new`], drawing Miller-Rabin bases from `rng`.
    pub fn new_with_rng<R>(
        p: Uint<LIMBS>,
        q: Uint<LIMBS>,
        g: Uint<LIMBS>,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: RngCore + CryptoRng,
    {
        let group = Self::new_unchecked(p, q, g)?;

        if !is_probable_prime(&group.p, MILLER_RABIN_ROUNDS, rng) {
            return Err(Error::InvalidGroup("p must be prime"));
        }
        if !is_probable_prime(&group.q, MILLER_RABIN_ROUNDS, rng) {
            return Err(Error::InvalidGroup("q must be prime"));
        }
        let p_minus_one = group.p.wrapping_sub(&Uint::ONE);
        if group.mod_q(&p_minus_one).retrieve() != Uint::ZERO {
            return Err(Error::InvalidGroup("p-1 must be evenly divisible by q"));
        }
        if group.g < Uint::from_u8(2) || group.g > p_minus_one {
            return Err(Error::InvalidGroup("g must be in [2, p-1]"));
        }
        if group.mod_p(&group.g).pow(&group.q).retrieve() != Uint::ONE {
            return Err(Error::InvalidGroup("g^q mod p must equal 1"));
        }
        Ok(group)
    }

    /// Builds a group without the primality and subgroup checks.
    ///
    /// Only the structural requirements of the arithmetic are enforced: `p` and
    /// `q` must be odd, greater than one, and `q < p`. Use this only for
    /// parameters that have been validated elsewhere.
    pub fn new_unchecked(p: Uint<LIMBS>, q: Uint<LIMBS>, g: Uint<LIMBS>) -> Result<Self> {
        let p_odd: Option<Odd<Uint<LIMBS>>> = Odd::new(p).into();
        let q_odd: Option<Odd<Uint<LIMBS>>> = Odd::new(q).into();
        let (Some(p_odd), Some(q_odd)) = (p_odd, q_odd) else {
            return Err(Error::InvalidGroup("p and q must be odd"));
        };
        if q >= p {
            return Err(Error::InvalidGroup("q must be smaller than p"));
        }
        let q_nonzero: Option<NonZero<Uint<LIMBS>>> = NonZero::new(q).into();
        let q_minus_one: Option<NonZero<Uint<LIMBS>>> =
            NonZero::new(q.wrapping_sub(&Uint::ONE)).into();
        let (Some(q_nonzero), Some(q_minus_one)) = (q_nonzero, q_minus_one) else {
            return Err(Error::InvalidGroup("q must be greater than one"));
        };

        Ok(Self {
            p,
            q,
            g,
            p_params: MontyParams::new_vartime(p_odd),
            q_params: MontyParams::new_vartime(q_odd),
            q_nonzero,
            q_minus_one,
        })
    }

    /// The prime modulus `p`
    pub fn p(&self) -> &Uint<LIMBS> {
        &self.p
    }

    /// The subgroup order `q`
    pub fn q(&self) -> &Uint<LIMBS> {
        &self.q
    }

    /// The generator `g`
    pub fn g(&self) -> &Uint<LIMBS> {
        &self.g
    }

    /// `value` as an element of `Z_p`
    pub(crate) fn mod_p(&self, value: &Uint<LIMBS>) -> MontyForm<LIMBS> {
        MontyForm::new(value, self.p_params)
    }

    /// `value` as an element of `Z_q`
    pub(crate) fn mod_q(&self, value: &Uint<LIMBS>) -> MontyForm<LIMBS> {
        MontyForm::new(value, self.q_params)
    }

    pub(crate) fn q_params(&self) -> MontyParams<LIMBS> {
        self.q_params
    }

    /// `q` as a modulus for uniform sampling in `[0, q - 1]`
    pub(crate) fn q_nonzero(&self) -> &NonZero<Uint<LIMBS>> {
        &self.q_nonzero
    }

    /// `q - 1` as a modulus for uniform sampling in `[1, q - 1]`
    pub(crate) fn q_minus_one(&self) -> &NonZero<Uint<LIMBS>> {
        &self.q_minus_one
    }
}

impl PrimeOrderGroup<{ U1024::LIMBS }> {
    /// The 1024-bit group (160-bit `q`) used by the default DSA parameters of
    /// the Sun JCE provider.
    ///
    /// Kept for interoperability; prefer one of the NIST groups for new
    /// deployments.
    pub fn sun_jce_1024() -> Self {
        Self::predefined(SUN_JCE_1024_P, SUN_JCE_1024_Q.resize(), SUN_JCE_1024_G)
    }
}

impl PrimeOrderGroup<{ U2048::LIMBS }> {
    /// The 2048-bit group with a 224-bit `q` from the FIPS 186-3 examples
    pub fn nist_2048() -> Self {
        Self::predefined(NIST_2048_P, NIST_2048_Q.resize(), NIST_2048_G)
    }
}

impl PrimeOrderGroup<{ U3072::LIMBS }> {
    /// The 3072-bit group with a 256-bit `q` from the FIPS 186-3 examples.
    ///
    /// This is the recommended default.
    pub fn nist_3072() -> Self {
        Self::predefined(NIST_3072_P, NIST_3072_Q.resize(), NIST_3072_G)
    }
}

impl<const LIMBS: usize> PrimeOrderGroup<LIMBS> {
    fn predefined(p: Uint<LIMBS>, q: Uint<LIMBS>, g: Uint<LIMBS>) -> Self {
        Self::new_unchecked(p, q, g).expect("predefined group parameters are well formed")
    }
}

/// Names of the predefined groups, as used in configuration files.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GroupName {
    /// [`PrimeOrderGroup::sun_jce_1024`]
    SunJce1024,
    /// [`PrimeOrderGroup::nist_2048`]
    Nist2048,
    /// [`PrimeOrderGroup::nist_3072`]
    Nist3072,
}

impl GroupName {
    /// Bit length of the modulus `p`
    pub fn modulus_bits(&self) -> u32 {
        match self {
            GroupName::SunJce1024 => 1024,
            GroupName::Nist2048 => 2048,
            GroupName::Nist3072 => 3072,
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupName::SunJce1024 => "sun-jce-1024",
            GroupName::Nist2048 => "nist-2048",
            GroupName::Nist3072 => "nist-3072",
        };
        f.write_str(name)
    }
}

impl FromStr for GroupName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sun-jce-1024" => Ok(GroupName::SunJce1024),
            "nist-2048" => Ok(GroupName::Nist2048),
            "nist-3072" => Ok(GroupName::Nist3072),
            _ => Err(Error::InvalidArgument("unknown group name")),
        }
    }
}

/// Miller-Rabin probable-prime test with `rounds` random bases.
fn is_probable_prime<const LIMBS: usize, R>(n: &Uint<LIMBS>, rounds: usize, rng: &mut R) -> bool
where
    R: RngCore + CryptoRng,
{
    let three = Uint::<LIMBS>::from_u8(3);
    if *n < Uint::from_u8(2) {
        return false;
    }
    if *n <= three {
        return true;
    }
    let odd: Option<Odd<Uint<LIMBS>>> = Odd::new(*n).into();
    let Some(odd) = odd else {
        return false;
    };
    // bases are drawn from [2, n - 2]
    let base_range: Option<NonZero<Uint<LIMBS>>> = NonZero::new(n.wrapping_sub(&three)).into();
    let Some(base_range) = base_range else {
        return false;
    };

    let params = MontyParams::new_vartime(odd);
    let one = MontyForm::one(params);
    let minus_one = MontyForm::zero(params) - one;

    let n_minus_one = n.wrapping_sub(&Uint::ONE);
    let s = n_minus_one.trailing_zeros();
    let d = n_minus_one >> s;

    'witness: for _ in 0..rounds {
        let a = Uint::random_mod(&mut *rng, &base_range).wrapping_add(&Uint::from_u8(2));
        let mut x = MontyForm::new(&a, params).pow(&d);
        if x == one || x == minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.square();
            if x == minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}
