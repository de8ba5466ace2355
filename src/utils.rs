use crypto_bigint::modular::{MontyForm, MontyParams};
use crypto_bigint::{Uint, U64};

/// Encodes an integer as its minimal unsigned big-endian byte string.
///
/// Leading zero bytes are stripped, so the output length tracks the bit length
/// of the value rather than the width of `Uint<LIMBS>`. Zero encodes as the
/// empty string. This is the encoding fed to every hash and MAC in the protocol,
/// so both participants must agree on it byte for byte.
///
/// # Arguments
/// * `value`: the integer to encode
///
/// # Returns
/// The big-endian bytes of `value` with no leading zeros
pub(crate) fn to_unsigned_be_bytes<const LIMBS: usize>(value: &Uint<LIMBS>) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(Uint::<LIMBS>::BYTES);
    for limb in value.as_limbs().iter().rev() {
        bytes.extend_from_slice(&limb.0.to_be_bytes());
    }
    let first_nonzero = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes.drain(..first_nonzero);
    bytes
}

/// Reads an arbitrary-length big-endian byte string as an unsigned integer and
/// reduces it modulo the modulus behind `params`.
///
/// The input may be longer than `Uint<LIMBS>`; it is folded in one byte at a
/// time (Horner's rule) so nothing is truncated.
pub(crate) fn reduce_be_bytes<const LIMBS: usize>(
    bytes: &[u8],
    params: MontyParams<LIMBS>,
) -> MontyForm<LIMBS> {
    let radix = MontyForm::new(&Uint::from_u16(256), params);
    bytes.iter().fold(MontyForm::zero(params), |acc, &b| {
        acc * radix + MontyForm::new(&Uint::from_u8(b), params)
    })
}

/// Reads a big-endian byte string as a two's complement integer and reduces it
/// modulo the modulus behind `params`.
///
/// A leading byte with its top bit set makes the value negative: the result is
/// `unsigned(bytes) - 256^len` taken modulo the modulus.
pub(crate) fn reduce_twos_complement_be_bytes<const LIMBS: usize>(
    bytes: &[u8],
    params: MontyParams<LIMBS>,
) -> MontyForm<LIMBS> {
    let unsigned = reduce_be_bytes(bytes, params);
    match bytes.first() {
        Some(&lead) if lead & 0x80 != 0 => {
            let radix = MontyForm::new(&Uint::from_u16(256), params);
            let bias = radix.pow(&U64::from_u64(bytes.len() as u64));
            unsigned - bias
        }
        _ => unsigned,
    }
}
