use num_bigint::BigUint;
use num_traits::{One, Zero};

/// Writes `n` big-endian into exactly `width` bytes, left-padded with zeros.
///
/// Returns `None` if `n` doesn't fit.
pub fn to_be_fixed(n: &BigUint, width: usize) -> Option<Vec<u8>> {
    if n.bits() > 8 * width as u64 {
        return None;
    }
    let mut out = vec![0u8; width];
    if n.is_zero() {
        return Some(out);
    }
    let bytes = n.to_bytes_be();
    out[width - bytes.len()..].copy_from_slice(&bytes);
    Some(out)
}

/// `n mod 2^bits`
pub fn low_bits(n: &BigUint, bits: usize) -> BigUint {
    n & ((BigUint::one() << bits) - 1u32)
}

/// Big-endian index range of the nonzero bytes in `bytes`, if any.
pub fn occupied(bytes: &[u8]) -> Option<std::ops::Range<usize>> {
    let start = bytes.iter().position(|&b| b != 0)?;
    let end = bytes.iter().rposition(|&b| b != 0)? + 1;
    Some(start..end)
}
