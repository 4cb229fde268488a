// Cube roots that fix the top bytes of the cube.
//
// Every s in [ceil_cbrt(P * 2^shift), ceil_cbrt((P + 1) * 2^shift)) cubes to
// something starting with the prefix P. That interval is wide, so we can pick
// a point in it whose low bytes are all zero, and later fill those bytes with
// whatever the suffix and middle need without disturbing the prefix.

use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::One;

use crate::bigint::to_be_fixed;
use crate::{ForgeError, Infeasible};

/// Maximum number of unit steps taken when nudging a root into place.
pub const ROUNDING_ATTEMPTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixRoot {
    /// Cube root candidate, zero in its low `free_bytes` bytes.
    pub value: BigUint,
    /// Low-order bytes that can be set freely without changing the prefix.
    pub free_bytes: usize,
}

/// Smallest `r` with `r^3 >= n`.
pub fn ceil_cbrt(n: &BigUint) -> Result<BigUint, ForgeError> {
    let mut root = n.cbrt();
    for _ in 0..=ROUNDING_ATTEMPTS {
        if root.pow(3) >= *n {
            return Ok(root);
        }
        root += 1u32;
    }
    Err(Infeasible::PrefixRounding.into())
}

pub fn cube_root_prefix(prefix: &[u8], bit_len: usize) -> Result<PrefixRoot, ForgeError> {
    let width = bit_len / 8;
    if prefix.is_empty() || prefix.len() >= width {
        return Err(ForgeError::InternalInvariantViolation(format!(
            "prefix of {} bytes doesn't fit a {width} byte modulus",
            prefix.len()
        )));
    }

    let shift = bit_len - 8 * prefix.len();
    let p = BigUint::from_bytes_be(prefix);
    let low = ceil_cbrt(&(&p << shift))?;
    let high = ceil_cbrt(&((p + 1u32) << shift))?;

    // Largest k with 2^(8k + 1) <= high - low. Halving the span leaves room
    // for rounding low up to the next multiple of 2^(8k).
    let span_bits = (&high - &low).bits();
    if span_bits < 2 {
        return Err(Infeasible::PrefixRounding.into());
    }
    let free_bytes = ((span_bits - 2) / 8) as usize;
    let free_bits = 8 * free_bytes;
    trace!("prefix root interval spans {span_bits} bits");

    let unit = BigUint::one() << free_bits;
    let mut value = ((&low + &unit - 1u32) >> free_bits) << free_bits;
    for attempt in 0..ROUNDING_ATTEMPTS {
        let top = &value + &unit - 1u32;
        if cube_has_prefix(&value, prefix, width) && cube_has_prefix(&top, prefix, width) {
            debug!(
                "prefix root found after {attempt} step(s): {free_bytes} free bytes of {width}"
            );
            return Ok(PrefixRoot { value, free_bytes });
        }
        value += &unit;
    }

    debug!("prefix root didn't settle within {ROUNDING_ATTEMPTS} steps");
    Err(Infeasible::PrefixRounding.into())
}

fn cube_has_prefix(root: &BigUint, prefix: &[u8], width: usize) -> bool {
    to_be_fixed(&root.pow(3), width).is_some_and(|cube| cube.starts_with(prefix))
}
