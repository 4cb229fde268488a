// Fixing bytes in the middle of the cube.
//
// The 2048-bit template needs six bytes well above the suffix and well below
// the prefix. Write the signature as s = S + L where S is a multiple of 2^g
// and L < 2^g, with g half of the window's bit offset o. Expanding the cube:
//
//   s^3 = S^3 + 3 S^2 L + 3 S L^2 + L^3
//
// S^3 is a multiple of 2^(3g), which is above the window. 3 S^2 L is
// 2^o * 3 sigma^2 L with sigma = S / 2^g, so it only reaches the window
// through its low bits. What's left, 3 S L^2 + L^3, is an ordinary increasing
// function of L. That gives the window as
//
//   (3 sigma^2 lo + floor((3 S L^2 + L^3) / 2^o)) mod 2^w
//
// where only the low w bits of L matter in the first term, and those belong
// to the suffix root. So for each choice of the high part we know exactly
// which value the increasing term has to hit, and can find the L that hits it
// with a square root and a few steps.

use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bigint::low_bits;
use crate::prefix::PrefixRoot;
use crate::{ForgeError, Infeasible};

/// Maximum number of single steps used to correct the square root estimate.
pub const LIFT_STEPS: usize = 8;

/// Widest search over the high part of the correction.
const MAX_SEARCH_BITS: usize = 24;

/// Finds `mid` such that the bytes of `(hi | mid | lo)^3` starting
/// `offset` bytes from the low end read `middle`.
///
/// `mid` is zero outside the bytes `[lo_bytes, hi.free_bytes)` counted from
/// the low end, so it never touches the prefix root or the suffix root.
pub fn reconcile_middle(
    hi: &PrefixRoot,
    lo: &BigUint,
    lo_bytes: usize,
    middle: &[u8],
    offset: usize,
) -> Result<BigUint, ForgeError> {
    let window_bits = 8 * middle.len();
    let o = 8 * offset;
    let lo_bits = 8 * lo_bytes;
    let free_bits = 8 * hi.free_bytes;
    let half = o / 2;

    if middle.is_empty()
        || o % 2 != 0
        || half % 8 != 0
        || half < lo_bits
        || half > free_bits
        || 3 * half < o + window_bits
    {
        debug!(
            "middle window at offset {offset} can't be split around {} free bytes",
            hi.free_bytes
        );
        return Err(Infeasible::MiddleGeometry.into());
    }
    if hi.value.is_zero() {
        return Err(ForgeError::InternalInvariantViolation(
            "prefix root is zero".into(),
        ));
    }
    if lo.bits() > lo_bits as u64 {
        return Err(ForgeError::InternalInvariantViolation(format!(
            "suffix root is wider than {lo_bytes} bytes"
        )));
    }

    let target = BigUint::from_bytes_be(middle);
    let modulus = BigUint::one() << window_bits;
    let lambda = low_bits(lo, window_bits);
    let step_limit = BigUint::one() << (half - lo_bits);
    let search_bits = (free_bits - half).min(MAX_SEARCH_BITS);

    for f in 0..1u64 << search_bits {
        let high = &hi.value + (BigUint::from(f) << half);
        let sigma = &high >> half;
        let two_adic = low_bits(&(&sigma * &sigma * &lambda * 3u32), window_bits);
        let needed = low_bits(&(&target + &modulus - two_adic), window_bits);

        let Some(step) = solve_carry(&high, lo, lo_bits, o, &needed) else {
            continue;
        };
        if step >= step_limit {
            trace!("candidate {f} needs a correction past 2^{half}");
            continue;
        }

        debug!("middle window reconciled after {} candidate(s)", f + 1);
        return Ok((BigUint::from(f) << half) | (step << lo_bits));
    }

    debug!("no correction in 2^{search_bits} candidates reconciles the middle window");
    Err(Infeasible::MiddleWindow.into())
}

/// `floor((3 S L^2 + L^3) / 2^o)` with `L = lo + step * 2^lo_bits`.
fn carry(high: &BigUint, lo: &BigUint, step: &BigUint, lo_bits: usize, o: usize) -> BigUint {
    let low = lo + (step << lo_bits);
    let square = &low * &low;
    (high * &square * 3u32 + square * low) >> o
}

/// Smallest step whose carry reaches `needed`, if that carry is exact.
fn solve_carry(
    high: &BigUint,
    lo: &BigUint,
    lo_bits: usize,
    o: usize,
    needed: &BigUint,
) -> Option<BigUint> {
    let estimate = ((needed << o) / (high * 3u32)).sqrt();
    let mut step = if estimate <= *lo {
        BigUint::zero()
    } else {
        (estimate - lo) >> lo_bits
    };

    let mut steps = 0;
    while carry(high, lo, &step, lo_bits, o) < *needed {
        if steps == LIFT_STEPS {
            return None;
        }
        step += 1u32;
        steps += 1;
    }
    while !step.is_zero() && carry(high, lo, &(&step - 1u32), lo_bits, o) >= *needed {
        if steps == LIFT_STEPS {
            return None;
        }
        step -= 1u32;
        steps += 1;
    }

    (carry(high, lo, &step, lo_bits, o) == *needed).then_some(step)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    use crate::bigint::to_be_fixed;
    use crate::prefix::cube_root_prefix;
    use crate::suffix::cube_root_suffix;
    use crate::template::RSA2048_SHA1;

    fn tail(digest: &[u8]) -> Vec<u8> {
        [RSA2048_SHA1.suffix, digest].concat()
    }

    #[rstest]
    #[case([0u8; 19].iter().chain(&[0x01]).copied().collect())]
    #[case(vec![0xAB; 20])]
    #[case(vec![0xFF; 20])]
    fn reconciled_window_matches_middle(#[case] digest: Vec<u8>) {
        let t = &RSA2048_SHA1;
        let hi = cube_root_prefix(t.prefix, t.bit_len).unwrap();
        let lo = cube_root_suffix(&tail(&digest)).unwrap();

        let mid = reconcile_middle(&hi, &lo, t.tail_len(), t.middle, t.middle_offset).unwrap();

        let lo_bits = 8 * t.tail_len();
        assert!(mid.bits() <= 8 * hi.free_bytes as u64);
        assert!(low_bits(&mid, lo_bits).is_zero());

        let s = &hi.value | &mid | &lo;
        let cube = to_be_fixed(&s.pow(3), t.width()).unwrap();
        assert_eq!(&cube[t.middle_range()], t.middle);
        assert!(cube.starts_with(t.prefix));
        assert!(cube.ends_with(&tail(&digest)));
    }

    #[test]
    fn carry_estimate_lands_on_the_boundary() {
        let high = BigUint::one() << 1000usize;
        let lo = BigUint::from(0x1234_5677u32);
        let needed = BigUint::from(0xBEEFu32);

        // Each step moves the carry by far less than one, so the boundary is
        // always an exact hit.
        let step = solve_carry(&high, &lo, 32, 1200, &needed).unwrap();

        assert_eq!(carry(&high, &lo, &step, 32, 1200), needed);
        assert!(carry(&high, &lo, &(&step - 1u32), 32, 1200) < needed);
    }

    #[rstest]
    #[case(&[0x01], 157)]
    #[case(&[0x01], 164)]
    #[case(&[0x01], 34)]
    #[case(&[0x01; 80], 158)]
    #[case(&[], 158)]
    fn unreachable_windows_are_rejected(#[case] middle: &[u8], #[case] offset: usize) {
        let hi = cube_root_prefix(RSA2048_SHA1.prefix, 2048).unwrap();
        let lo = BigUint::one();

        let err = reconcile_middle(&hi, &lo, RSA2048_SHA1.tail_len(), middle, offset).unwrap_err();

        assert_eq!(err, ForgeError::RetryableInfeasible(Infeasible::MiddleGeometry));
    }

    #[test]
    fn window_missed_by_every_candidate_is_retryable() {
        let t = &RSA2048_SHA1;
        let mut hi = cube_root_prefix(t.prefix, t.bit_len).unwrap();
        // With the free bytes ending exactly at the split there is a single
        // candidate, and for this digest it isn't the one that hits.
        hi.free_bytes = t.middle_offset / 2;
        let lo = cube_root_suffix(&tail(&[0xAB; 20])).unwrap();

        let err = reconcile_middle(&hi, &lo, t.tail_len(), t.middle, t.middle_offset).unwrap_err();

        assert_eq!(err, ForgeError::RetryableInfeasible(Infeasible::MiddleWindow));
        assert!(err.is_retryable());
    }

    #[test]
    fn zero_prefix_root_is_an_internal_error() {
        let t = &RSA2048_SHA1;
        let hi = PrefixRoot {
            value: BigUint::zero(),
            free_bytes: 81,
        };

        let err = reconcile_middle(&hi, &BigUint::one(), t.tail_len(), t.middle, t.middle_offset)
            .unwrap_err();

        assert!(matches!(err, ForgeError::InternalInvariantViolation(_)));
    }
}
