// Cube roots modulo 2^n.
//
// Cubing is a bijection on the odd residues mod 2^n, so an odd target always
// has exactly one odd root and it can be found bit by bit. If x is right mod
// 2^k, flipping bit k of x changes x^3 by 3 * x^2 * 2^k plus higher terms,
// which flips bit k of the cube and leaves everything below it alone.
//
// An even target 2^v * u (u odd) is a cube only when 3 divides v, in which
// case 2^(v/3) times the root of u modulo 2^(n - v) works.

use log::{debug, trace};
use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::bigint::low_bits;
use crate::{ForgeError, Infeasible};

/// Some `x < 2^bits` with `x^3 ≡ target (mod 2^bits)`.
///
/// Odd targets have a unique odd root. Even targets only have a root when
/// their number of trailing zero bits is a multiple of three; any other even
/// target is `RetryableInfeasible(EvenSuffix)`.
pub fn cube_root_mod_pow2(target: &BigUint, bits: usize) -> Result<BigUint, ForgeError> {
    let target = low_bits(target, bits);
    let Some(zeros) = target.trailing_zeros() else {
        return Ok(BigUint::zero());
    };
    if zeros % 3 != 0 {
        debug!("target has {zeros} trailing zero bits, not a cube mod 2^{bits}");
        return Err(Infeasible::EvenSuffix.into());
    }

    let odd = &target >> zeros;
    let odd_bits = bits as u64 - zeros;
    let mut root = BigUint::one();
    for k in 1..odd_bits {
        if root.pow(3).bit(k) != odd.bit(k) {
            root.set_bit(k, true);
        }
    }
    Ok(root << (zeros / 3))
}

/// Finds `lo` such that the low `target.len()` bytes of `lo^3` are `target`.
pub fn cube_root_suffix(target: &[u8]) -> Result<BigUint, ForgeError> {
    if target.is_empty() {
        return Err(ForgeError::InternalInvariantViolation(
            "empty suffix target".into(),
        ));
    }

    let bits = 8 * target.len();
    let t = BigUint::from_bytes_be(target);
    let root = cube_root_mod_pow2(&t, bits)?;

    if low_bits(&root.pow(3), bits) != t {
        return Err(ForgeError::InternalInvariantViolation(
            "suffix root doesn't cube back to the target".into(),
        ));
    }
    trace!("suffix root is {} bits wide", root.bits());
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;

    #[rstest]
    #[case(&[0x01], 1u32)]
    #[case(&[0x1B], 3)]
    #[case(&[0x00, 0x7D], 5)]
    #[case(&[0x00, 0x00, 0x01, 0x57], 7)]
    fn small_perfect_cubes_give_their_root(#[case] target: &[u8], #[case] expected: u32) {
        assert_eq!(cube_root_suffix(target).unwrap(), BigUint::from(expected));
    }

    #[test]
    fn cubing_is_a_bijection_on_odd_bytes() {
        let roots: HashSet<_> = (1u8..=255)
            .step_by(2)
            .map(|b| cube_root_suffix(&[b]).unwrap())
            .collect();

        assert_eq!(roots.len(), 128);
        assert!(roots.iter().all(|r| r.bit(0) && r.bits() <= 8));
    }

    #[test]
    fn random_odd_targets_round_trip() {
        let mut rng = StdRng::from_seed([101; 32]);
        for len in [1, 2, 17, 35, 64] {
            let mut target: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            if let Some(last) = target.last_mut() {
                *last |= 1;
            }

            let root = cube_root_suffix(&target).unwrap();

            let bits = 8 * len;
            assert!(root.bits() <= bits as u64);
            assert!(root.bit(0));
            assert_eq!(low_bits(&root.pow(3), bits), BigUint::from_bytes_be(&target));
        }
    }

    #[rstest]
    #[case(&[0x00], 0u32)]
    #[case(&[0x08], 2)]
    #[case(&[0x40], 4)]
    #[case(&[0x00, 0x00, 0x02, 0x00], 8)]
    fn even_targets_with_cube_valuation_have_a_root(
        #[case] target: &[u8],
        #[case] expected: u32,
    ) {
        assert_eq!(cube_root_suffix(target).unwrap(), BigUint::from(expected));
    }

    #[test]
    fn zero_digest_tail_has_a_root() {
        // `04 14` followed by twenty zero bytes ends in 162 zero bits.
        let target = [&[0x05u8, 0x00, 0x04, 0x14][..], &[0x00; 20][..]].concat();

        let root = cube_root_suffix(&target).unwrap();

        assert_eq!(root.trailing_zeros(), Some(54));
        assert_eq!(
            low_bits(&root.pow(3), 8 * target.len()),
            BigUint::from_bytes_be(&target)
        );
    }

    #[rstest]
    #[case(&[0x02])]
    #[case(&[0x04])]
    #[case(&[0x10])]
    #[case(&[0xFF, 0xAA])]
    #[case(&[0x01, 0x00])]
    fn even_targets_without_cube_valuation_are_retryable(#[case] target: &[u8]) {
        let err = cube_root_suffix(target).unwrap_err();

        assert_eq!(err, ForgeError::RetryableInfeasible(Infeasible::EvenSuffix));
        assert!(err.is_retryable());
    }

    #[rstest]
    #[case(2u32, 8)]
    #[case(6, 8)]
    #[case(0x0100, 16)]
    fn mod_pow2_root_refuses_non_cubes(#[case] target: u32, #[case] bits: usize) {
        let err = cube_root_mod_pow2(&BigUint::from(target), bits).unwrap_err();

        assert_eq!(err, ForgeError::RetryableInfeasible(Infeasible::EvenSuffix));
    }

    #[test]
    fn mod_pow2_root_reduces_target_first() {
        // 0x1_1B is 27 once reduced mod 2^8.
        let root = cube_root_mod_pow2(&BigUint::from(0x11Bu32), 8).unwrap();

        assert_eq!(root, BigUint::from(3u32));
    }

    #[test]
    fn empty_target_is_an_internal_error() {
        let err = cube_root_suffix(&[]).unwrap_err();

        assert!(matches!(err, ForgeError::InternalInvariantViolation(_)));
    }
}
