// Forging signatures over messages rather than digests.
//
// A digest ending in a number of zero bits that isn't a multiple of three
// can't be forged. That's a little under half of them, so callers that
// control the message just try variants until one works.

use log::{debug, trace};
use rayon::prelude::*;

use crate::sha1::{Sha1, SHA1_LEN};
use crate::{forge, template, ForgeError, Hasher, Infeasible};

/// Hashes `message` with SHA-1 and forges a signature over the digest.
pub fn forge_message(bit_len: usize, message: &[u8]) -> Result<Vec<u8>, ForgeError> {
    let digest: [u8; SHA1_LEN] = Sha1::digest_message(message);
    forge(<Sha1 as Hasher<SHA1_LEN>>::KIND, bit_len, &digest)
}

/// Forges the first message in `messages` that can be forged.
///
/// Candidates are tried in parallel, but the result is always the one with
/// the lowest index, along with that index. Retryable failures move on to
/// the next candidate. Anything else is returned as is.
pub fn forge_first<M>(bit_len: usize, messages: &[M]) -> Result<(usize, Vec<u8>), ForgeError>
where
    M: AsRef<[u8]> + Sync,
{
    template::lookup(<Sha1 as Hasher<SHA1_LEN>>::KIND, bit_len)?;

    let found = messages
        .par_iter()
        .enumerate()
        .find_map_first(|(i, message)| match forge_message(bit_len, message.as_ref()) {
            Ok(signature) => Some(Ok((i, signature))),
            Err(err) if err.is_retryable() => {
                trace!("candidate {i} skipped: {err}");
                None
            }
            Err(err) => Some(Err(err)),
        });

    match found {
        Some(Ok((i, signature))) => {
            debug!("forged candidate {i} of {}", messages.len());
            Ok((i, signature))
        }
        Some(Err(err)) => Err(err),
        None => {
            debug!("none of {} candidates could be forged", messages.len());
            Err(Infeasible::NoCandidate.into())
        }
    }
}

/// `count` copies of `message`, each suffixed with `" #i"`.
pub fn numbered_variants(message: &[u8], count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|i| [message, format!(" #{i}").as_bytes()].concat())
        .collect()
}
