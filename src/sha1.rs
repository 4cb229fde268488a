use crate::{HashKind, Hasher};

const BLOCK_SIZE: usize = 64;
const INITIALISATION_CONSTANTS: [u32; 5] =
    [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];
pub const SHA1_LEN: usize = 20;

#[derive(Debug, Clone)]
pub struct Sha1 {
    buffer: [u8; BLOCK_SIZE],
    buffer_len: usize,
    state: [u32; 5],
    message_len: u64,
}

impl Default for Sha1 {
    fn default() -> Self {
        Self {
            buffer: [0u8; BLOCK_SIZE],
            buffer_len: 0,
            state: INITIALISATION_CONSTANTS,
            message_len: 0,
        }
    }
}

impl Hasher<SHA1_LEN> for Sha1 {
    const KIND: HashKind = HashKind::Sha1;

    fn update(&mut self, mut data: &[u8]) {
        self.message_len = self.message_len.wrapping_add(data.len() as u64);

        while !data.is_empty() {
            let to_copy = (BLOCK_SIZE - self.buffer_len).min(data.len());
            self.buffer[self.buffer_len..self.buffer_len + to_copy]
                .copy_from_slice(&data[..to_copy]);
            self.buffer_len += to_copy;
            data = &data[to_copy..];

            if self.buffer_len == BLOCK_SIZE {
                let block = self.buffer;
                self.process_block(&block);
                self.buffer_len = 0;
            }
        }
    }

    fn digest(mut self) -> [u8; SHA1_LEN] {
        let bit_len = self.message_len.wrapping_mul(8);

        // 0x80, then zeros until the length is 56 mod 64, then the bit length
        let zeros = (BLOCK_SIZE + 56 - (self.buffer_len + 1) % BLOCK_SIZE) % BLOCK_SIZE;
        let mut padding = vec![0x80];
        padding.resize(1 + zeros, 0x00);
        padding.extend_from_slice(&bit_len.to_be_bytes());
        self.update(&padding);

        let mut out = [0u8; SHA1_LEN];
        for (bytes, word) in out.chunks_exact_mut(4).zip(self.state) {
            bytes.copy_from_slice(&word.to_be_bytes());
        }
        out
    }
}

impl Sha1 {
    fn process_block(&mut self, block: &[u8; BLOCK_SIZE]) {
        let mut w = [0u32; 80];
        for (word, bytes) in w.iter_mut().zip(block.chunks_exact(4)) {
            *word = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        }
        for i in 16..80 {
            w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
        }

        let [mut a, mut b, mut c, mut d, mut e] = self.state;
        for (i, &word) in w.iter().enumerate() {
            let (f, k) = match i {
                0..=19 => ((b & c) | ((!b) & d), 0x5A827999),
                20..=39 => (b ^ c ^ d, 0x6ED9EBA1),
                40..=59 => ((b & c) | (b & d) | (c & d), 0x8F1BBCDC),
                _ => (b ^ c ^ d, 0xCA62C1D6),
            };

            let temp = a
                .rotate_left(5)
                .wrapping_add(f)
                .wrapping_add(e)
                .wrapping_add(k)
                .wrapping_add(word);
            e = d;
            d = c;
            c = b.rotate_left(30);
            b = a;
            a = temp;
        }

        for (s, v) in self.state.iter_mut().zip([a, b, c, d, e]) {
            *s = s.wrapping_add(v);
        }
    }
}
