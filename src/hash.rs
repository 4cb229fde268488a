use crate::HashKind;

/// A streaming hash producing an `N` byte digest.
pub trait Hasher<const N: usize>: Default {
    /// The registry entry this hash's digests are forged under.
    const KIND: HashKind;

    fn update(&mut self, data: &[u8]);

    fn digest(self) -> [u8; N];

    fn digest_message(message: &[u8]) -> [u8; N] {
        let mut hasher = Self::default();
        hasher.update(message);
        hasher.digest()
    }
}
