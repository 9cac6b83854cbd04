pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;
}

/// Adler-32 rolling checksum; the digest is the 32-bit value in big-endian order.
pub struct Adler32Hasher(adler2::Adler32);

impl Hasher for Adler32Hasher {
    fn update(&mut self, data: &[u8]) { self.0.write_slice(data); }
    fn finalize(self) -> Vec<u8> { self.0.checksum().to_be_bytes().to_vec() }
}

impl Default for Adler32Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Adler32Hasher {
    pub fn new() -> Self { Self(adler2::Adler32::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> {
        let mut hasher = Self::new();
        hasher.update(data);
        hasher.finalize()
    }
}
