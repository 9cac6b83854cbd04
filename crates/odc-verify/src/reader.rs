use std::io::{self, Read};

use crate::Hasher;

/// Reader that hashes data as it passes through.
/// Wraps any `Read` source so a file is read exactly once.
pub struct HashingReader<R, H> {
    reader: R,
    hasher: H,
    bytes_read: u64,
}

impl<R, H> HashingReader<R, H> {
    pub fn new(reader: R, hasher: H) -> Self {
        Self { reader, hasher, bytes_read: 0 }
    }

    /// Number of bytes that have passed through the reader so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}

impl<R: Read, H: Hasher> HashingReader<R, H> {
    /// Drain the remaining input and return the final digest.
    pub fn finish(mut self) -> io::Result<Vec<u8>> {
        io::copy(&mut self, &mut io::sink())?;
        Ok(self.hasher.finalize())
    }
}

impl<R: Read, H: Hasher> Read for HashingReader<R, H> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.hasher.update(&buf[..n]);
            self.bytes_read += n as u64;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Adler32Hasher;
    use std::io::Cursor;

    #[test]
    fn test_hashing_reader_passes_data_through() {
        let data = b"test data for verification";
        let mut reader = HashingReader::new(Cursor::new(data), Adler32Hasher::new());

        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();

        assert_eq!(out, data);
        assert_eq!(reader.bytes_read(), data.len() as u64);
        assert_eq!(reader.finish().unwrap(), Adler32Hasher::digest(data));
    }

    #[test]
    fn test_hashing_reader_partial_read_then_finish() {
        let data = b"hello world";
        let mut reader = HashingReader::new(Cursor::new(data), Adler32Hasher::new());

        let mut buffer = [0; 4];
        reader.read_exact(&mut buffer).unwrap();
        assert_eq!(reader.bytes_read(), 4);

        assert_eq!(hex::encode(reader.finish().unwrap()), "1a0b045d");
    }
}
