//! The trailing-hash device (spec §4.1): a streaming wrapper that computes a
//! running SHA-1 over content bytes and verifies (read mode) or appends
//! (write mode) a 20-byte trailer.
//!
//! Used by the dir-cache reader/writer and available for reuse by anything
//! else that stores a self-verifying trailer (loose objects do not use this
//! today, but the type is generic over `io::Read`/`io::Write` so nothing
//! dir-cache-specific leaks in).

use gk_hash::{ObjectId, SIZE_OF_SHA1};
use sha1::{Digest, Sha1};
use std::io::{self, Read, Write};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("verify() called before all content was consumed")]
    TooSoon,
    #[error("verify() already called once")]
    AlreadyCalled,
    #[error("trailing hash did not match computed digest")]
    Mismatch { expected: ObjectId, computed: ObjectId },
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerifyState {
    NotYet,
    Done,
}

/// Wraps a reader, hashing every byte handed back to the caller and checking
/// the trailing 20 bytes once the caller signals end-of-content via
/// `verify()`.
pub struct HashingReader<R> {
    inner: R,
    hasher: Sha1,
    /// bytes read from `inner` but not yet yielded to the caller (look-ahead
    /// buffer so we can tell real content from the trailer).
    lookahead: Vec<u8>,
    eof: bool,
    state: VerifyState,
}

impl<R: Read> HashingReader<R> {
    pub fn new(inner: R) -> Self {
        HashingReader {
            inner,
            hasher: Sha1::new(),
            lookahead: Vec::new(),
            eof: false,
            state: VerifyState::NotYet,
        }
    }

    fn fill_lookahead(&mut self, want_extra: usize) -> io::Result<()> {
        if self.eof {
            return Ok(());
        }
        let target = SIZE_OF_SHA1 + want_extra;
        let mut buf = [0u8; 8192];
        while self.lookahead.len() < target {
            let n = self.inner.read(&mut buf)?;
            if n == 0 {
                self.eof = true;
                break;
            }
            self.lookahead.extend_from_slice(&buf[..n]);
        }
        Ok(())
    }

    /// Must be called exactly once, after the caller is done reading content
    /// (i.e. after a `read()` returned 0 or the expected length was reached).
    pub fn verify(&mut self) -> Result<(), Error> {
        if self.state == VerifyState::Done {
            return Err(Error::AlreadyCalled);
        }
        self.fill_lookahead(0)?;
        if self.lookahead.len() < SIZE_OF_SHA1 {
            return Err(Error::TooSoon);
        }
        let trailer = &self.lookahead[self.lookahead.len() - SIZE_OF_SHA1..];
        let expected = ObjectId::from_bytes(trailer).expect("20 bytes");
        let digest = self.hasher.clone().finalize();
        let computed = ObjectId::from_bytes(&digest).expect("20 bytes");
        self.state = VerifyState::Done;
        if expected != computed {
            return Err(Error::Mismatch { expected, computed });
        }
        Ok(())
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.fill_lookahead(out.len())?;
        let available = self.lookahead.len().saturating_sub(SIZE_OF_SHA1);
        let n = available.min(out.len());
        if n == 0 {
            return Ok(0);
        }
        out[..n].copy_from_slice(&self.lookahead[..n]);
        self.hasher.update(&out[..n]);
        self.lookahead.drain(..n);
        Ok(n)
    }
}

/// Wraps a writer, hashing every byte written and appending the digest on
/// [`Self::finish`].
pub struct HashingWriter<W> {
    inner: W,
    hasher: Sha1,
    finished: bool,
    written: u64,
    max_bytes: Option<u64>,
}

impl<W: Write> HashingWriter<W> {
    pub fn new(inner: W) -> Self {
        HashingWriter {
            inner,
            hasher: Sha1::new(),
            finished: false,
            written: 0,
            max_bytes: None,
        }
    }

    /// For fault injection in tests: once `written` would exceed `max`, writes
    /// fail with [`io::ErrorKind::WriteZero`].
    pub fn with_byte_ceiling(mut self, max: u64) -> Self {
        self.max_bytes = Some(max);
        self
    }

    /// Appends the trailing digest and returns the inner writer plus the hash.
    pub fn finish(mut self) -> io::Result<(W, ObjectId)> {
        let digest = self.hasher.finalize_reset();
        self.inner.write_all(&digest)?;
        self.finished = true;
        let id = ObjectId::from_bytes(&digest).expect("20 bytes");
        Ok((self.inner, id))
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(max) = self.max_bytes {
            if self.written + buf.len() as u64 > max {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "byte ceiling exceeded"));
            }
        }
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> Drop for HashingWriter<W> {
    fn drop(&mut self) {
        debug_assert!(
            self.finished || std::thread::panicking(),
            "HashingWriter dropped without calling finish()"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn write_then_read_round_trips() {
        let mut writer = HashingWriter::new(Cursor::new(Vec::new()));
        writer.write_all(b"DIRC").unwrap();
        let (cursor, _id) = writer.finish().unwrap();
        let bytes = cursor.into_inner();
        assert_eq!(bytes.len(), 4 + SIZE_OF_SHA1);

        let mut reader = HashingReader::new(Cursor::new(bytes));
        let mut content = Vec::new();
        reader.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"DIRC");
        reader.verify().unwrap();
    }

    #[test]
    fn verify_before_full_read_is_too_soon() {
        let mut writer = HashingWriter::new(Cursor::new(Vec::new()));
        writer.write_all(b"hello world").unwrap();
        let (cursor, _) = writer.finish().unwrap();
        let mut reader = HashingReader::new(Cursor::new(cursor.into_inner()));
        let mut small = [0u8; 2];
        reader.read(&mut small).unwrap();
        assert!(matches!(reader.verify(), Err(Error::TooSoon)));
    }

    #[test]
    fn verify_twice_errors() {
        let mut writer = HashingWriter::new(Cursor::new(Vec::new()));
        writer.write_all(b"x").unwrap();
        let (cursor, _) = writer.finish().unwrap();
        let mut reader = HashingReader::new(Cursor::new(cursor.into_inner()));
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        reader.verify().unwrap();
        assert!(matches!(reader.verify(), Err(Error::AlreadyCalled)));
    }

    #[test]
    fn corrupted_trailer_is_mismatch() {
        let mut writer = HashingWriter::new(Cursor::new(Vec::new()));
        writer.write_all(b"abc").unwrap();
        let (cursor, _) = writer.finish().unwrap();
        let mut bytes = cursor.into_inner();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let mut reader = HashingReader::new(Cursor::new(bytes));
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).unwrap();
        assert!(matches!(reader.verify(), Err(Error::Mismatch { .. })));
    }
}
