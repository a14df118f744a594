//! Incremental zlib inflate/deflate over byte streams, composed directly with
//! the underlying file so large objects never need to sit fully in memory.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{self, Read, Write};

/// An inflating reader over an arbitrary byte source.
pub struct InflateRead<R>(ZlibDecoder<R>);

impl<R: Read> InflateRead<R> {
    pub fn new(inner: R) -> Self {
        InflateRead(ZlibDecoder::new(inner))
    }

    pub fn into_inner(self) -> R {
        self.0.into_inner()
    }
}

impl<R: Read> Read for InflateRead<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

/// A deflating writer over an arbitrary byte sink. `level` ranges 0-9; the
/// loose object store always uses level 1 per spec §4.2.
pub struct DeflateWrite<W: Write>(ZlibEncoder<W>);

impl<W: Write> DeflateWrite<W> {
    pub fn new(inner: W, level: u32) -> Self {
        DeflateWrite(ZlibEncoder::new(inner, Compression::new(level)))
    }

    pub fn finish(self) -> io::Result<W> {
        self.0.finish()
    }
}

impl<W: Write> Write for DeflateWrite<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

/// One-shot helper used for small in-memory payloads (tree/commit/tag bodies
/// are already materialized in memory by the time they reach the object
/// store, unlike blob content which streams).
pub fn inflate_all(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    InflateRead::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

pub fn deflate_all(raw: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut writer = DeflateWrite::new(Vec::new(), level);
    writer.write_all(raw)?;
    writer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let raw = b"blob 13\0test content\n".to_vec();
        let compressed = deflate_all(&raw, 1).unwrap();
        let decompressed = inflate_all(&compressed).unwrap();
        assert_eq!(decompressed, raw);
    }
}
