//! `ContentSource`: the byte-stream abstraction behind [`crate::Object`].
//! `Memory` is restartable since `stream()` just re-wraps a slice.
//! `gk-odb`'s loose store also has `InflateFile`, a single-pass,
//! file-backed source that only inflates on read (spec §4.2's `get`); its
//! `Find::get` materializes to `Memory` for callers that need an owned,
//! restartable object, but `Store::get_lazy` hands back the lazy form
//! directly. The pack reader resolves deltas fully before handing back an
//! `Object<Memory>`, since a delta chain has to be walked and reconstructed
//! before any single byte of the result is known. Consumers must treat a
//! given implementor as single-pass unless it documents otherwise.

use std::io::Read;

pub trait ContentSource {
    fn length(&self) -> u64;

    /// Returns a fresh reader over the content. Implementors backed by a
    /// single-pass resource (an open file position, say) may only support
    /// calling this once; callers should not rely on calling it twice unless
    /// the concrete type is documented as restartable.
    fn stream(&self) -> Box<dyn Read + '_>;
}

/// An in-memory, restartable content source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory(Vec<u8>);

impl Memory {
    pub fn new(bytes: Vec<u8>) -> Self {
        Memory(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl ContentSource for Memory {
    fn length(&self) -> u64 {
        self.0.len() as u64
    }

    fn stream(&self) -> Box<dyn Read + '_> {
        Box::new(self.0.as_slice())
    }
}

impl From<Vec<u8>> for Memory {
    fn from(bytes: Vec<u8>) -> Self {
        Memory(bytes)
    }
}
