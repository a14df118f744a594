//! The pack reader (spec §4.3): a `.pack` file plus its `.idx`, with
//! ofs-delta/ref-delta resolution.

pub mod data;
pub mod delta;
pub mod index;

use gk_hash::oid;
use gk_object::{Kind, Memory, Object};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pack index is invalid: {0}")]
    InvalidIndex(&'static str),
    #[error("pack data is invalid: {0}")]
    InvalidData(&'static str),
    #[error("object not found in pack")]
    NotFound,
    #[error("delta chain exceeded the maximum supported depth")]
    DeltaChainTooDeep,
    #[error("delta base offset underflowed the pack")]
    BadBaseOffset,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Maximum delta chain length this reader will follow before giving up;
/// real packs are bounded far below this, it exists only as a loop guard.
const MAX_DELTA_DEPTH: usize = 256;

/// A pack paired with its index, ready to resolve object ids to content.
pub struct Pack {
    index: index::Index,
    data: data::PackData,
}

impl Pack {
    pub fn open(pack_path: impl AsRef<Path>, idx_path: impl AsRef<Path>) -> Result<Self, Error> {
        let index = index::Index::open(idx_path)?;
        let data = data::PackData::open(pack_path)?;
        Ok(Pack { index, data })
    }

    pub fn has(&self, id: &oid) -> bool {
        self.index.lookup(id).is_some()
    }

    pub fn entries(&self) -> impl Iterator<Item = index::Entry<'_>> {
        self.index.entries()
    }

    pub fn get(&self, id: &oid) -> Result<Object, Error> {
        let entry_index = self.index.lookup(id).ok_or(Error::NotFound)?;
        let offset = self.index.offset_at(entry_index);
        let (kind, content) = self.resolve_at(offset, 0)?;
        Ok(Object::new(kind, Memory::new(content)))
    }

    fn resolve_at(&self, offset: u64, depth: usize) -> Result<(Kind, Vec<u8>), Error> {
        if depth > MAX_DELTA_DEPTH {
            return Err(Error::DeltaChainTooDeep);
        }
        let header = self.data.header_at(offset)?;
        match header.kind {
            data::HeaderKind::Base(kind) => {
                let content = self.data.inflate_at(offset + header.header_len as u64, header.size)?;
                Ok((kind, content))
            }
            data::HeaderKind::OfsDelta { distance } => {
                let base_offset = offset
                    .checked_sub(distance)
                    .ok_or(Error::BadBaseOffset)?;
                let delta_start = offset + header.header_len as u64;
                let delta_bytes = self.data.inflate_at(delta_start, header.size)?;
                let (base_kind, base_content) = self.resolve_at(base_offset, depth + 1)?;
                let content = delta::apply(&base_content, &delta_bytes).map_err(Error::InvalidData)?;
                Ok((base_kind, content))
            }
            data::HeaderKind::RefDelta { base_id } => {
                let base_entry = self.index.lookup(base_id.as_oid()).ok_or(Error::NotFound)?;
                let base_offset = self.index.offset_at(base_entry);
                let delta_start = offset + header.header_len as u64;
                let delta_bytes = self.data.inflate_at(delta_start, header.size)?;
                let (base_kind, base_content) = self.resolve_at(base_offset, depth + 1)?;
                let content = delta::apply(&base_content, &delta_bytes).map_err(Error::InvalidData)?;
                Ok((base_kind, content))
            }
        }
    }
}

pub use index::Kind as IndexVersion;
