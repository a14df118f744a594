//! Pack index parsing, both v1 (implicit, no magic) and v2 (magic `\xfftOc`).

use super::Error;
use gk_features::codec::{read_u32_be, read_u64_be};
use gk_hash::{oid, ObjectId, SIZE_OF_SHA1};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    V1,
    #[default]
    V2,
}

const MAGIC_V2: [u8; 4] = [0xff, b't', b'O', b'c'];

pub struct Index {
    kind: Kind,
    fanout: [u32; 256],
    ids: Vec<ObjectId>,
    offsets: Vec<u64>,
    crc32: Vec<u32>,
}

pub struct Entry<'a> {
    pub id: &'a ObjectId,
    pub offset: u64,
    pub crc32: Option<u32>,
}

impl Index {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let bytes = fs::read(path)?;
        Self::parse(&bytes)
    }

    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        if data.len() >= 4 && data[..4] == MAGIC_V2 {
            Self::parse_v2(data)
        } else {
            Self::parse_v1(data)
        }
    }

    fn parse_fanout(data: &[u8]) -> Result<([u32; 256], usize), Error> {
        if data.len() < 256 * 4 {
            return Err(Error::InvalidIndex("truncated fanout table"));
        }
        let mut fanout = [0u32; 256];
        for (i, slot) in fanout.iter_mut().enumerate() {
            *slot = read_u32_be(&data[i * 4..i * 4 + 4]);
        }
        for i in 1..256 {
            if fanout[i] < fanout[i - 1] {
                return Err(Error::InvalidIndex("fanout table is not monotonic"));
            }
        }
        Ok((fanout, 256 * 4))
    }

    fn parse_v1(data: &[u8]) -> Result<Self, Error> {
        let (fanout, mut pos) = Self::parse_fanout(data)?;
        let count = fanout[255] as usize;
        let mut ids = Vec::with_capacity(count);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            if data.len() < pos + 24 {
                return Err(Error::InvalidIndex("truncated v1 entry"));
            }
            let offset = read_u32_be(&data[pos..pos + 4]) as u64;
            let id = ObjectId::from_bytes(&data[pos + 4..pos + 24]).map_err(|_| Error::InvalidIndex("bad id"))?;
            offsets.push(offset);
            ids.push(id);
            pos += 24;
        }
        verify_ascending(&ids)?;
        Ok(Index {
            kind: Kind::V1,
            fanout,
            ids,
            offsets,
            crc32: Vec::new(),
        })
    }

    fn parse_v2(data: &[u8]) -> Result<Self, Error> {
        let version = read_u32_be(&data[4..8]);
        if version != 2 {
            return Err(Error::InvalidIndex("unsupported index version"));
        }
        let (fanout, mut pos) = Self::parse_fanout(&data[8..]).map(|(f, len)| (f, len + 8))?;
        let count = fanout[255] as usize;

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            if data.len() < pos + SIZE_OF_SHA1 {
                return Err(Error::InvalidIndex("truncated name table"));
            }
            ids.push(ObjectId::from_bytes(&data[pos..pos + SIZE_OF_SHA1]).map_err(|_| Error::InvalidIndex("bad id"))?);
            pos += SIZE_OF_SHA1;
        }
        verify_ascending(&ids)?;

        let mut crc32 = Vec::with_capacity(count);
        for _ in 0..count {
            if data.len() < pos + 4 {
                return Err(Error::InvalidIndex("truncated crc32 table"));
            }
            crc32.push(read_u32_be(&data[pos..pos + 4]));
            pos += 4;
        }

        let mut offsets32 = Vec::with_capacity(count);
        for _ in 0..count {
            if data.len() < pos + 4 {
                return Err(Error::InvalidIndex("truncated offset table"));
            }
            offsets32.push(read_u32_be(&data[pos..pos + 4]));
            pos += 4;
        }

        let num_large = offsets32.iter().filter(|&&o| o & 0x8000_0000 != 0).count();
        let mut large_offsets = Vec::with_capacity(num_large);
        for _ in 0..num_large {
            if data.len() < pos + 8 {
                return Err(Error::InvalidIndex("truncated 64-bit offset table"));
            }
            large_offsets.push(read_u64_be(&data[pos..pos + 8]));
            pos += 8;
        }

        let offsets = offsets32
            .into_iter()
            .map(|raw| {
                if raw & 0x8000_0000 != 0 {
                    let large_index = (raw & 0x7fff_ffff) as usize;
                    large_offsets.get(large_index).copied().ok_or(Error::InvalidIndex("large offset index out of range"))
                } else {
                    Ok(raw as u64)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if data.len() < pos + SIZE_OF_SHA1 * 2 {
            return Err(Error::InvalidIndex("truncated trailer"));
        }

        Ok(Index {
            kind: Kind::V2,
            fanout,
            ids,
            offsets,
            crc32,
        })
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Binary search bounded by the fanout table, per spec §4.3.
    pub fn lookup(&self, id: &oid) -> Option<usize> {
        let first_byte = id.as_bytes()[0] as usize;
        let lo = if first_byte == 0 { 0 } else { self.fanout[first_byte - 1] as usize };
        let hi = self.fanout[first_byte] as usize;
        self.ids[lo..hi]
            .binary_search_by(|candidate| candidate.as_bytes().cmp(id.as_bytes()))
            .ok()
            .map(|i| lo + i)
    }

    pub fn offset_at(&self, index: usize) -> u64 {
        self.offsets[index]
    }

    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> {
        self.ids.iter().enumerate().map(move |(i, id)| Entry {
            id,
            offset: self.offsets[i],
            crc32: self.crc32.get(i).copied(),
        })
    }
}

fn verify_ascending(ids: &[ObjectId]) -> Result<(), Error> {
    for w in ids.windows(2) {
        if w[0] >= w[1] {
            return Err(Error::InvalidIndex("name table is not sorted ascending"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_v1(entries: &[(u32, [u8; 20])]) -> Vec<u8> {
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.1.cmp(&b.1));
        let mut fanout = [0u32; 256];
        for (i, (_, id)) in sorted.iter().enumerate() {
            for slot in &mut fanout[id[0] as usize..] {
                *slot = (i + 1) as u32;
            }
        }
        let mut out = Vec::new();
        for f in fanout {
            out.extend_from_slice(&f.to_be_bytes());
        }
        for (offset, id) in &sorted {
            out.extend_from_slice(&offset.to_be_bytes());
            out.extend_from_slice(id);
        }
        out.extend_from_slice(&[0u8; 40]);
        out
    }

    #[test]
    fn parses_v1_and_looks_up() {
        let id_a = [1u8; 20];
        let id_b = [2u8; 20];
        let data = build_v1(&[(10, id_a), (20, id_b)]);
        let index = Index::parse(&data).unwrap();
        assert_eq!(index.kind(), Kind::V1);
        assert_eq!(index.len(), 2);
        let found = index.lookup(ObjectId::from_bytes(&id_b).unwrap().as_oid()).unwrap();
        assert_eq!(index.offset_at(found), 20);
    }

    #[test]
    fn rejects_non_monotonic_fanout() {
        let mut data = build_v1(&[(10, [1u8; 20])]);
        // Corrupt the fanout to be non-monotonic.
        data[4 * 5..4 * 5 + 4].copy_from_slice(&999u32.to_be_bytes());
        assert!(Index::parse(&data).is_err());
    }
}
