use crate::{DirCache, Entry, Error, Stage, MAX_ENTRIES, VERSION};
use gk_features::codec::{read_u32_be, write_u32_be};
use gk_hash::{ObjectId, SIZE_OF_SHA1};

const MAGIC: &[u8; 4] = b"DIRC";
const FIXED_PREFIX_LEN: usize = 40 + SIZE_OF_SHA1 + 2; // ten u32 fields + id + flags = 62

pub fn decode(bytes: &[u8]) -> Result<DirCache, Error> {
    if bytes.len() < 12 || &bytes[0..4] != MAGIC {
        return Err(Error::InvalidEntry("missing DIRC magic"));
    }
    let version = read_u32_be(&bytes[4..8]);
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let entry_count = read_u32_be(&bytes[8..12]) as usize;
    if entry_count > MAX_ENTRIES {
        return Err(Error::TooManyEntries(entry_count));
    }

    let mut pos = 12usize;
    let mut entries = Vec::with_capacity(entry_count);
    for _ in 0..entry_count {
        let (entry, consumed) = decode_entry(&bytes[pos..])?;
        entries.push(entry);
        pos += consumed;
    }
    DirCache::from_sorted_entries(entries)
}

fn decode_entry(bytes: &[u8]) -> Result<(Entry, usize), Error> {
    if bytes.len() < FIXED_PREFIX_LEN {
        return Err(Error::InvalidEntry("truncated entry prefix"));
    }
    let mut fields = [0u32; 10];
    for (i, slot) in fields.iter_mut().enumerate() {
        *slot = read_u32_be(&bytes[i * 4..i * 4 + 4]);
    }
    let [ctime, ctime_ns, mtime, mtime_ns, dev, ino, mode, uid, gid, size] = fields;

    let id_start = 40;
    let object_id = ObjectId::from_bytes(&bytes[id_start..id_start + SIZE_OF_SHA1])?;
    if object_id.is_null() {
        return Err(Error::InvalidEntry("object id is all-zero"));
    }

    let flags_start = id_start + SIZE_OF_SHA1;
    let flags = u16::from_be_bytes([bytes[flags_start], bytes[flags_start + 1]]);
    let assume_valid = flags & 0x8000 != 0;
    let extended = flags & 0x4000 != 0;
    let stage = Stage::from_bits((flags >> 12) & 0b11);
    let name_len_field = (flags & 0x0fff) as usize;

    let name_start = flags_start + 2;
    let name = if name_len_field < 0xfff {
        if bytes.len() < name_start + name_len_field {
            return Err(Error::InvalidEntry("truncated name"));
        }
        bytes[name_start..name_start + name_len_field].to_vec()
    } else {
        let nul = bytes[name_start..]
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::InvalidEntry("missing NUL after long name"))?;
        bytes[name_start..name_start + nul].to_vec()
    };

    let total_before_padding = name_start + name.len();
    let padding = padding_for(total_before_padding);
    let consumed = total_before_padding + padding;

    if bytes.len() < consumed {
        return Err(Error::InvalidEntry("truncated entry padding"));
    }

    // Version 2 carries no second flags byte; skip_worktree/intent_to_add
    // require version >= 3 (spec §4.4) and so are never set here.
    let (skip_worktree, intent_to_add) = (false, false);

    Ok((
        Entry {
            ctime,
            ctime_ns,
            mtime,
            mtime_ns,
            dev,
            ino,
            mode,
            uid,
            gid,
            size,
            object_id,
            name,
            stage,
            assume_valid,
            extended,
            skip_worktree,
            intent_to_add,
        },
        consumed,
    ))
}

/// Padding so total entry length is a multiple of 8, always >= 1 NUL byte.
fn padding_for(len_before_padding: usize) -> usize {
    let remainder = len_before_padding % 8;
    if remainder == 0 {
        8
    } else {
        8 - remainder
    }
}

pub fn encode(cache: &DirCache) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&write_u32_be(VERSION));
    out.extend_from_slice(&write_u32_be(cache.entry_count() as u32));
    for entry in cache.entries() {
        encode_entry(entry, &mut out);
    }
    out
}

fn encode_entry(entry: &Entry, out: &mut Vec<u8>) {
    let start = out.len();
    for field in [
        entry.ctime,
        entry.ctime_ns,
        entry.mtime,
        entry.mtime_ns,
        entry.dev,
        entry.ino,
        entry.mode,
        entry.uid,
        entry.gid,
        entry.size,
    ] {
        out.extend_from_slice(&write_u32_be(field));
    }
    out.extend_from_slice(entry.object_id.as_bytes());

    let name_len = entry.name.len();
    let name_len_field = if name_len >= 0xfff { 0x0fff } else { name_len as u16 };
    let mut flags = name_len_field & 0x0fff;
    flags |= entry.stage().bits() << 12;
    if entry.extended {
        flags |= 0x4000;
    }
    if entry.assume_valid {
        flags |= 0x8000;
    }
    out.extend_from_slice(&flags.to_be_bytes());
    out.extend_from_slice(&entry.name);

    let len_before_padding = out.len() - start;
    let padding = padding_for(len_before_padding);
    out.extend(std::iter::repeat(0u8).take(padding));
}
