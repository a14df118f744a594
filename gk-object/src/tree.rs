use crate::{mode, Error};
use gk_hash::ObjectId;
use gk_path::compare_same_name;

/// `{name, mode, object_id}` (spec §3). `name` may not contain `/` or be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub name: Vec<u8>,
    pub mode: u32,
    pub object_id: ObjectId,
}

/// An ordered list of entries, sorted by `compare_same_name` (spec §4.9).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort_by(|a, b| compare_same_name(&a.name, &b.name, b.mode));
        Tree { entries }
    }

    /// Parses a tree object body: repeated `mode SP name \0 id(20 bytes)`.
    pub fn decode(body: &[u8]) -> Result<Self, Error> {
        let mut entries = Vec::new();
        let mut cursor = body;
        let mut previous: Option<(Vec<u8>, u32)> = None;
        while !cursor.is_empty() {
            let space = cursor
                .iter()
                .position(|&b| b == b' ')
                .ok_or(Error::InvalidTree("missing space after mode"))?;
            let mode_bytes = &cursor[..space];
            let mode = parse_mode(mode_bytes)?;
            cursor = &cursor[space + 1..];

            let nul = cursor
                .iter()
                .position(|&b| b == 0)
                .ok_or(Error::InvalidTree("missing NUL after name"))?;
            let name = cursor[..nul].to_vec();
            if name.is_empty() || name.contains(&b'/') {
                return Err(Error::InvalidTree("entry name empty or contains '/'"));
            }
            cursor = &cursor[nul + 1..];

            if cursor.len() < 20 {
                return Err(Error::InvalidTree("truncated object id"));
            }
            let object_id = ObjectId::from_bytes(&cursor[..20])?;
            cursor = &cursor[20..];

            if let Some((prev_name, prev_mode)) = &previous {
                if compare_same_name(prev_name, &name, mode) != std::cmp::Ordering::Less {
                    return Err(Error::InvalidTree("entries out of order"));
                }
                let _ = prev_mode;
            }
            previous = Some((name.clone(), mode));
            entries.push(TreeEntry { name, mode, object_id });
        }
        Ok(Tree { entries })
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for entry in &self.entries {
            out.extend_from_slice(format_mode(entry.mode).as_bytes());
            out.push(b' ');
            out.extend_from_slice(&entry.name);
            out.push(0);
            out.extend_from_slice(entry.object_id.as_bytes());
        }
        out
    }
}

fn parse_mode(bytes: &[u8]) -> Result<u32, Error> {
    if bytes.is_empty() {
        return Err(Error::InvalidTree("empty mode"));
    }
    if bytes[0] == b'0' && bytes.len() > 1 {
        return Err(Error::InvalidTree("mode has leading zero"));
    }
    let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidTree("mode not ASCII"))?;
    let value = u32::from_str_radix(text, 8).map_err(|_| Error::InvalidTree("mode not octal"))?;
    if !mode::is_known(value) {
        return Err(Error::InvalidTree("unknown mode"));
    }
    Ok(value)
}

fn format_mode(mode: u32) -> String {
    format!("{:o}", mode)
}
