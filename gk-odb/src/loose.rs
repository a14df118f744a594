//! The loose object store (spec §4.2): `objects/xx/yyyy…` files, each
//! `deflate("{type} {size}\0{content}")`.

use crate::{Error, Find, Write as WriteTrait};
use gk_features::zlib::{DeflateWrite, InflateRead};
use gk_hash::{oid, ObjectId};
use gk_object::{ContentSource, Kind, Memory, Object};
use std::fs;
use std::io::{self, Read, Write as _};
use std::path::{Path, PathBuf};

pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    fn path_for(&self, id: &oid) -> PathBuf {
        let hex = ObjectId::from_bytes(id.as_bytes()).expect("20 bytes").to_hex();
        self.root.join(&hex[..2]).join(&hex[2..])
    }

    /// The spec §4.2 shape of `get`: opens the header just far enough to
    /// learn `{type, size}`, then hands back an `Object` whose content only
    /// inflates the file when something actually reads it.
    pub fn get_lazy(&self, id: &oid) -> Result<Object<InflateFile>, Error> {
        let path = self.path_for(id);
        let (kind, size) = read_kind_and_size(&path)?;
        Ok(Object::new(kind, InflateFile { path, size }))
    }
}

impl Find for Store {
    fn has(&self, id: &oid) -> bool {
        self.path_for(id).is_file()
    }

    fn get(&self, id: &oid) -> Result<Object, Error> {
        let lazy = self.get_lazy(id)?;
        let mut content = Vec::with_capacity(lazy.size as usize);
        lazy.content().stream().read_to_end(&mut content).map_err(|_| Error::InvalidObject)?;
        if content.len() as u64 != lazy.size {
            return Err(Error::InvalidObject);
        }
        Ok(Object::new(lazy.kind, Memory::new(content)))
    }
}

fn read_kind_and_size(path: &Path) -> Result<(Kind, u64), Error> {
    let file = fs::File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound
        } else {
            Error::Io(e)
        }
    })?;
    let mut inflate = InflateRead::new(file);
    let mut header = Vec::new();
    read_header(&mut inflate, &mut header)?;
    parse_header(&header)
}

fn open_past_header(path: &Path) -> io::Result<InflateRead<fs::File>> {
    let file = fs::File::open(path)?;
    let mut inflate = InflateRead::new(file);
    let mut header = Vec::new();
    read_header(&mut inflate, &mut header).map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "invalid loose object header"))?;
    Ok(inflate)
}

/// A file-backed, zlib-inflated content source (spec §4.2): the target path
/// is only opened and inflated once a reader actually pulls from `stream()`,
/// so `get_lazy` never holds decompressed content in memory.
pub struct InflateFile {
    path: PathBuf,
    size: u64,
}

impl ContentSource for InflateFile {
    fn length(&self) -> u64 {
        self.size
    }

    fn stream(&self) -> Box<dyn Read + '_> {
        Box::new(LazyInflate { path: &self.path, state: LazyInflateState::Unopened })
    }
}

enum LazyInflateState {
    Unopened,
    Open(InflateRead<fs::File>),
    Failed,
}

struct LazyInflate<'a> {
    path: &'a Path,
    state: LazyInflateState,
}

impl<'a> Read for LazyInflate<'a> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if matches!(self.state, LazyInflateState::Unopened) {
            match open_past_header(self.path) {
                Ok(inflate) => self.state = LazyInflateState::Open(inflate),
                Err(e) => {
                    self.state = LazyInflateState::Failed;
                    return Err(e);
                }
            }
        }
        match &mut self.state {
            LazyInflateState::Open(inflate) => inflate.read(buf),
            LazyInflateState::Failed => Err(io::Error::new(io::ErrorKind::Other, "loose object lazy read already failed to open")),
            LazyInflateState::Unopened => unreachable!("transitioned to Open or Failed above"),
        }
    }
}

impl WriteTrait for Store {
    fn put(&self, kind: Kind, content: &[u8]) -> Result<ObjectId, Error> {
        let id = ObjectId::compute_from_data(kind.as_str(), content);
        let path = self.path_for(id.as_oid());
        let dir = path.parent().expect("object path has a parent");
        fs::create_dir_all(dir).map_err(Error::CantCreateFile)?;

        let file = match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                tracing::debug!(id = %id, "loose object already exists, not overwriting");
                return Err(Error::ObjectExists);
            }
            Err(e) => return Err(Error::CantCreateFile(e)),
        };
        let mut writer = DeflateWrite::new(file, 1);
        let header = format!("{} {}\0", kind, content.len());
        writer.write_all(header.as_bytes())?;
        writer.write_all(content)?;
        writer.finish()?;

        tracing::debug!(id = %id, kind = %kind, "wrote loose object");
        Ok(id)
    }
}

fn read_header(reader: &mut impl Read, out: &mut Vec<u8>) -> Result<(), Error> {
    let mut byte = [0u8; 1];
    loop {
        let n = reader.read(&mut byte).map_err(|_| Error::InvalidObject)?;
        if n == 0 {
            return Err(Error::InvalidObject);
        }
        if byte[0] == 0 {
            return Ok(());
        }
        out.push(byte[0]);
        if out.len() > 64 {
            return Err(Error::InvalidObject);
        }
    }
}

fn parse_header(header: &[u8]) -> Result<(Kind, u64), Error> {
    let text = std::str::from_utf8(header).map_err(|_| Error::InvalidObject)?;
    let space = text.find(' ').ok_or(Error::InvalidObject)?;
    let kind = text[..space].parse::<Kind>().map_err(|_| Error::InvalidObject)?;
    let size: u64 = text[space + 1..].parse().map_err(|_| Error::InvalidObject)?;
    Ok((kind, size))
}

/// existence check over a path, used by callers who already have a hex id
/// (e.g. the working-tree actor verifying object existence before writing a
/// tree) without constructing a full `Store`.
pub fn object_path(objects_dir: &Path, id: &oid) -> PathBuf {
    let hex = ObjectId::from_bytes(id.as_bytes()).expect("20 bytes").to_hex();
    objects_dir.join(&hex[..2]).join(&hex[2..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_testtools::scratch_dir;

    #[test]
    fn put_then_get_round_trips() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        let id = store.put(Kind::Blob, b"test content\n").unwrap();
        assert_eq!(id.to_hex(), "d670460b4b4aece5915caf5c68d12f560a9fe3e4");
        assert!(store.has(id.as_oid()));

        let obj = store.get(id.as_oid()).unwrap();
        assert_eq!(obj.kind, Kind::Blob);
        assert_eq!(obj.size, 13);
        assert_eq!(obj.bytes(), b"test content\n");
    }

    #[test]
    fn put_twice_returns_object_exists() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        store.put(Kind::Blob, b"hi\n").unwrap();
        assert!(matches!(store.put(Kind::Blob, b"hi\n"), Err(Error::ObjectExists)));
    }

    #[test]
    fn get_missing_is_not_found() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        let missing = ObjectId::null();
        assert!(matches!(store.get(missing.as_oid()), Err(Error::NotFound)));
    }

    #[test]
    fn get_lazy_streams_content_after_header() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        let id = store.put(Kind::Blob, b"test content\n").unwrap();

        let lazy = store.get_lazy(id.as_oid()).unwrap();
        assert_eq!(lazy.kind, Kind::Blob);
        assert_eq!(lazy.size, 13);
        let mut content = Vec::new();
        lazy.content().stream().read_to_end(&mut content).unwrap();
        assert_eq!(content, b"test content\n");
    }

    #[test]
    fn get_lazy_missing_is_not_found() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        let missing = ObjectId::null();
        assert!(matches!(store.get_lazy(missing.as_oid()), Err(Error::NotFound)));
    }

    #[test]
    fn has_all_is_conjunction() {
        let dir = scratch_dir();
        let store = Store::at(dir.path());
        let id = store.put(Kind::Blob, b"a\n").unwrap();
        assert!(store.has_all([id.as_oid()]));
        assert!(!store.has_all([id.as_oid(), ObjectId::null().as_oid()]));
    }
}
