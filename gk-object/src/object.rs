use crate::{ContentSource, Error, Kind, Memory};
use gk_hash::ObjectId;
use sha1::{Digest, Sha1};
use std::io;

/// A tagged record: `{type, size, id, content}` (spec §3). `id` is computed
/// on demand from `"{type} {size}\0{content}"`; it is not stored eagerly
/// because content may be a large lazy stream nobody asked to hash.
pub struct Object<C: ContentSource = Memory> {
    pub kind: Kind,
    pub size: u64,
    content: C,
}

impl<C: ContentSource> Object<C> {
    pub fn new(kind: Kind, content: C) -> Self {
        let size = content.length();
        Object { kind, size, content }
    }

    pub fn content(&self) -> &C {
        &self.content
    }

    pub fn into_content(self) -> C {
        self.content
    }

    /// Streams the full content through a SHA-1 hasher prefixed with the
    /// canonical header; does not require materializing content in memory.
    pub fn compute_id(&self) -> Result<ObjectId, Error> {
        let mut hasher = Sha1::new();
        hasher.update(self.kind.as_str().as_bytes());
        hasher.update(b" ");
        hasher.update(self.size.to_string().as_bytes());
        hasher.update(b"\0");
        let mut reader = self.content.stream();
        let mut buf = [0u8; 8192];
        loop {
            let n = io::Read::read(&mut reader, &mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        let digest = hasher.finalize();
        Ok(ObjectId::from_bytes(&digest)?)
    }
}

impl Object<Memory> {
    pub fn from_bytes(kind: Kind, bytes: Vec<u8>) -> Self {
        Object::new(kind, Memory::new(bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        self.content.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_matches_git_blob_hash() {
        let obj = Object::from_bytes(Kind::Blob, b"test content\n".to_vec());
        assert_eq!(
            obj.compute_id().unwrap().to_hex(),
            "d670460b4b4aece5915caf5c68d12f560a9fe3e4"
        );
    }

    #[test]
    fn size_matches_content_length() {
        let obj = Object::from_bytes(Kind::Blob, b"abc".to_vec());
        assert_eq!(obj.size, 3);
    }
}
