//! The object identifier type shared by every other crate in this workspace.
//!
//! Git identifies objects by the SHA-1 of their serialized form. `ObjectId`
//! is the owned 20-byte value; `oid` is the borrowed form, mirroring the
//! `String`/`str` split so callers can accept either without an allocation.

use std::fmt;
use std::str::FromStr;

pub const SIZE_OF_SHA1: usize = 20;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid hex digit at position {pos}")]
    InvalidHex { pos: usize },
    #[error("expected a 40-byte hex encoded SHA-1, got {len} bytes")]
    InvalidLength { len: usize },
}

/// An owned, 20-byte SHA-1 object id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId([u8; SIZE_OF_SHA1]);

/// Borrowed form of [`ObjectId`], analogous to `str` for `String`.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct oid([u8; SIZE_OF_SHA1]);

impl ObjectId {
    pub const NULL: ObjectId = ObjectId([0; SIZE_OF_SHA1]);

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() != SIZE_OF_SHA1 {
            return Err(Error::InvalidLength { len: bytes.len() });
        }
        let mut buf = [0u8; SIZE_OF_SHA1];
        buf.copy_from_slice(bytes);
        Ok(ObjectId(buf))
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, Error> {
        if hex_str.len() != SIZE_OF_SHA1 * 2 {
            return Err(Error::InvalidLength { len: hex_str.len() });
        }
        let mut buf = [0u8; SIZE_OF_SHA1];
        hex::decode_to_slice(hex_str, &mut buf).map_err(|_| Error::InvalidHex { pos: 0 })?;
        Ok(ObjectId(buf))
    }

    pub fn null() -> Self {
        Self::NULL
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0u8; SIZE_OF_SHA1]
    }

    pub fn as_bytes(&self) -> &[u8; SIZE_OF_SHA1] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_oid(&self) -> &oid {
        // SAFETY: `oid` is `#[repr(transparent)]` over the same byte array.
        unsafe { &*(self.0.as_ptr() as *const oid) }
    }

    /// Computes the SHA-1 of `"{kind} {len}\0{content}"`, the canonical git object id.
    pub fn compute_from_data(kind: &str, content: &[u8]) -> Self {
        use sha1::{Digest, Sha1};
        let mut hasher = Sha1::new();
        hasher.update(kind.as_bytes());
        hasher.update(b" ");
        hasher.update(content.len().to_string().as_bytes());
        hasher.update(b"\0");
        hasher.update(content);
        let digest = hasher.finalize();
        let mut buf = [0u8; SIZE_OF_SHA1];
        buf.copy_from_slice(&digest);
        ObjectId(buf)
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for ObjectId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl oid {
    pub fn as_bytes(&self) -> &[u8; SIZE_OF_SHA1] {
        &self.0
    }

    pub fn to_owned(&self) -> ObjectId {
        ObjectId(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_blob_matches_git() {
        let id = ObjectId::compute_from_data("blob", b"test content\n");
        assert_eq!(id.to_hex(), "d670460b4b4aece5915caf5c68d12f560a9fe3e4");
    }

    #[test]
    fn round_trips_through_hex() {
        let id = ObjectId::compute_from_data("blob", b"hello\n");
        let parsed = ObjectId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(matches!(
            ObjectId::from_hex("abcd"),
            Err(Error::InvalidLength { len: 4 })
        ));
    }

    #[test]
    fn null_is_all_zero() {
        assert!(ObjectId::null().is_null());
    }
}
