//! The in-memory object store backing `Backend::InMemory` (spec §4.10,
//! §3 "objects: map id→Object"). `Arc`-backed so both the façade and a
//! spawned working-tree actor can hold an independent handle to the same
//! map, mirroring how the on-disk variant's `objects_dir` is a shared path
//! both `gk-odb::compound::Db` and `gk-odb::loose::Store` point at.

use gk_hash::{oid, ObjectId};
use gk_object::{Kind, Memory, Object};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

struct Stored {
    kind: Kind,
    bytes: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct MemoryObjects {
    inner: Arc<Mutex<HashMap<ObjectId, Stored>>>,
}

impl MemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }
}

impl gk_odb::Find for MemoryObjects {
    fn has(&self, id: &oid) -> bool {
        self.inner.lock().expect("object map poisoned").contains_key(&id.to_owned())
    }

    fn get(&self, id: &oid) -> Result<Object, gk_odb::Error> {
        let map = self.inner.lock().expect("object map poisoned");
        let stored = map.get(&id.to_owned()).ok_or(gk_odb::Error::NotFound)?;
        Ok(Object::from_bytes(stored.kind, stored.bytes.clone()))
    }
}

impl gk_odb::Write for MemoryObjects {
    fn put(&self, kind: Kind, content: &[u8]) -> Result<ObjectId, gk_odb::Error> {
        let id = ObjectId::compute_from_data(kind.as_str(), content);
        let mut map = self.inner.lock().expect("object map poisoned");
        map.entry(id).or_insert_with(|| Stored {
            kind,
            bytes: content.to_vec(),
        });
        Ok(id)
    }
}
