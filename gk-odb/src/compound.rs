//! A compound database: loose objects checked first, then packs in the
//! order they were discovered, mirroring the teacher's `git_odb::compound::Db`
//! (exercised in the retrieved `tests/compound/mod.rs`: `Db::at(..)`,
//! `db.packs.len()`, `db.locate(id, &mut buf)`).

use crate::{loose, pack, Error, Find};
use gk_hash::oid;
use gk_object::Object;
use std::fs;
use std::path::PathBuf;

pub struct Db {
    loose: loose::Store,
    pub packs: Vec<pack::Pack>,
}

impl Db {
    /// Opens the object database rooted at `objects_dir` (e.g. `.git/objects`),
    /// discovering every `.pack`/`.idx` pair under `objects_dir/pack`.
    pub fn at(objects_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let objects_dir = objects_dir.into();
        let loose = loose::Store::at(objects_dir.clone());
        let pack_dir = objects_dir.join("pack");
        let mut packs = Vec::new();
        if pack_dir.is_dir() {
            for entry in fs::read_dir(&pack_dir)? {
                let entry = entry?;
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("idx") {
                    let pack_path = path.with_extension("pack");
                    if pack_path.is_file() {
                        packs.push(pack::Pack::open(&pack_path, &path)?);
                    }
                }
            }
        }
        Ok(Db { loose, packs })
    }

    /// Locates an object, checking loose storage before packs, matching the
    /// teacher's precedence. Writes reconstructed bytes into `buf` where the
    /// concrete [`Find`] implementation needs a scratch buffer; unlike the
    /// teacher this workspace's `Object` owns its content directly, so `buf`
    /// is accepted for API-compatibility with callers migrating from the
    /// teacher's shape but is otherwise unused here.
    pub fn locate(&self, id: gk_hash::ObjectId, _buf: &mut Vec<u8>) -> Result<Option<Object>, Error> {
        match self.get(id.as_oid()) {
            Ok(obj) => Ok(Some(obj)),
            Err(Error::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl Find for Db {
    fn has(&self, id: &oid) -> bool {
        self.loose.has(id) || self.packs.iter().any(|p| p.has(id))
    }

    fn get(&self, id: &oid) -> Result<Object, Error> {
        if self.loose.has(id) {
            return self.loose.get(id);
        }
        for pack in &self.packs {
            match pack.get(id) {
                Ok(obj) => return Ok(obj),
                Err(pack::Error::NotFound) => continue,
                Err(e) => return Err(Error::Pack(e)),
            }
        }
        Err(Error::NotFound)
    }
}
