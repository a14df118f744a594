//! On-disk loose refs: `{git_dir}/{refname}` containing `{target}\n`, plus
//! an optional fold-in of `packed-refs` with loose-ref precedence (spec §4.5,
//! §9 Open Questions).

use crate::packed::PackedRefs;
use crate::{name, resolve_symbolic_chain, resolve_symbolic_write_target, Backend, Error, OldTarget, PutRequest, Ref, Target};
use gk_hash::oid;
use gk_object::Kind;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Abstracts over "does this object exist, and what kind is it" so the ref
/// store doesn't need to depend on a concrete object database type.
pub trait ObjectChecker {
    fn exists(&self, id: &oid) -> bool;
    fn kind_of(&self, id: &oid) -> Option<Kind>;
}

/// A checker that accepts every id; used when target verification is not
/// desired (e.g. in isolated ref-store tests).
pub struct AlwaysPresent;

impl ObjectChecker for AlwaysPresent {
    fn exists(&self, _id: &oid) -> bool {
        true
    }
    fn kind_of(&self, _id: &oid) -> Option<Kind> {
        Some(Kind::Commit)
    }
}

impl<T: gk_odb::Find> ObjectChecker for T {
    fn exists(&self, id: &oid) -> bool {
        self.has(id)
    }
    fn kind_of(&self, id: &oid) -> Option<Kind> {
        self.get(id).ok().map(|o| o.kind)
    }
}

pub struct LooseRefStore<C> {
    git_dir: PathBuf,
    bare: bool,
    checker: C,
}

impl<C: ObjectChecker> LooseRefStore<C> {
    pub fn new(git_dir: impl Into<PathBuf>, bare: bool, checker: C) -> Self {
        LooseRefStore {
            git_dir: git_dir.into(),
            bare,
            checker,
        }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.git_dir.join(name)
    }

    fn read_raw(&self, name: &str) -> Result<Option<Target>, Error> {
        let path = self.path_for(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(Target::parse(&content))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.packed_refs().map(|pr| pr.get(name).cloned())
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn packed_refs(&self) -> Result<PackedRefs, Error> {
        let path = self.git_dir.join("packed-refs");
        match fs::read_to_string(&path) {
            Ok(content) => PackedRefs::parse(&content).map_err(|_| Error::InvalidRef("malformed packed-refs file")),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PackedRefs::empty()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn write_raw(&self, name: &str, target: &Target) -> Result<(), Error> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(&path)?;
        file.write_all(target.serialize().as_bytes())?;
        Ok(())
    }

    fn resolved_object_id(&self, name: &str) -> Result<Option<gk_hash::ObjectId>, Error> {
        match resolve_symbolic_chain(name, true, |n| self.read_raw(n)) {
            Ok(resolved) => match resolved.target {
                Target::Object(id) => Ok(Some(id)),
                Target::Symbolic(_) => unreachable!("follow=true always terminates on an object"),
            },
            Err(Error::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

impl<C: ObjectChecker> Backend for LooseRefStore<C> {
    fn list(&self) -> Result<Vec<String>, Error> {
        let heads_dir = self.git_dir.join("refs/heads");
        let mut names = Vec::new();
        collect_loose(&heads_dir, "refs/heads", &mut names)?;
        if let Ok(packed) = self.packed_refs() {
            for packed_name in packed.names() {
                if packed_name.starts_with("refs/heads/") && !names.contains(&packed_name.to_string()) {
                    names.push(packed_name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    fn get(&self, name: &str, follow: bool) -> Result<Ref, Error> {
        name::validate(name)?;
        resolve_symbolic_chain(name, follow, |n| self.read_raw(n))
    }

    fn put(&self, name: &str, target: Target, request: PutRequest) -> Result<(), Error> {
        name::validate(name)?;

        let write_name = if request.follow {
            resolve_symbolic_write_target(name, |n| self.read_raw(n))?
        } else {
            name.to_string()
        };

        if let Target::Object(id) = &target {
            if !self.checker.exists(id.as_oid()) {
                return Err(Error::TargetNotFound);
            }
            if !self.bare {
                match self.checker.kind_of(id.as_oid()) {
                    Some(Kind::Commit) => {}
                    Some(_) => return Err(Error::TargetNotCommit),
                    None => return Err(Error::TargetNotFound),
                }
            }
        }

        if let Some(old) = &request.old_target {
            self.check_cas(&write_name, old)?;
        }

        self.write_raw(&write_name, &target)?;
        tracing::debug!(name = %write_name, "wrote loose ref");
        Ok(())
    }

    fn delete(&self, name: &str, old_target: Option<OldTarget>) -> Result<(), Error> {
        name::validate(name)?;
        if let Some(old) = &old_target {
            self.check_cas(name, old)?;
        }
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

impl<C: ObjectChecker> LooseRefStore<C> {
    fn check_cas(&self, name: &str, old: &OldTarget) -> Result<(), Error> {
        let current = self.resolved_object_id(name)?;
        match old {
            OldTarget::Any => Ok(()),
            OldTarget::MustNotExist => {
                if current.is_some() {
                    Err(Error::OldTargetNotMatched)
                } else {
                    Ok(())
                }
            }
            OldTarget::MustMatch(expected) => {
                if current.as_ref() == Some(expected) {
                    Ok(())
                } else {
                    Err(Error::OldTargetNotMatched)
                }
            }
        }
    }
}

fn collect_loose(dir: &Path, prefix: &str, out: &mut Vec<String>) -> Result<(), Error> {
    if !dir.is_dir() {
        return Ok(());
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name().to_string_lossy().into_owned();
        let full_name = format!("{prefix}/{file_name}");
        if entry.path().is_dir() {
            collect_loose(&entry.path(), &full_name, out)?;
        } else {
            out.push(full_name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gk_testtools::scratch_dir;

    #[test]
    fn put_symbolic_then_get_round_trips() {
        let dir = scratch_dir();
        let store = LooseRefStore::new(dir.path(), false, AlwaysPresent);
        store
            .put("HEAD", Target::Symbolic("refs/heads/other".to_string()), PutRequest::default())
            .unwrap();
        let resolved = store.get("HEAD", false).unwrap();
        assert_eq!(resolved.target, Target::Symbolic("refs/heads/other".to_string()));
    }

    #[test]
    fn follow_writes_through_symbolic_head() {
        let dir = scratch_dir();
        let store = LooseRefStore::new(dir.path(), false, AlwaysPresent);
        store
            .put("HEAD", Target::Symbolic("refs/heads/other".to_string()), PutRequest::default())
            .unwrap();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"fake commit body");
        store
            .put("HEAD", Target::Object(id), PutRequest { follow: true, old_target: None })
            .unwrap();

        let head_content = fs::read_to_string(dir.path().join("HEAD")).unwrap();
        assert_eq!(head_content, "ref: refs/heads/other\n");
        let other = fs::read_to_string(dir.path().join("refs/heads/other")).unwrap();
        assert_eq!(other.trim(), id.to_hex());
    }

    #[test]
    fn follow_writes_through_unborn_symbolic_target() {
        let dir = scratch_dir();
        let store = LooseRefStore::new(dir.path(), false, AlwaysPresent);
        store
            .put("HEAD", Target::Symbolic("refs/heads/master".to_string()), PutRequest::default())
            .unwrap();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"first commit");

        assert!(!dir.path().join("refs/heads/master").exists());
        store
            .put("HEAD", Target::Object(id), PutRequest { follow: true, old_target: None })
            .unwrap();

        let head_content = fs::read_to_string(dir.path().join("HEAD")).unwrap();
        assert_eq!(head_content, "ref: refs/heads/master\n");
        let master = fs::read_to_string(dir.path().join("refs/heads/master")).unwrap();
        assert_eq!(master.trim(), id.to_hex());
    }

    #[test]
    fn cas_must_not_exist_rejects_existing() {
        let dir = scratch_dir();
        let store = LooseRefStore::new(dir.path(), false, AlwaysPresent);
        let id = gk_hash::ObjectId::compute_from_data("commit", b"x");
        store
            .put("refs/heads/main", Target::Object(id), PutRequest::default())
            .unwrap();
        let result = store.put(
            "refs/heads/main",
            Target::Object(id),
            PutRequest {
                follow: false,
                old_target: Some(OldTarget::MustNotExist),
            },
        );
        assert!(matches!(result, Err(Error::OldTargetNotMatched)));
    }

    #[test]
    fn delete_missing_is_idempotent() {
        let dir = scratch_dir();
        let store = LooseRefStore::new(dir.path(), false, AlwaysPresent);
        store.delete("refs/heads/ghost", None).unwrap();
    }
}
