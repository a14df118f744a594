//! An in-memory ref backend (spec §4.5): same [`Backend`] contract as
//! [`crate::LooseRefStore`], backed by a map instead of the filesystem.
//! Commit-type verification of write targets is explicitly deferred — the
//! in-memory backend has no object database to check against.

use crate::{name, resolve_symbolic_chain, resolve_symbolic_write_target, Backend, Error, OldTarget, PutRequest, Ref, Target};
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct MemoryRefStore {
    refs: Mutex<BTreeMap<String, Target>>,
}

impl MemoryRefStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read_raw(&self, name: &str) -> Result<Option<Target>, Error> {
        Ok(self.refs.lock().expect("ref map poisoned").get(name).cloned())
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

impl Backend for MemoryRefStore {
    fn list(&self) -> Result<Vec<String>, Error> {
        Ok(self
            .refs
            .lock()
            .expect("ref map poisoned")
            .keys()
            .filter(|n| n.starts_with("refs/heads/"))
            .cloned()
            .collect())
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

        if let Some(old) = &request.old_target {
            self.check_cas(&write_name, old)?;
        }

        self.refs.lock().expect("ref map poisoned").insert(write_name, target);
        Ok(())
    }

    fn delete(&self, name: &str, old_target: Option<OldTarget>) -> Result<(), Error> {
        name::validate(name)?;
        if let Some(old) = &old_target {
            self.check_cas(name, old)?;
        }
        self.refs.lock().expect("ref map poisoned").remove(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryRefStore::new();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"x");
        store
            .put("refs/heads/main", Target::Object(id), PutRequest::default())
            .unwrap();
        let r = store.get("refs/heads/main", false).unwrap();
        assert_eq!(r.target, Target::Object(id));
    }

    #[test]
    fn follow_resolves_through_head() {
        let store = MemoryRefStore::new();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"x");
        store
            .put("refs/heads/main", Target::Object(id), PutRequest::default())
            .unwrap();
        store
            .put("HEAD", Target::Symbolic("refs/heads/main".to_string()), PutRequest::default())
            .unwrap();
        let r = store.get("HEAD", true).unwrap();
        assert_eq!(r.target, Target::Object(id));
        assert_eq!(r.link_target.as_deref(), Some("refs/heads/main"));
    }

    #[test]
    fn follow_writes_through_unborn_symbolic_target() {
        let store = MemoryRefStore::new();
        store
            .put("HEAD", Target::Symbolic("refs/heads/master".to_string()), PutRequest::default())
            .unwrap();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"first commit");
        store
            .put("HEAD", Target::Object(id), PutRequest { follow: true, old_target: None })
            .unwrap();

        assert_eq!(store.get("HEAD", false).unwrap().target, Target::Symbolic("refs/heads/master".to_string()));
        assert_eq!(store.get("refs/heads/master", false).unwrap().target, Target::Object(id));
    }

    #[test]
    fn cas_must_match_rejects_stale() {
        let store = MemoryRefStore::new();
        let id1 = gk_hash::ObjectId::compute_from_data("commit", b"x");
        let id2 = gk_hash::ObjectId::compute_from_data("commit", b"y");
        store
            .put("refs/heads/main", Target::Object(id1), PutRequest::default())
            .unwrap();
        let result = store.put(
            "refs/heads/main",
            Target::Object(id2),
            PutRequest {
                follow: false,
                old_target: Some(OldTarget::MustMatch(id2)),
            },
        );
        assert!(matches!(result, Err(Error::OldTargetNotMatched)));
    }

    #[test]
    fn list_filters_to_refs_heads() {
        let store = MemoryRefStore::new();
        let id = gk_hash::ObjectId::compute_from_data("commit", b"x");
        store
            .put("refs/heads/main", Target::Object(id), PutRequest::default())
            .unwrap();
        store
            .put("HEAD", Target::Symbolic("refs/heads/main".to_string()), PutRequest::default())
            .unwrap();
        assert_eq!(store.list().unwrap(), vec!["refs/heads/main".to_string()]);
    }
}
