//! The repository façade (spec §4.10): a single handle whose backend is a
//! tagged variant (`OnDisk` | `InMemory`), dispatched at each call site
//! rather than through a trait-object hierarchy (spec §9 "Backend
//! polymorphism via tagged variants").

use crate::objects::MemoryObjects;
use crate::worktree;
use crate::{init, Error};
use gk_hash::ObjectId;
use gk_index::{DirCache, Entry as IndexEntry, Stage};
use gk_object::{Commit, Kind, Memory, Object, PersonIdent, Tag, Tree};
use gk_odb::{Find, Write as OdbWrite};
use gk_ref::{Backend as RefBackend, OldTarget, PutRequest, Target};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

type OnDiskWorktree = gk_actor::Actor<worktree::Handler<gk_odb::compound::Db, gk_odb::loose::Store>>;
type InMemoryWorktree = gk_actor::Actor<worktree::Handler<MemoryObjects, MemoryObjects>>;

struct OnDisk {
    work_dir: PathBuf,
    git_dir: PathBuf,
    objects: gk_odb::compound::Db,
    writer: gk_odb::loose::Store,
    refs: gk_ref::LooseRefStore<gk_odb::compound::Db>,
    config: std::sync::Mutex<gk_config::ConfigStore>,
    worktree: OnceLock<OnDiskWorktree>,
}

struct InMemory {
    objects: MemoryObjects,
    refs: gk_ref::MemoryRefStore,
    config: std::sync::Mutex<gk_config::ConfigFile>,
    worktree: OnceLock<InMemoryWorktree>,
}

enum Backend {
    OnDisk(OnDisk),
    InMemory(InMemory),
}

/// A single repository handle (spec §4.10). See module docs for the
/// dispatch model.
pub struct Repository {
    backend: Backend,
}

impl Repository {
    /// Creates the on-disk layout under `work_dir/.git` (spec §6) if absent,
    /// then opens it.
    pub fn init(work_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(".git");
        init::layout(&git_dir)?;
        Self::open(work_dir)
    }

    /// Opens an already-initialized on-disk repository at `work_dir/.git`.
    pub fn open(work_dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let work_dir = work_dir.into();
        let git_dir = work_dir.join(".git");
        let objects_dir = git_dir.join("objects");
        let objects = gk_odb::compound::Db::at(&objects_dir)?;
        let checker_db = gk_odb::compound::Db::at(&objects_dir)?;
        let refs = gk_ref::LooseRefStore::new(&git_dir, false, checker_db);
        let config = gk_config::ConfigStore::at(git_dir.join("config"));

        Ok(Repository {
            backend: Backend::OnDisk(OnDisk {
                work_dir,
                git_dir,
                objects,
                writer: gk_odb::loose::Store::at(&objects_dir),
                refs,
                config: std::sync::Mutex::new(config),
                worktree: OnceLock::new(),
            }),
        })
    }

    /// An ephemeral, fully in-process repository (spec §4.10 `in_memory`
    /// variant): no filesystem involved.
    pub fn in_memory() -> Self {
        let objects = MemoryObjects::new();
        Repository {
            backend: Backend::InMemory(InMemory {
                objects,
                refs: gk_ref::MemoryRefStore::new(),
                config: std::sync::Mutex::new(gk_config::ConfigFile::default()),
                worktree: OnceLock::new(),
            }),
        }
    }

    /// Whether this handle is usable. Rust's ownership model makes this
    /// trivially true for any `Repository` that exists; the source system's
    /// reference-handle liveness check has no analogue once the backend is
    /// owned directly rather than addressed by name (see DESIGN.md).
    pub fn is_valid(&self) -> bool {
        true
    }

    pub fn work_dir(&self) -> Option<&Path> {
        match &self.backend {
            Backend::OnDisk(state) => Some(&state.work_dir),
            Backend::InMemory(_) => None,
        }
    }

    /// Attaches the working-tree actor if it is not already attached
    /// (spec §4.10 "one-shot"). Returns `WorkingTreeAlreadySet` on a second
    /// call; ordinary object/ref/tree operations attach it lazily on first
    /// use regardless, so most callers never need this explicitly.
    pub fn set_default_working_tree(&self) -> Result<(), Error> {
        let already_set = match &self.backend {
            Backend::OnDisk(state) => state.worktree.get().is_some(),
            Backend::InMemory(state) => state.worktree.get().is_some(),
        };
        if already_set {
            return Err(Error::WorkingTreeAlreadySet);
        }
        self.ensure_on_disk_worktree_or_memory();
        Ok(())
    }

    fn ensure_on_disk_worktree_or_memory(&self) {
        match &self.backend {
            Backend::OnDisk(state) => {
                state.worktree.get_or_init(|| {
                    let index_path = state.git_dir.join("index");
                    let reader = gk_odb::compound::Db::at(state.git_dir.join("objects"))
                        .expect("objects dir was already opened successfully at Repository::open");
                    let writer = gk_odb::loose::Store::at(state.git_dir.join("objects"));
                    gk_actor::Actor::spawn(worktree::Handler::on_disk(index_path, reader, writer), 16)
                });
            }
            Backend::InMemory(state) => {
                state.worktree.get_or_init(|| {
                    gk_actor::Actor::spawn(worktree::Handler::in_memory(state.objects.clone(), state.objects.clone()), 16)
                });
            }
        }
    }

    // --- object operations -------------------------------------------------

    pub fn hash_object(&self, kind: Kind, content: &[u8], write: bool) -> Result<ObjectId, Error> {
        if write {
            match &self.backend {
                Backend::OnDisk(state) => Ok(state.writer.put(kind, content)?),
                Backend::InMemory(state) => Ok(state.objects.put(kind, content)?),
            }
        } else {
            Ok(ObjectId::compute_from_data(kind.as_str(), content))
        }
    }

    pub fn cat_file(&self, id: ObjectId) -> Result<Object<Memory>, Error> {
        Ok(match &self.backend {
            Backend::OnDisk(state) => state.objects.get(id.as_oid())?,
            Backend::InMemory(state) => state.objects.get(id.as_oid())?,
        })
    }

    pub fn cat_file_commit(&self, id: ObjectId) -> Result<Commit, Error> {
        let object = self.cat_file(id)?;
        Ok(Commit::decode(object.bytes())?)
    }

    pub fn cat_file_tree(&self, id: ObjectId) -> Result<Tree, Error> {
        let object = self.cat_file(id)?;
        Ok(Tree::decode(object.bytes())?)
    }

    pub fn cat_file_tag(&self, id: ObjectId) -> Result<Tag, Error> {
        let object = self.cat_file(id)?;
        Ok(Tag::decode(object.bytes())?)
    }

    pub fn commit_tree(
        &self,
        tree_id: ObjectId,
        parent_ids: Vec<ObjectId>,
        author: PersonIdent,
        committer: PersonIdent,
        message: Vec<u8>,
    ) -> Result<ObjectId, Error> {
        let commit = Commit {
            tree_id,
            parent_ids,
            author,
            committer,
            encoding: None,
            extra_headers: Vec::new(),
            message,
        };
        let body = commit.encode();
        self.hash_object(Kind::Commit, &body, true)
    }

    // --- working-tree operations --------------------------------------------

    pub fn dir_cache(&self) -> Result<DirCache, Error> {
        self.ensure_on_disk_worktree_or_memory();
        match self.call_worktree(worktree::Request::Snapshot)? {
            worktree::Reply::Cache(result) => result,
            _ => unreachable!("Snapshot always replies with Reply::Cache"),
        }
    }

    pub fn ls_files_stage(&self) -> Result<Vec<IndexEntry>, Error> {
        Ok(self.dir_cache()?.entries().to_vec())
    }

    pub fn update_index_cache_info(&self, entries: Vec<(u32, ObjectId, Vec<u8>)>) -> Result<(), Error> {
        self.ensure_on_disk_worktree_or_memory();
        let add = entries
            .into_iter()
            .map(|(mode, id, name)| IndexEntry::new(name, mode, id, Stage::Normal))
            .collect();
        match self.call_worktree(worktree::Request::Update { add, remove: Vec::new() })? {
            worktree::Reply::Unit(result) => result,
            _ => unreachable!("Update always replies with Reply::Unit"),
        }
    }

    pub fn reset_index(&self) -> Result<(), Error> {
        self.ensure_on_disk_worktree_or_memory();
        match self.call_worktree(worktree::Request::Reset)? {
            worktree::Reply::Unit(result) => result,
            _ => unreachable!("Reset always replies with Reply::Unit"),
        }
    }

    pub fn write_tree(&self, missing_ok: bool, prefix: Option<Vec<u8>>) -> Result<ObjectId, Error> {
        self.ensure_on_disk_worktree_or_memory();
        match self.call_worktree(worktree::Request::WriteTree { missing_ok, prefix })? {
            worktree::Reply::Tree(result) => result,
            _ => unreachable!("WriteTree always replies with Reply::Tree"),
        }
    }

    pub fn read_tree(&self, id: ObjectId, missing_ok: bool) -> Result<(), Error> {
        self.ensure_on_disk_worktree_or_memory();
        match self.call_worktree(worktree::Request::ReadTree { id, missing_ok })? {
            worktree::Reply::Unit(result) => result,
            _ => unreachable!("ReadTree always replies with Reply::Unit"),
        }
    }

    fn call_worktree(&self, request: worktree::Request) -> Result<worktree::Reply, Error> {
        match &self.backend {
            Backend::OnDisk(state) => {
                let actor = state.worktree.get().expect("ensure_on_disk_worktree_or_memory was just called");
                Ok(actor.call(request)?)
            }
            Backend::InMemory(state) => {
                let actor = state.worktree.get().expect("ensure_on_disk_worktree_or_memory was just called");
                Ok(actor.call(request)?)
            }
        }
    }

    // --- ref operations ------------------------------------------------------

    pub fn list_refs(&self) -> Result<Vec<String>, Error> {
        Ok(match &self.backend {
            Backend::OnDisk(state) => state.refs.list()?,
            Backend::InMemory(state) => state.refs.list()?,
        })
    }

    pub fn update_ref(&self, name: &str, id: ObjectId) -> Result<(), Error> {
        let request = PutRequest {
            follow: true,
            old_target: None,
        };
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.refs.put(name, Target::Object(id), request)?),
            Backend::InMemory(state) => Ok(state.refs.put(name, Target::Object(id), request)?),
        }
    }

    pub fn update_ref_cas(&self, name: &str, id: ObjectId, old: OldTarget) -> Result<(), Error> {
        let request = PutRequest {
            follow: true,
            old_target: Some(old),
        };
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.refs.put(name, Target::Object(id), request)?),
            Backend::InMemory(state) => Ok(state.refs.put(name, Target::Object(id), request)?),
        }
    }

    pub fn put_symbolic_ref(&self, name: &str, target: &str) -> Result<(), Error> {
        let request = PutRequest::default();
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.refs.put(name, Target::Symbolic(target.to_string()), request)?),
            Backend::InMemory(state) => Ok(state.refs.put(name, Target::Symbolic(target.to_string()), request)?),
        }
    }

    pub fn get_symbolic_ref(&self, name: &str) -> Result<String, Error> {
        let target = match &self.backend {
            Backend::OnDisk(state) => state.refs.get(name, false)?.target,
            Backend::InMemory(state) => state.refs.get(name, false)?.target,
        };
        match target {
            Target::Symbolic(name) => Ok(name),
            Target::Object(_) => Err(Error::NotSymbolic),
        }
    }

    pub fn delete_symbolic_ref(&self, name: &str) -> Result<(), Error> {
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.refs.delete(name, None)?),
            Backend::InMemory(state) => Ok(state.refs.delete(name, None)?),
        }
    }

    // --- config operations -----------------------------------------------------

    pub fn config_get(&self, query: &gk_config::Query) -> Result<Vec<gk_config::Entry>, Error> {
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.config.lock().expect("config mutex poisoned").get_entries(query)?),
            Backend::InMemory(state) => Ok(state.config.lock().expect("config mutex poisoned").get_entries(query)),
        }
    }

    pub fn config_add(&self, entries: &[gk_config::Entry], opts: gk_config::AddOptions) -> Result<(), Error> {
        match &self.backend {
            Backend::OnDisk(state) => Ok(state.config.lock().expect("config mutex poisoned").add_entries(entries, opts)?),
            Backend::InMemory(state) => Ok(state.config.lock().expect("config mutex poisoned").add_entries(entries, opts)?),
        }
    }
}
