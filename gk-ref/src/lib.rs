//! The reference store (spec §4.5): on-disk loose refs, an in-memory
//! backend, and optional packed-refs folding, behind one [`Backend`] trait.

mod error;
mod loose;
mod memory;
mod name;
mod packed;

pub use error::Error;
pub use loose::LooseRefStore;
pub use memory::MemoryRefStore;

use gk_hash::ObjectId;

pub const SYMBOLIC_PREFIX: &str = "ref: ";

/// What a ref points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Object(ObjectId),
    Symbolic(String),
}

impl Target {
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Target::Symbolic(_))
    }

    pub fn serialize(&self) -> String {
        match self {
            Target::Object(id) => format!("{}\n", id.to_hex()),
            Target::Symbolic(name) => format!("{SYMBOLIC_PREFIX}{name}\n"),
        }
    }

    pub fn parse(content: &str) -> Target {
        let trimmed = content.trim_end_matches(['\n', '\r']);
        if let Some(name) = trimmed.strip_prefix(SYMBOLIC_PREFIX) {
            Target::Symbolic(name.to_string())
        } else {
            match ObjectId::from_hex(trimmed) {
                Ok(id) => Target::Object(id),
                Err(_) => Target::Symbolic(trimmed.to_string()),
            }
        }
    }
}

/// A resolved ref: `name` is always the originally queried name; when the
/// query followed a symbolic chain, `link_target` names the ultimate
/// referent (spec §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    pub name: String,
    pub target: Target,
    pub link_target: Option<String>,
}

/// CAS precondition for `put`/`delete` (spec §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OldTarget {
    /// No precondition: force the write.
    Any,
    /// Must currently resolve to this object id.
    MustMatch(ObjectId),
    /// Must not currently exist (the `:new` sentinel).
    MustNotExist,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PutOptions {
    pub follow: bool,
}

#[derive(Debug, Clone, Default)]
pub struct PutRequest {
    pub follow: bool,
    pub old_target: Option<OldTarget>,
}

/// Shared contract for loose and in-memory backends (spec §4.5).
pub trait Backend {
    /// All refs under `refs/heads/`, sorted by name (packed-refs excluded
    /// per spec §4.5 base contract; `LooseRefStore` folds packed-refs in
    /// separately via its own `list` override where implemented).
    fn list(&self) -> Result<Vec<String>, Error>;

    fn get(&self, name: &str, follow: bool) -> Result<Ref, Error>;

    fn put(&self, name: &str, target: Target, request: PutRequest) -> Result<(), Error>;

    fn delete(&self, name: &str, old_target: Option<OldTarget>) -> Result<(), Error>;
}

/// Resolves the ref a write to `name` should land on: follows `ref: `
/// entries until it reaches a name that is either absent or holds an
/// object (spec §4.5 put "resolves `name` through symbolic links and
/// writes the terminal ref"). Unlike [`resolve_symbolic_chain`], a missing
/// terminal is not an error — it is the unborn-branch case (e.g. a fresh
/// repo's `HEAD` pointing at `refs/heads/master` before the first commit)
/// and the whole point of calling this is to find out *where* to create it.
pub(crate) fn resolve_symbolic_write_target<F>(name: &str, mut read_one: F) -> Result<String, Error>
where
    F: FnMut(&str) -> Result<Option<Target>, Error>,
{
    let mut current = name.to_string();
    loop {
        match read_one(&current)? {
            None | Some(Target::Object(_)) => return Ok(current),
            Some(Target::Symbolic(next)) => {
                if next == current {
                    return Err(Error::InvalidRef("symbolic ref links to itself"));
                }
                current = next;
            }
        }
    }
}

pub(crate) fn resolve_symbolic_chain<F>(name: &str, follow: bool, mut read_one: F) -> Result<Ref, Error>
where
    F: FnMut(&str) -> Result<Option<Target>, Error>,
{
    let target = read_one(name)?.ok_or(Error::NotFound)?;
    if !follow || !target.is_symbolic() {
        return Ok(Ref {
            name: name.to_string(),
            target,
            link_target: None,
        });
    }
    let mut current = match &target {
        Target::Symbolic(next) => next.clone(),
        Target::Object(_) => unreachable!("checked is_symbolic above"),
    };
    loop {
        let next_target = read_one(&current)?.ok_or(Error::NotFound)?;
        match next_target {
            Target::Object(_) => {
                return Ok(Ref {
                    name: name.to_string(),
                    target: next_target,
                    link_target: Some(current),
                });
            }
            Target::Symbolic(next) => {
                if next == current {
                    return Err(Error::InvalidRef("symbolic ref links to itself"));
                }
                current = next;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_round_trips() {
        let id = ObjectId::compute_from_data("blob", b"x");
        assert_eq!(Target::parse(&Target::Object(id).serialize()), Target::Object(id));
        let sym = Target::Symbolic("refs/heads/main".to_string());
        assert_eq!(Target::parse(&sym.serialize()), sym);
    }
}
