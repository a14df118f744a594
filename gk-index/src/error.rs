#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported dir-cache version")]
    UnsupportedVersion(u32),
    #[error("dir-cache has too many entries ({0}, max is 100000)")]
    TooManyEntries(usize),
    #[error("entries are not fully merged (a stage 1-3 entry exists)")]
    IncompleteMerge,
    #[error("referenced object(s) are missing from the object store")]
    ObjectsMissing,
    #[error("requested prefix was not found in the tree")]
    PrefixNotFound,
    #[error("entries are not in sorted (name, stage) order")]
    NotSorted,
    #[error("invalid entry: {0}")]
    InvalidEntry(&'static str),
    #[error("dir-cache requires version >= 3 for extended flags (skip_worktree/intent_to_add)")]
    RequiresExtendedVersion,
    #[error(transparent)]
    Hash(#[from] gk_hash::Error),
    #[error(transparent)]
    Object(#[from] gk_object::Error),
    #[error(transparent)]
    TrailingHash(#[from] gk_features::hash::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
