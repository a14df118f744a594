#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository handle is not valid")]
    InvalidRepository,
    #[error("ref does not hold a symbolic target")]
    NotSymbolic,
    #[error("working tree is already attached")]
    WorkingTreeAlreadySet,
    #[error(transparent)]
    Hash(#[from] gk_hash::Error),
    #[error(transparent)]
    Object(#[from] gk_object::Error),
    #[error(transparent)]
    Odb(#[from] gk_odb::Error),
    #[error(transparent)]
    Index(#[from] gk_index::Error),
    #[error(transparent)]
    Ref(#[from] gk_ref::Error),
    #[error(transparent)]
    Config(#[from] gk_config::Error),
    #[error(transparent)]
    Actor(#[from] gk_actor::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
