#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid tree object: {0}")]
    InvalidTree(&'static str),
    #[error("invalid commit object: {0}")]
    InvalidCommit(&'static str),
    #[error("invalid tag object: {0}")]
    InvalidTag(&'static str),
    #[error("invalid author line: {0}")]
    InvalidAuthor(&'static str),
    #[error("invalid committer line: {0}")]
    InvalidCommitter(&'static str),
    #[error("invalid commit message")]
    InvalidMessage,
    #[error("invalid parent header")]
    InvalidParents,
    #[error("invalid parent object id")]
    InvalidParentIds,
    #[error("malformed object body: {0}")]
    InvalidFormat(&'static str),
    #[error(transparent)]
    Hash(#[from] gk_hash::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
