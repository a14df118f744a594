#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("ref name is invalid: {0}")]
    InvalidRef(&'static str),
    #[error("name does not match the ref grammar: {0}")]
    InvalidName(&'static str),
    #[error("ref not found")]
    NotFound,
    #[error("target object does not exist")]
    TargetNotFound,
    #[error("target object is not a commit")]
    TargetNotCommit,
    #[error("old_target did not match the ref's current value")]
    OldTargetNotMatched,
    #[error("repository is bare; commit-type verification was skipped")]
    Bare,
    #[error(transparent)]
    Odb(#[from] gk_odb::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
