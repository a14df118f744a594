#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("variable assignment outside any section header")]
    MissingSectionHeader,
    #[error("multiple occurrences of a variable exist; specify replace_all")]
    ReplacingMultivar,
    #[error("unknown escape sequence '\\{0}'")]
    UnknownEscapeSequence(char),
    #[error("malformed config text: {0}")]
    InvalidFormat(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
