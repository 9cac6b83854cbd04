use std::io;

#[derive(Debug, thiserror::Error)]
pub enum VerificationError {
    #[error("malformed checksum '{0}': expected '<algorithm>:<hex digest>'")]
    Malformed(String),

    #[error("unsupported checksum algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, VerificationError>;
