use std::io;

use thiserror::Error;

/// The single failure type returned by every public operation.
///
/// Variants distinguish the internal failure kinds spec'd for diagnostics;
/// callers that only care "did it fail" can match on `Err(_)` as usual.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("file not found")]
    NotFound,

    #[error("a file with that name already exists")]
    NameCollision,

    #[error("no free slots available")]
    TableFull,

    #[error("disk is full")]
    DiskFull,

    #[error("file is currently open")]
    Busy,

    #[error("invalid disk image: {0}")]
    InvalidImage(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, FsError>;
