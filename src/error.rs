use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::source::UnterminatedBlock;
use crate::tables::TableTooLarge;

/// A fatal error of a generator run.
#[derive(Debug)]
pub enum Error {
    /// An input could not be read or an artifact could not be written.
    Io { path: PathBuf, source: io::Error },
    /// A parameter struct never closes. Only raised in strict mode.
    UnterminatedBlock(UnterminatedBlock),
    /// A requested table exceeds the index width limit.
    TableTooLarge(TableTooLarge),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io { path, source } => {
                write!(f, "{}: {source}", path.display())
            }
            Error::UnterminatedBlock(err) => write!(f, "{err}"),
            Error::TableTooLarge(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<UnterminatedBlock> for Error {
    fn from(err: UnterminatedBlock) -> Self {
        Error::UnterminatedBlock(err)
    }
}

impl From<TableTooLarge> for Error {
    fn from(err: TableTooLarge) -> Self {
        Error::TableTooLarge(err)
    }
}
