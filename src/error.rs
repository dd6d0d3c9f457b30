use std::io;
use thiserror::Error;
use tokio::time::error::Elapsed as TimeElapsed;

use crate::protocol::Reply;

pub type FtpResult<T> = Result<T, Error>;

/// Enum for filesystem and protocol errors
///
/// The first group of variants are semantic signals a caller can act on
/// without looking at error text. Everything else is opaque and usually
/// arrives wrapped in [`Error::Context`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("object not found")]
    ObjectNotFound,
    #[error("directory not found")]
    DirNotFound,
    #[error("is a file not a directory")]
    IsFile,
    #[error("can't copy directory - destination already exists")]
    DirExists,
    #[error("can't move object - incompatible remotes")]
    CantMove,
    #[error("can't move directory - incompatible remotes")]
    CantDirMove,
    #[error("hash type not supported")]
    HashUnsupported,
    /// Contains a well-formed reply carrying an unexpected status code
    #[error("{0}")]
    Status(Reply),
    /// Any errors related to I/O on the control or data channel
    #[error("I/O: {0}")]
    IO(String),
    /// Connecting and logging in took longer than the connect timeout
    #[error("Timeout")]
    Timeout,
    /// Occurs when server behavior differs from the protocol
    #[error("{0}")]
    UnexpectedBehavior(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Returns the innermost error, skipping every context layer.
    #[must_use]
    pub fn cause(&self) -> &Error {
        let mut err = self;
        while let Self::Context { source, .. } = err {
            err = source;
        }
        err
    }

    /// Returns the reply if the root cause is a protocol status reply.
    #[must_use]
    pub fn status(&self) -> Option<&Reply> {
        match self.cause() {
            Self::Status(reply) => Some(reply),
            _ => None,
        }
    }

    /// Wraps the error with the context of the failing operation.
    #[must_use]
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }
}

impl From<Reply> for Error {
    fn from(reply: Reply) -> Self {
        Self::Status(reply)
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Self::IO(error.to_string())
    }
}

impl From<TimeElapsed> for Error {
    fn from(_: TimeElapsed) -> Self {
        Self::Timeout
    }
}

pub trait ResultExt<T> {
    /// Wraps the error, if any, with operation context.
    fn context<C: Into<String>>(self, context: C) -> FtpResult<T>;
}

impl<T> ResultExt<T> for FtpResult<T> {
    fn context<C: Into<String>>(self, context: C) -> FtpResult<T> {
        self.map_err(|err| err.context(context))
    }
}
