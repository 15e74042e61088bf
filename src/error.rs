use std::io;

use crate::{
    common::{BoxError, ParseError},
    decode::DecodeError,
    postgres::error::{DatabaseError, ProtocolError},
};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// All possible errors produced by this crate.
#[derive(thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[source] BoxError),

    #[error("{0}")]
    Config(#[from] ParseError),

    #[error("{0}")]
    Protocol(#[from]#[source] ProtocolError),

    #[error("Io error: {0}")]
    Io(#[from]#[source] io::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("{0}")]
    Decode(#[from] #[source] DecodeError),

    #[error("{0}")]
    Encode(#[from] #[source] crate::encode::EncodeError),

    /// Caller misuse: wrong connection owner, operating on a closed connection, or mixing a
    /// manual `BEGIN`/`COMMIT` with a scoped [`transaction`][crate::transaction].
    #[error("{0}")]
    Interface(BoxError),

    /// Bad query input: a NUL byte in the SQL text, or a value shape the encoder can't send
    /// (e.g. a ragged array).
    #[error("{0}")]
    Programming(BoxError),

    #[error("acquire timed out")]
    Timeout,

    #[error("query returned no rows")]
    RowNotFound,

    #[error(transparent)]
    Other(BoxError)
}

impl std::fmt::Debug for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self, f)?;
        // TODO: how to differentiate
        // if let Some(err) = std::error::Error::source(&self) {
        //     write!(f, "\n\nCaused By:\n    {err}")?;
        // }
        Ok(())
    }
}

/// general error return
macro_rules! err {
    ($variant:ident,$source:ident) => {
        Err(crate::error::Error::$variant($source.into()))
    };
    ($variant:ident,$str:literal,$($tt:tt)*) => {
        Err(crate::error::Error::$variant(err!($str,$($tt)*).into()))
    };
    ($variant:ident,$($tt:tt)*) => {
        Err(crate::error::Error::$variant($($tt)*.into()))
    };
    ($($tt:tt)*) => {
        crate::common::GeneralError::new(format!($($tt)*))
    };
}

pub(crate) use err;

