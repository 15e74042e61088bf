//! Protocol error
mod database;

pub use database::DatabaseError;

use super::BackendMessage;

/// An error when translating buffer from postgres
#[derive(Debug)]
pub enum ProtocolError {
    Unexpected {
        expect: Option<u8>,
        found: u8,
        phase: Option<&'static str>,
    },

    UnknownAuth { auth: u32 },

    /// Observed but not completed: SCRAM requires a multi-message handshake this crate does
    /// not drive yet.
    UnsupportedAuth { method: &'static str },

    MissingNulTerminator,

    MissingBackendKeyData,
}

impl std::error::Error for ProtocolError {}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unexpected { expect, found, phase } => {
                write!(f, "unexpected message type {found:#x}")?;
                if let Some(expect) = expect {
                    write!(f, ", expected {expect:#x}")?;
                }
                if let Some(phase) = phase {
                    write!(f, " while {phase}")?;
                }
                Ok(())
            }
            Self::UnknownAuth { auth } => write!(f, "server requested unknown authentication method {auth}"),
            Self::UnsupportedAuth { method } => write!(f, "unsupported authentication method: {method}"),
            Self::MissingNulTerminator => write!(f, "server sent a string that was not nul terminated"),
            Self::MissingBackendKeyData => write!(f, "server never sent BackendKeyData during startup"),
        }
    }
}

impl ProtocolError {
    pub(crate) fn unknown(found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected(expect: u8, found: u8) -> ProtocolError {
        Self::Unexpected {
            expect: Some(expect),
            found,
            phase: None,
        }
    }

    pub(crate) fn unexpected_phase(found: u8, phase: &'static str) -> ProtocolError {
        Self::Unexpected {
            expect: None,
            found,
            phase: Some(phase),
        }
    }

    pub(crate) fn unknown_auth(auth: u32) -> ProtocolError {
        Self::UnknownAuth { auth }
    }

    pub(crate) fn unsupported_auth(method: &'static str) -> ProtocolError {
        Self::UnsupportedAuth { method }
    }
}

