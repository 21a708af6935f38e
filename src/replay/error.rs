//! Request handling errors
//!
//! Every failure maps onto one of three client-visible kinds. The `Display`
//! text carries paths and causes for the server log only; clients get the
//! generic message from [`ErrorKind::client_message`].

use crate::store::StoreError;
use hyper::StatusCode;

/// Client-visible failure class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidRequest,
    NotFound,
    InternalError,
}

impl ErrorKind {
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn client_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "INVALID REQUEST",
            Self::NotFound => "Not Found",
            Self::InternalError => "Error",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("invalid request path {path:?}: {reason}")]
    InvalidRequest { path: String, reason: &'static str },

    #[error("{0}")]
    NotFound(#[source] StoreError),

    #[error("failed to read descriptor: {0}")]
    ReadDescriptor(#[source] StoreError),

    #[error("failed to record request: {0}")]
    Record(#[source] StoreError),

    #[error("{code} unknown response code")]
    UnknownCode { code: u16 },
}

impl ReplayError {
    /// Map a descriptor load failure, keeping "missing" apart from other I/O
    pub fn from_load(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err),
            StoreError::Io { .. } => Self::ReadDescriptor(err),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::ReadDescriptor(_) | Self::Record(_) | Self::UnknownCode { .. } => {
                ErrorKind::InternalError
            }
        }
    }

    pub const fn status(&self) -> StatusCode {
        self.kind().status()
    }
}
