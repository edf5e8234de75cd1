use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Broad classification of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize, derive_more::Display)]
pub enum ErrorKind {
    #[display("not found")]
    NotFound,
    #[display("internal error")]
    Internal,
    #[display("bad request")]
    BadRequest,
    #[display("not initialized")]
    NotInitialized,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    /// Extend an error message with additional context, keeping the same kind.
    pub fn context(self, context: impl Display) -> Self {
        Self {
            message: format!("{context}: {}", self.message),
            kind: self.kind,
        }
    }

    /// Stock error for when a requested object is not known.
    ///
    /// It is generally best practice to extend the error message with more specific information
    /// using [`context`](Self::context).
    pub fn not_found() -> Self {
        Self {
            message: "not found".to_string(),
            kind: ErrorKind::NotFound,
        }
    }

    /// An error internal to the service.
    ///
    /// This can either indicate an internal consistency error, or a transient failure of some inner
    /// component that is out of the caller's control, such as the chain transport.
    pub fn internal() -> Self {
        Self {
            message: "internal error".to_string(),
            kind: ErrorKind::Internal,
        }
    }

    /// An error arising from malformed input.
    pub fn bad_request() -> Self {
        Self {
            message: "bad request".to_string(),
            kind: ErrorKind::BadRequest,
        }
    }

    /// The requested data depends on a chain target that has not been selected yet.
    pub fn not_initialized() -> Self {
        Self {
            message: "not initialized".to_string(),
            kind: ErrorKind::NotInitialized,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Error {}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::internal().context(format!("{err:#}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::internal().context(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::internal().context(err)
    }
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Extension functions for converting other result types into [`Result`].
pub trait ResultExt {
    type Ok;

    /// Wrap an error with a stock [`Error`], preserving the original error context.
    fn context(self, f: impl FnOnce() -> Error) -> Result<Self::Ok>;
}

impl<T, E> ResultExt for Result<T, E>
where
    E: std::error::Error,
{
    type Ok = T;

    fn context(self, f: impl FnOnce() -> Error) -> Result<<Self as ResultExt>::Ok> {
        self.map_err(|err| f().context(err))
    }
}

macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !$cond {
            return Err($err);
        }
    };
}
pub(crate) use ensure;
