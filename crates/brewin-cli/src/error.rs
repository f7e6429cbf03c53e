//! Runtime errors.
//!
//! Every error is fatal: the first one raised aborts the whole run. The kind
//! is what a Brewin program's observer sees; the message is descriptive only.

use std::fmt;

use thiserror::Error;

use crate::host::HostError;
use crate::trace::ReplayError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Undeclared variable or function, redeclaration, unknown field,
    /// wrong argument count, missing `main`.
    Name,
    /// Operand, assignment, parameter or return type mismatch; non-boolean
    /// condition; unknown struct type.
    Type,
    /// Field access through a `nil` struct reference, and other faults of a
    /// running program (division by zero, call depth).
    Fault,
    /// The console channel failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Name => "NameError",
            ErrorKind::Type => "TypeError",
            ErrorKind::Fault => "FaultError",
            ErrorKind::Io => "IoError",
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn name(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Name,
            message: message.into(),
        }
    }

    pub fn type_(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Type,
            message: message.into(),
        }
    }

    pub fn fault(message: impl Into<String>) -> Self {
        RuntimeError {
            kind: ErrorKind::Fault,
            message: message.into(),
        }
    }

    pub fn undefined_variable(name: &str) -> Self {
        Self::name(format!("variable `{name}` used and not declared"))
    }

    pub fn undefined_function(name: &str) -> Self {
        Self::name(format!("function `{name}` was not found"))
    }

    pub fn arity_mismatch(name: &str, got: usize) -> Self {
        Self::name(format!(
            "incorrect argument count: no overload of `{name}` takes {got} argument(s)"
        ))
    }
}

impl From<HostError> for RuntimeError {
    fn from(e: HostError) -> Self {
        RuntimeError {
            kind: ErrorKind::Io,
            message: e.to_string(),
        }
    }
}

impl From<ReplayError> for RuntimeError {
    fn from(e: ReplayError) -> Self {
        HostError::from(e).into()
    }
}
