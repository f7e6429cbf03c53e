//! Brewin interpreter: runs a parsed Brewin program against a console.

#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

pub mod env;
pub mod error;
pub mod eval;
pub mod functions;
pub mod host;
pub mod structs;
pub mod trace;
pub mod typing;

pub use error::{ErrorKind, Result, RuntimeError};
pub use eval::{run_program, ControlFlow, Interpreter};
pub use host::{BufferConsole, Console, HostError, StdConsole};
pub use trace::{ReplayConsole, ReplayError, TraceEmitter, TraceReplayer, TracedConsole};
