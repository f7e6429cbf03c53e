#![deny(unused_must_use)]
#![warn(clippy::dbg_macro, clippy::todo, clippy::unimplemented)]
#![forbid(unsafe_code)]

mod coerce;
mod types;
mod value;

pub use coerce::{check_type, coerce, default_value};
pub use types::TypeTag;
pub use value::{Binding, StructValue, Value};
