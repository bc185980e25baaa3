//! Term-stack interpreter (spec.md §4.2).

pub mod interpreter;
pub mod term;

pub use interpreter::{InterpEnv, LoaderHost, TermStack};
pub use term::{StackEntry, Term};
