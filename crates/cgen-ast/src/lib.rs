//! Typed syntax tree consumed by the C backend.
//!
//! Trees arrive type checked: every expression carries its resolved type and
//! folded constant, loops carry dense ids, and built-in method names are
//! already classified. Everything derives serde so a front end can hand a
//! package over as JSON.

mod builder;
mod decl;
mod expr;
mod method;
mod ops;
mod stmt;
mod types;

pub use builder::*;
pub use decl::*;
pub use expr::*;
pub use method::*;
pub use ops::*;
pub use stmt::*;
pub use types::*;
