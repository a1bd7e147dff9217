//! C code emission backend.
//!
//! Generates one C file per package, compilable with clang or gcc. Every
//! suspendible function becomes a resumable coroutine driven by a status
//! code and a saved frame in its receiver.

mod emitter;
mod header;
mod project;
mod structs;

pub use emitter::*;
pub use header::*;
pub use project::*;
