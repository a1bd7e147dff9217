//! C code generation for suspendible codec packages.
//!
//! Lowers a type-checked [`cgen_ast::Package`] to one C source file:
//! - Expressions render as fully parenthesized C
//! - Reads and writes that may run out of data suspend and resume
//! - Structs carry their methods' saved frames
//! - Constructors guard against use before initialization

pub mod c;
mod config;
mod error;
pub mod jump;
pub mod tables;

pub use c::*;
pub use config::*;
pub use error::*;

use cgen_ast::Package;

/// Generate the C source for `pkg`.
pub fn generate(pkg: &Package, config: &EmitConfig) -> Result<String> {
    CPackage::new(pkg, config).generate()
}

/// Generate only the base prelude.
#[must_use]
pub fn prelude(config: &EmitConfig) -> String {
    gen_prelude(config)
}
