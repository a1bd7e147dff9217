//! cgen - suspendible codec packages to C
//!
//! Reads a type-checked package (JSON-encoded [`ast::Package`]) and writes a
//! single C file: header half, then implementation half.
//!
//! # Example
//!
//! ```ignore
//! use cgen::{EmitConfig, Generator};
//!
//! let generator = Generator::new(EmitConfig::default());
//! let out = generator.generate_file("gif.json", "gif.c")?;
//! ```

mod error;
mod formatter;
mod pipeline;

pub use cgen_ast as ast;
pub use cgen_emit::{DEFAULT_VERSION, EmitConfig, GenError, HEADER_ENDS_MARKER, generate, prelude};
pub use error::*;
pub use formatter::*;
pub use pipeline::*;

use std::path::Path;

use ast::Package;

/// Parse a JSON-encoded package.
pub fn parse_package(json: &str) -> Result<Package> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse a JSON-encoded package from `path`.
pub fn load_package(path: impl AsRef<Path>) -> Result<Package> {
    let json = std::fs::read_to_string(path)?;
    parse_package(&json)
}
