//! Shared C text: the base prelude every package includes, and the
//! per-package status codes.

use std::fmt::Write;

use crate::config::EmitConfig;
use crate::tables::Status;

/// Generate the base prelude, guarded so that several generated packages
/// can be compiled into one translation unit.
#[must_use]
pub fn gen_prelude(cfg: &EmitConfig) -> String {
    let mut s = String::from("#ifndef CGEN_BASE_HEADER_H\n#define CGEN_BASE_HEADER_H\n\n");
    s.push_str(&gen_includes_and_constants(cfg));
    s.push_str(&gen_types());
    s.push_str(&gen_slice_helpers());
    s.push_str(&gen_load_store());
    s.push_str(&gen_min_max());
    s.push_str(&gen_cursor_helpers());
    s.push_str(&gen_writer_copies());
    s.push_str("#endif  // CGEN_BASE_HEADER_H\n\n");
    s
}

/// Status type and codes of package `pkg`. Odd codes are errors.
#[must_use]
pub fn gen_status_codes(pkg: &str) -> String {
    let mut s = format!("typedef int32_t cgen_{pkg}_status;\n\n");
    for status in Status::ALL {
        let _ = writeln!(s, "#define {} {}", status.c_name(pkg), status.value());
    }
    let _ = writeln!(
        s,
        "\n#define CGEN_{}_STATUS_IS_ERROR(s) (((s) & 1) != 0)\n",
        pkg.to_ascii_uppercase()
    );
    s
}

mod helpers;
mod io;
mod prelude;

use helpers::{gen_load_store, gen_min_max, gen_slice_helpers};
use io::{gen_cursor_helpers, gen_writer_copies};
use prelude::{gen_includes_and_constants, gen_types};
