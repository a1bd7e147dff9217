//! Gen and prelude commands.

use std::path::Path;

use cgen::Generator;
use tracing::{error, info};

use crate::cli::{EXIT_FAILURE, EXIT_SUCCESS, EmitArgs};

fn generator(emit: &EmitArgs) -> Generator {
    let generator = Generator::new(emit.config());
    match emit.formatter() {
        Some(f) => generator.with_formatter(f),
        None => generator,
    }
}

/// Handle the `gen` command.
pub fn cmd_gen(input: &Path, output: Option<&Path>, emit: &EmitArgs) -> i32 {
    let output = output.map_or_else(|| input.with_extension("c"), Path::to_path_buf);
    info!(input = %input.display(), output = %output.display(), "generating");

    match generator(emit).generate_file(input, &output) {
        Ok(path) => {
            info!(output = %path.display(), "done");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, "generation failed");
            EXIT_FAILURE
        }
    }
}

/// Handle the `prelude` command.
pub fn cmd_prelude(output: Option<&Path>, emit: &EmitArgs) -> i32 {
    let code = match generator(emit).prelude() {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "prelude generation failed");
            return EXIT_FAILURE;
        }
    };
    let Some(path) = output else {
        print!("{code}");
        return EXIT_SUCCESS;
    };
    match std::fs::write(path, code) {
        Ok(()) => {
            info!(output = %path.display(), "wrote prelude");
            EXIT_SUCCESS
        }
        Err(e) => {
            error!(error = %e, output = %path.display(), "failed to write prelude");
            EXIT_FAILURE
        }
    }
}
