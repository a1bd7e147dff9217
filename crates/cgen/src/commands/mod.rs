//! Command implementations.

mod generate;

use crate::cli::{Cli, Commands};

/// Dispatch CLI command to the appropriate handler.
pub fn run_command(cli: &Cli) -> i32 {
    match &cli.command {
        Commands::Gen {
            input,
            output,
            emit,
        } => generate::cmd_gen(input, output.as_deref(), emit),
        Commands::Prelude { output, emit } => generate::cmd_prelude(output.as_deref(), emit),
    }
}
