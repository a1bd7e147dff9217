//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use cgen::{DEFAULT_VERSION, EmitConfig, Formatter};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "cgen")]
#[command(about = "Suspendible codec C generator - lowers type-checked packages to C")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate C source for a JSON-encoded package
    Gen {
        /// Input package (JSON)
        #[arg(value_name = "PACKAGE")]
        input: PathBuf,

        /// Output C file (defaults to the input path with a .c extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        emit: EmitArgs,
    },
    /// Write the base prelude shared by all generated packages
    Prelude {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        emit: EmitArgs,
    },
}

/// Options shared by every generating command.
#[derive(Args, Clone, Debug)]
pub struct EmitArgs {
    /// Skip the external formatter
    #[arg(long)]
    pub no_format: bool,

    /// Formatter command (e.g. "clang-format -style=Chromium")
    #[arg(long, value_name = "CMD")]
    pub formatter: Option<Formatter>,

    /// Omit section banners and the generated-code notice
    #[arg(long)]
    pub no_comments: bool,

    /// Version token checked by constructors (decimal or 0x-prefixed hex)
    #[arg(long, value_name = "TOKEN", value_parser = parse_u32, default_value_t = DEFAULT_VERSION)]
    pub version_token: u32,

    /// Deepest accepted expression nesting
    #[arg(long)]
    pub max_expr_depth: Option<u32>,

    /// Deepest accepted statement nesting
    #[arg(long)]
    pub max_body_depth: Option<u32>,
}

impl EmitArgs {
    /// Emit configuration selected by these flags.
    pub fn config(&self) -> EmitConfig {
        let mut config = EmitConfig::default()
            .with_version(self.version_token)
            .with_comments(!self.no_comments);
        if let Some(depth) = self.max_expr_depth {
            config = config.with_max_expr_depth(depth);
        }
        if let Some(depth) = self.max_body_depth {
            config = config.with_max_body_depth(depth);
        }
        config
    }

    /// Formatter selected by these flags.
    pub fn formatter(&self) -> Option<Formatter> {
        if self.no_format {
            None
        } else {
            Some(self.formatter.clone().unwrap_or_default())
        }
    }
}

fn parse_u32(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(&hex.replace('_', ""), 16),
        None => s.replace('_', "").parse(),
    };
    parsed.map_err(|e| format!("invalid version token '{s}': {e}"))
}
