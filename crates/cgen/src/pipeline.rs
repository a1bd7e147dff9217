//! Generation pipeline - JSON → package → C → formatter.

use std::path::{Path, PathBuf};

use cgen_ast::Package;
use cgen_emit::EmitConfig;
use tracing::{info, warn};

use crate::{Formatter, Result, load_package};

/// Generation pipeline.
#[derive(Clone, Debug, Default)]
pub struct Generator {
    /// Emit configuration.
    pub config: EmitConfig,
    /// Formatter the output is piped through, if any.
    pub formatter: Option<Formatter>,
}

impl Generator {
    /// Create a generator that writes unformatted C.
    #[must_use]
    pub const fn new(config: EmitConfig) -> Self {
        Self {
            config,
            formatter: None,
        }
    }

    /// Pipe output through `formatter`.
    #[must_use]
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Generate (and format) the C source for `pkg`.
    pub fn generate(&self, pkg: &Package) -> Result<String> {
        let code = cgen_emit::generate(pkg, &self.config)?;
        self.format(code)
    }

    /// Generate (and format) the base prelude only.
    pub fn prelude(&self) -> Result<String> {
        self.format(cgen_emit::prelude(&self.config))
    }

    /// Read the package at `input` and write its C source to `output`.
    ///
    /// Returns the output path.
    pub fn generate_file(&self, input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<PathBuf> {
        let input = input.as_ref();
        let output = output.as_ref();
        let pkg = load_package(input)?;
        info!(
            package = %pkg.name,
            structs = pkg.structs.len(),
            funcs = pkg.funcs.len(),
            "loaded package"
        );
        let code = self.generate(&pkg)?;
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(output, &code)?;
        info!(output = %output.display(), bytes = code.len(), "wrote C source");
        Ok(output.to_path_buf())
    }

    fn format(&self, code: String) -> Result<String> {
        match &self.formatter {
            Some(f) if f.is_available() => f.format(&code),
            Some(f) => {
                warn!(formatter = %f, "formatter not found, writing unformatted output");
                Ok(code)
            }
            None => Ok(code),
        }
    }
}
