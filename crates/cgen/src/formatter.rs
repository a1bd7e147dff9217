//! External C formatter.

use std::io::Write;
use std::process::{Command, Stdio};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// Formatter command the generated C is piped through.
///
/// Accepts any command line that reads C on stdin and writes it to stdout,
/// e.g. "clang-format -style=Chromium" or "clang-format-18 -style=Google".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Formatter {
    command: String,
    args: Vec<String>,
}

impl Formatter {
    /// Create a formatter with the given command and arguments.
    pub fn new(command: impl Into<String>, args: &[&str]) -> Self {
        Self {
            command: command.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }

    /// `clang-format -style=Chromium`.
    #[must_use]
    pub fn clang_format() -> Self {
        Self::new("clang-format", &["-style=Chromium"])
    }

    /// Command to invoke.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the command can be found on `PATH`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        Command::new("which")
            .arg(&self.command)
            .output()
            .is_ok_and(|o| o.status.success())
    }

    /// Run `code` through the formatter.
    ///
    /// # Errors
    ///
    /// Fails if the command cannot be spawned or exits unsuccessfully.
    pub fn format(&self, code: &str) -> Result<String> {
        debug!(formatter = %self, bytes = code.len(), "formatting");
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        // Written while stdout drains.
        let writer = child.stdin.take().map(|mut stdin| {
            let bytes = code.as_bytes().to_vec();
            std::thread::spawn(move || stdin.write_all(&bytes))
        });
        let output = child.wait_with_output()?;
        let written = writer.map(std::thread::JoinHandle::join);
        if !output.status.success() {
            return Err(Error::FormatFailed {
                command: self.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Some(written) = written {
            written.map_err(|_| Error::FormatFailed {
                command: self.to_string(),
                message: "stdin writer panicked".to_string(),
            })??;
        }
        String::from_utf8(output.stdout).map_err(|e| Error::FormatFailed {
            command: self.to_string(),
            message: e.to_string(),
        })
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::clang_format()
    }
}

impl FromStr for Formatter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let Some(command) = parts.next() else {
            return Err("formatter command cannot be empty".to_string());
        };
        Ok(Self {
            command: command.to_string(),
            args: parts.map(str::to_string).collect(),
        })
    }
}

impl std::fmt::Display for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.command)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
