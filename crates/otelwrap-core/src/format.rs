// Source formatters applied to generated code before it is written.

use std::io::{self, Write};
use std::process::{Command, Stdio};

use crate::errors::{GenerateError, Result};
use crate::loader::GoParser;

/// Canonicalizes generated source, or rejects it as syntactically invalid
pub trait SourceFormatter {
    fn format(&self, source: &str) -> Result<String>;
}

/// Pipes the source through the `gofmt` binary
#[derive(Debug, Clone)]
pub struct Gofmt {
    program: String,
}

impl Default for Gofmt {
    fn default() -> Self {
        Self {
            program: "gofmt".to_string(),
        }
    }
}

impl Gofmt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// True when the program can be started.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-l")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .is_ok()
    }
}

impl SourceFormatter for Gofmt {
    fn format(&self, source: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "gofmt stdin unavailable"))?;
            stdin.write_all(source.as_bytes())?;
        }

        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(GenerateError::Syntax {
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        String::from_utf8(output.stdout)
            .map_err(|e| GenerateError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
    }
}

/// Leaves the text unchanged after checking that it parses as Go
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntaxCheck;

impl SourceFormatter for SyntaxCheck {
    fn format(&self, source: &str) -> Result<String> {
        match GoParser::new()?.syntax_error(source)? {
            Some(message) => Err(GenerateError::Syntax { message }),
            None => Ok(source.to_string()),
        }
    }
}
