//! Console host: the input/output channel behind `print`, `inputi` and
//! `inputs`.
//!
//! The interpreter only ever talks to a `Console`. The binary wires up
//! `StdConsole`; tests use `BufferConsole` to script input and capture
//! output. Tracing and replay wrappers live in `crate::trace`.

use std::collections::VecDeque;
use std::io::{BufRead, Write};

use thiserror::Error;

use crate::trace::ReplayError;

/// Errors from the console channel.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("console I/O error: {0}")]
    Io(String),
    /// Trace write failure; execution must abort
    #[error("trace write error (execution aborted): {0}")]
    TraceWrite(String),
    /// A replayed run diverged from its recording
    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        HostError::Io(e.to_string())
    }
}

/// Line-oriented program I/O.
pub trait Console {
    /// Write one line of program output.
    fn write_line(&mut self, line: &str) -> Result<(), HostError>;

    /// Read one line of program input without its line terminator.
    /// End of input reads as the empty string.
    fn read_line(&mut self) -> Result<String, HostError>;
}

impl<C: Console + ?Sized> Console for &mut C {
    fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        (**self).write_line(line)
    }

    fn read_line(&mut self) -> Result<String, HostError> {
        (**self).read_line()
    }
}

/// Console over arbitrary reader/writer pairs; stdin/stdout by default.
pub struct StdConsole {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
}

impl std::fmt::Debug for StdConsole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StdConsole").finish_non_exhaustive()
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new(
            Box::new(std::io::BufReader::new(std::io::stdin())),
            Box::new(std::io::stdout()),
        )
    }
}

impl StdConsole {
    pub fn new(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        Self { input, output }
    }

    /// Stdout for output, the given reader for input.
    pub fn with_input(input: Box<dyn BufRead>) -> Self {
        Self::new(input, Box::new(std::io::stdout()))
    }
}

impl Console for StdConsole {
    fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        writeln!(self.output, "{}", line)?;
        // Prompts must be visible before the next read blocks.
        self.output.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, HostError> {
        let mut buf = String::new();
        self.input.read_line(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        Ok(buf)
    }
}

/// In-memory console: scripted input, captured output.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    input: VecDeque<String>,
    output: Vec<String>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: Vec::new(),
        }
    }

    /// Lines written so far.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_output(self) -> Vec<String> {
        self.output
    }

    /// Input lines not yet consumed.
    pub fn remaining_input(&self) -> usize {
        self.input.len()
    }
}

impl Console for BufferConsole {
    fn write_line(&mut self, line: &str) -> Result<(), HostError> {
        self.output.push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, HostError> {
        Ok(self.input.pop_front().unwrap_or_default())
    }
}
