//! Error records attached to the blocks where they occurred.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// A recoverable expectation failure; the block kept running.
    ExpectFailed,
    /// A failed assumption; the rest of the block was cut short.
    AssumeFailed,
    /// A panic, or a matcher that could not evaluate its inputs.
    Other,
}

/// One resolved stack location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Demangled function name, when symbols are available.
    pub name: Option<String>,
    /// Source file name, final path component only.
    pub file: String,
    pub line: u32,
}

impl Frame {
    /// Frame for the immediate caller, used as the single-frame stack of
    /// an expectation failure.
    #[track_caller]
    pub(crate) fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self {
            name: None,
            file: base_name(location.file()),
            line: location.line(),
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{name} ({}:{})", self.file, self.line),
            None => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

/// An error recorded against one block.
///
/// Value equality is the deduplication relation: a re-run that reproduces
/// an identical failure merges into the existing record instead of
/// repeating it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecError {
    pub kind: ErrorKind,
    /// Failure description: a matcher description or a panic message.
    pub message: String,
    /// `Debug` rendering of the checked value; empty for panics.
    pub actual: String,
    /// Call site of the failed checkpoint, or the normalized panic stack.
    pub stack: Vec<Frame>,
}

impl SpecError {
    pub(crate) fn other(message: String, stack: Vec<Frame>) -> Self {
        Self {
            kind: ErrorKind::Other,
            message,
            actual: String::new(),
            stack,
        }
    }
}

impl fmt::Display for SpecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ErrorKind::ExpectFailed => {
                writeln!(f, "Expected: {}", self.message)?;
                write!(f, "     got: {}", self.actual)?;
            }
            ErrorKind::AssumeFailed => {
                writeln!(f, "Assumed: {}", self.message)?;
                write!(f, "    got: {}", self.actual)?;
            }
            ErrorKind::Other => write!(f, "{}", self.message)?,
        }
        for frame in &self.stack {
            write!(f, "\nat {frame}")?;
        }
        Ok(())
    }
}

/// Final component of a source path, matching how reports name files.
pub(crate) fn base_name(path: &str) -> String {
    path.rsplit(['/', '\\']).next().unwrap_or(path).to_string()
}
