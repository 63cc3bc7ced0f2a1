//! Core data types for the summarization pipeline.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// How a code unit was carved out of its source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// Whole file (or the preamble segment of a structurally split file)
    Module,
    /// A top-level class/struct/type declaration
    Class,
    /// A top-level function declaration
    Function,
    /// A fixed-size, token-budgeted slice used when structural
    /// decomposition is unavailable or failed
    Chunk,
}

impl std::fmt::Display for UnitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Class => write!(f, "class"),
            Self::Function => write!(f, "function"),
            Self::Chunk => write!(f, "chunk"),
        }
    }
}

/// A named, ordered slice of one source file.
///
/// Invariant: concatenating a file's units in ordinal order covers the file
/// content without omission; the chunk fallback reproduces it exactly.
#[derive(Debug, Clone)]
pub struct CodeUnit {
    pub kind: UnitKind,
    pub name: String,
    pub text: String,
    /// Position within the file, following source order
    pub ordinal: usize,
}

impl CodeUnit {
    pub fn new(kind: UnitKind, name: impl Into<String>, text: impl Into<String>, ordinal: usize) -> Self {
        Self {
            kind,
            name: name.into(),
            text: text.into(),
            ordinal,
        }
    }
}

/// The final summary for one source file, ready for injection.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Absolute path of the summarized source file
    pub source_path: PathBuf,
    /// Markdown body to inject into the documentation file
    pub body: String,
    /// Units that degraded to a placeholder blurb instead of a real
    /// summary; zero means the summary is complete
    pub degraded_units: usize,
}

impl Summary {
    pub fn new(source_path: impl Into<PathBuf>, body: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            body: body.into(),
            degraded_units: 0,
        }
    }

    pub fn with_degraded(mut self, degraded_units: usize) -> Self {
        self.degraded_units = degraded_units;
        self
    }

    /// Whether every unit produced a real summary
    pub fn is_complete(&self) -> bool {
        self.degraded_units == 0
    }
}
