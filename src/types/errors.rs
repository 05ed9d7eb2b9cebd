use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Hard parse failures. Anything softer is reported as a [`ParseWarning`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Source is empty")]
    EmptySource,
    #[error("Could not find Scriptname declaration")]
    MissingIdentity,
}

/// A malformed declaration the parser skipped while keeping the rest of the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    /// 1-based line in the original text.
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Error taxonomy for a generator run.
///
/// Only `Config` and `Io` on the output root are fatal for a whole run;
/// every other variant is scoped to one container or one script.
#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("Corrupt archive {}: {reason}", path.display())]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("Parse failure: {0}")]
    ParseFailure(#[from] ParseError),

    #[error("Decompile failure: {0}")]
    DecompileFailure(String),

    #[error("No source found: {0}")]
    ResolutionMiss(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for HeaderError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type HeaderResult<T> = Result<T, HeaderError>;

#[cfg(test)]
#[path = "tests/errors_tests.rs"]
mod tests;
