use atomc_util::{LexError, RuntimeError, SemError};
use thiserror::Error;

/// Top-level error for one compile-and-run, wrapping whichever phase
/// raised it. `Display` is the only formatting layer: each inner variant
/// already renders as `"line <N>: <message>"`, so the CLI prints this
/// straight to stderr.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Sem(#[from] SemError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("could not read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// The source line this error applies to, where one exists: the VM
    /// carries no line information at runtime, and a failed read has none
    /// to report either.
    pub fn line(&self) -> Option<u32> {
        match self {
            CompileError::Lex(e) => Some(e.line()),
            CompileError::Sem(e) => Some(e.line()),
            CompileError::Runtime(_) | CompileError::Io { .. } => None,
        }
    }
}
