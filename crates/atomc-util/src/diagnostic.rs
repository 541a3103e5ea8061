use crate::span::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Option<Span>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.span {
            Some(span) => write!(f, "line {}: {}", span.line, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Collects diagnostics emitted by a compile run. The core pipeline aborts
/// on the first phase error (per the error-handling design), but the
/// `Handler` still gives every phase one place to report through, which is
/// what a CLI or an editor integration actually wants to observe.
#[derive(Debug, Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, level: Level, message: impl Into<String>, span: Option<Span>) {
        self.diagnostics.push(Diagnostic {
            level,
            message: message.into(),
            span,
        });
    }

    pub fn error(&mut self, message: impl Into<String>, span: Span) {
        self.report(Level::Error, message, Some(span));
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level == Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
