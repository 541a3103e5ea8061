//! Shared plumbing used by every phase of the AtomC pipeline: source spans,
//! an interned-string symbol type, diagnostics, and the phase error taxonomy.

pub mod diagnostic;
pub mod error;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler, Level};
pub use error::{LexError, RuntimeError, SemError};
pub use span::Span;
pub use symbol::Symbol;
