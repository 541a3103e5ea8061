//! Recursive-descent parser for AtomC, interleaved with semantic analysis
//! and code generation: there is no separate AST, every grammar rule
//! directly emits into the [`atomc_vm::CodeBuffer`] it recognizes.

mod expr;
mod items;
mod parser;
mod stmt;
mod types;

pub use parser::{parse_program, CompiledProgram, Parser};
