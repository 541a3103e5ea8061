//! Type system, symbol model and scope chain for AtomC — the data that the
//! parser (`atomc-par`) builds and consults as it recognizes a program.

pub mod domain;
pub mod returned;
pub mod symbol;
pub mod ty;

pub use domain::{Domain, DomainStack};
pub use returned::Returned;
pub use symbol::{Owner, Symbol, SymbolId, SymbolTable};
pub use ty::{arith, can_be_cast_to, Base, Type};
