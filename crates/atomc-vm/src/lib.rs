pub mod externals;
pub mod interp;
pub mod opcode;
pub mod stack;

pub use externals::{ExternalFn, ExternalRegistry};
pub use interp::Vm;
pub use opcode::{Arg, CodeBuffer, Instruction, Opcode};
pub use stack::{Addr, ExecStack, StackValue};
