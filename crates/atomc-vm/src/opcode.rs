/// The VM's fixed instruction set. `_I`/`_F` suffixes select integer vs.
/// floating arithmetic; the emitter is responsible for inserting
/// `CONV_I_F`/`CONV_F_I` wherever an operand's static type doesn't already
/// match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    Halt,
    Call,
    CallExt,
    Enter,
    Ret,
    RetVoid,
    PushI,
    PushF,
    FpAddrI,
    FpAddrF,
    FpLoad,
    FpStore,
    LoadI,
    LoadF,
    StoreI,
    StoreF,
    Addr,
    Offset,
    Drop,
    ConvIF,
    ConvFI,
    Jmp,
    Jf,
    Jt,
    AddI,
    AddF,
    SubI,
    SubF,
    MulI,
    MulF,
    DivI,
    DivF,
    LessI,
    LessF,
}

/// An instruction's operand. Polymorphic per opcode: immediates for
/// `PUSH_*`, a frame offset for `FP*`/offset-taking opcodes, a code address
/// for jumps and `CALL`, an external function name for `CALL_EXT`, or
/// nothing for the zero-operand opcodes.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Int(i64),
    Float(f64),
    Offset(isize),
    Addr(usize),
    Name(String),
}

#[derive(Debug, Clone)]
pub struct Instruction {
    pub op: Opcode,
    pub arg: Arg,
}

impl Instruction {
    pub fn new(op: Opcode, arg: Arg) -> Self {
        Self { op, arg }
    }
}

/// Append-only instruction buffer. Jump targets are patched once (after
/// being emitted with a placeholder address) by `patch_addr`; instructions
/// are never otherwise rewritten.
#[derive(Debug, Default)]
pub struct CodeBuffer {
    instructions: Vec<Instruction>,
}

impl CodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn emit(&mut self, op: Opcode, arg: Arg) -> usize {
        let idx = self.instructions.len();
        self.instructions.push(Instruction::new(op, arg));
        idx
    }

    pub fn patch_addr(&mut self, idx: usize, addr: usize) {
        self.instructions[idx].arg = Arg::Addr(addr);
    }

    /// Patches an `ENTER`'s local-slot count once the function body (and
    /// thus its total local count) has been fully parsed.
    pub fn patch_int(&mut self, idx: usize, value: i64) {
        self.instructions[idx].arg = Arg::Int(value);
    }

    /// Splits off everything from `at` onward, e.g. to lift an already-
    /// emitted operand's instructions back out so they can be reordered or
    /// duplicated around a sibling operand (the VM has no SWAP/DUP, so
    /// relational/equality/logical codegen does this instead).
    pub fn split_off(&mut self, at: usize) -> Vec<Instruction> {
        self.instructions.split_off(at)
    }

    pub fn extend(&mut self, instrs: Vec<Instruction>) {
        self.instructions.extend(instrs);
    }

    /// Discards everything from `len` onward, used to unwind speculative
    /// codegen from a backtracked trial (e.g. `exprAssign`'s failed
    /// `exprUnary ASSIGN` alternative).
    pub fn truncate(&mut self, len: usize) {
        self.instructions.truncate(len);
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.instructions
    }
}
