use atomc_lex::{Token, TokenKind};
use atomc_sem::{Base, DomainStack, Returned, Symbol, SymbolId, SymbolTable, Type};
use atomc_util::{SemError, Symbol as Name};
use atomc_vm::{Arg, CodeBuffer, Instruction, Opcode};

/// The finished artifact of a compile: a linear instruction stream, the
/// `main` entry address, and how many global slots the caller must reserve
/// on the execution stack before running it.
pub struct CompiledProgram {
    pub code: Vec<Instruction>,
    pub entry: usize,
    pub global_slots: usize,
}

/// One cursor into the token list with save/restore, plus everything the
/// interleaved semantic analyzer needs: the symbol arena, the domain chain,
/// and the code buffer instructions are appended to as each rule recognizes
/// its construct. There is no separate AST.
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) pos: usize,
    pub(crate) symbols: SymbolTable,
    pub(crate) domains: DomainStack,
    pub(crate) code: CodeBuffer,
    pub(crate) current_function: Option<SymbolId>,
    pub(crate) next_global_offset: i64,
    pub(crate) loop_breaks: Vec<Vec<usize>>,
    /// `(code index of a CALL's placeholder Addr, callee)`, resolved in one
    /// pass after `unit()` finishes: AtomC lets a function be called before
    /// its textual definition, so a call site can't always know the
    /// target's `entry_addr` yet when the `CALL` is emitted.
    pub(crate) pending_calls: Vec<(usize, SymbolId)>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut symbols = SymbolTable::new();
        let mut domains = DomainStack::new();
        register_external(&mut symbols, &mut domains, "put_i", Type::scalar(Base::Int));
        register_external(&mut symbols, &mut domains, "put_d", Type::scalar(Base::Double));
        let mut code = CodeBuffer::new();
        // `CALL main; HALT` prologue: the VM always starts at ip 0, so this
        // is what actually invokes `main` once its address is known (patched
        // in `parse_program`), and gives `main`'s own RET/RET_VOID somewhere
        // to land that stops the run loop.
        code.emit(Opcode::Call, Arg::Addr(0));
        code.emit(Opcode::Halt, Arg::None);
        Self {
            tokens,
            pos: 0,
            symbols,
            domains,
            code,
            current_function: None,
            next_global_offset: 0,
            loop_breaks: Vec::new(),
            pending_calls: Vec::new(),
        }
    }

    pub(crate) fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    pub(crate) fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    pub(crate) fn line(&self) -> u32 {
        self.current().line
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.kind(), TokenKind::End)
    }

    pub(crate) fn mark(&self) -> usize {
        self.pos
    }

    pub(crate) fn reset(&mut self, mark: usize) {
        self.pos = mark;
    }

    pub(crate) fn advance(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    pub(crate) fn check(&self, want: &TokenKind) -> bool {
        std::mem::discriminant(self.kind()) == std::mem::discriminant(want)
    }

    pub(crate) fn accept(&mut self, want: &TokenKind) -> Option<Token> {
        if self.check(want) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// A committed expectation: failing here is always a hard `SyntaxError`,
    /// never a backtrack signal.
    pub(crate) fn expect(&mut self, want: TokenKind) -> Result<Token, SemError> {
        self.accept(&want).ok_or_else(|| SemError::Syntax {
            line: self.line(),
            expected: format!("{want:?}"),
        })
    }

    pub(crate) fn id_name(tok: &Token) -> Name {
        match &tok.kind {
            TokenKind::Id(s) => Name::intern(s),
            _ => unreachable!("caller only passes a token already checked to be TokenKind::Id"),
        }
    }

    pub(crate) fn nparams_of(&self, fn_id: SymbolId) -> i64 {
        match self.symbols.get(fn_id) {
            Symbol::Function { next_param_offset, .. } => -*next_param_offset - 1,
            _ => 0,
        }
    }

    /// Emits `CONV_I_F`/`CONV_F_I` only when the two bases actually differ
    /// in runtime representation. `char` shares `int`'s cell representation,
    /// so char<->int needs no conversion instruction.
    pub(crate) fn emit_conv(&mut self, src: Type, dst: Type) {
        use Base::*;
        match (src.base, dst.base) {
            (Double, Int) | (Double, Char) => {
                self.code.emit(Opcode::ConvFI, Arg::None);
            }
            (Int, Double) | (Char, Double) => {
                self.code.emit(Opcode::ConvIF, Arg::None);
            }
            _ => {}
        }
    }

    /// Appends `LOAD_I`/`LOAD_F` when `r` is a scalar l-value (an address
    /// left on the stack by the `ID`/postfix rules), turning it into the
    /// value it denotes. Non-scalar l-values (whole arrays/structs) are
    /// passed through unchanged: they are only ever consumed as addresses
    /// (by a further postfix suffix, or passed along to a callee), never
    /// loaded into a single cell.
    pub(crate) fn load_if_lval(&mut self, r: Returned) -> Returned {
        if !r.is_lval || !r.ty.is_scalar() {
            return r;
        }
        let op = if r.ty.base == Base::Double { Opcode::LoadF } else { Opcode::LoadI };
        self.code.emit(op, Arg::None);
        Returned::rvalue(r.ty)
    }

    /// Converts a condition value to the VM's truthiness representation
    /// (`int`): `JF`/`JT` read their popped cell as `Int`, so a `double`
    /// condition must be narrowed first.
    pub(crate) fn coerce_condition(&mut self, r: Returned) -> Returned {
        let r = self.load_if_lval(r);
        self.emit_conv(r.ty, Type::scalar(Base::Int));
        Returned::rvalue(Type::scalar(Base::Int))
    }
}

fn register_external(symbols: &mut SymbolTable, domains: &mut DomainStack, name: &str, arg_ty: Type) {
    let interned = Name::intern(name);
    let fn_id = symbols.push(Symbol::ExternalFunction {
        name: interned,
        ret_type: Type::scalar(Base::Void),
        params: vec![],
    });
    let param_id = symbols.push(Symbol::Parameter {
        name: interned,
        ty: arg_ty,
        owner: fn_id,
        index: -1,
    });
    if let Symbol::ExternalFunction { params, .. } = symbols.get_mut(fn_id) {
        params.push(param_id);
    }
    domains.add(interned, fn_id, 0).expect("builtin registration never collides");
}

pub(crate) fn require_scalar(ty: Type, line: u32) -> Result<(), SemError> {
    if ty.is_scalar() {
        Ok(())
    } else {
        Err(SemError::InvalidType {
            line,
            message: "expected a scalar type".to_owned(),
        })
    }
}

pub fn parse_program(tokens: Vec<Token>) -> Result<CompiledProgram, SemError> {
    let mut p = Parser::new(tokens);
    p.unit()?;

    for (idx, fn_id) in std::mem::take(&mut p.pending_calls) {
        let addr = match p.symbols.get(fn_id) {
            Symbol::Function { entry_addr: Some(addr), .. } => *addr,
            _ => unreachable!("every Symbol::Function gets its entry_addr set before fn_def returns"),
        };
        p.code.patch_addr(idx, addr);
    }

    let line = p.line();
    let main_id = p
        .domains
        .find(Name::intern("main"))
        .ok_or_else(|| SemError::UndefinedId { line, name: "main".to_owned() })?;
    let entry = match p.symbols.get(main_id) {
        Symbol::Function { entry_addr: Some(addr), .. } => *addr,
        _ => {
            return Err(SemError::UncallableId {
                line,
                name: "main".to_owned(),
            })
        }
    };
    p.code.patch_addr(0, entry);

    Ok(CompiledProgram {
        code: p.code.into_instructions(),
        entry,
        global_slots: p.next_global_offset as usize,
    })
}
