use crate::parser::{require_scalar, Parser};
use atomc_lex::TokenKind;
use atomc_sem::{arith, can_be_cast_to, Base, Returned, Symbol, Type};
use atomc_util::SemError;
use atomc_vm::{Arg, Instruction, Opcode};

/// A fully-formed instruction sequence for one already-parsed operand,
/// lifted back out of the code stream so it can be reordered or duplicated
/// around a sibling operand. The VM has no SWAP or DUP, so relational,
/// equality and logical-not codegen build their result by splicing these
/// pieces in whichever order (and however many copies) the identity being
/// computed needs.
type Chunk = Vec<Instruction>;

impl Parser {
    pub fn expr(&mut self) -> Result<Returned, SemError> {
        self.expr_assign()
    }

    /// `exprAssign := exprUnary ASSIGN exprAssign | exprOr`. Tried as the
    /// more specific alternative first; a failed or non-matching trial
    /// rewinds both the cursor and any code it emitted before falling back.
    fn expr_assign(&mut self) -> Result<Returned, SemError> {
        if let Some(result) = self.try_assign()? {
            return Ok(result);
        }
        self.expr_or()
    }

    fn try_assign(&mut self) -> Result<Option<Returned>, SemError> {
        let mark = self.mark();
        let code_mark = self.code.len();
        let lhs = match self.expr_unary() {
            Ok(v) => v,
            // Only a grammar mismatch means "this wasn't an assignment after
            // all" — a genuine semantic error (undefined id, bad cast...)
            // inside a would-be l-value is a real error and must propagate,
            // not be swallowed and silently reparsed as `exprOr`.
            Err(SemError::Syntax { .. }) => {
                self.reset(mark);
                self.code.truncate(code_mark);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };
        let line = self.line();
        if self.accept(&TokenKind::Assign).is_none() {
            self.reset(mark);
            self.code.truncate(code_mark);
            return Ok(None);
        }
        if !lhs.is_lval {
            return Err(SemError::NotLval { line });
        }
        if lhs.is_ct {
            return Err(SemError::ConstantTarget { line });
        }
        require_scalar(lhs.ty, line)?;

        let rhs = self.expr_assign()?;
        let rhs = self.load_if_lval(rhs);
        if !can_be_cast_to(rhs.ty, lhs.ty) {
            return Err(SemError::TypeCast {
                line,
                message: "assigned value does not match the target's type".to_owned(),
            });
        }
        self.emit_conv(rhs.ty, lhs.ty);
        let store_op = if lhs.ty.base == Base::Double { Opcode::StoreF } else { Opcode::StoreI };
        self.code.emit(store_op, Arg::None);
        Ok(Some(Returned::rvalue(lhs.ty)))
    }

    fn expr_or(&mut self) -> Result<Returned, SemError> {
        let mut acc = self.expr_and()?;
        while self.check(&TokenKind::Or) {
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;
            self.emit_conv(acc.ty, Type::scalar(Base::Int));
            let jt1 = self.code.emit(Opcode::Jt, Arg::Addr(0));

            let rhs = self.expr_and()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            self.emit_conv(rhs.ty, Type::scalar(Base::Int));
            let jt2 = self.code.emit(Opcode::Jt, Arg::Addr(0));

            self.code.emit(Opcode::PushI, Arg::Int(0));
            let jmp = self.code.emit(Opcode::Jmp, Arg::Addr(0));
            let true_addr = self.code.len();
            self.code.patch_addr(jt1, true_addr);
            self.code.patch_addr(jt2, true_addr);
            self.code.emit(Opcode::PushI, Arg::Int(1));
            self.code.patch_addr(jmp, self.code.len());

            acc = Returned::rvalue(Type::scalar(Base::Int));
        }
        Ok(acc)
    }

    fn expr_and(&mut self) -> Result<Returned, SemError> {
        let mut acc = self.expr_eq()?;
        while self.check(&TokenKind::And) {
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;
            self.emit_conv(acc.ty, Type::scalar(Base::Int));
            let jf1 = self.code.emit(Opcode::Jf, Arg::Addr(0));

            let rhs = self.expr_eq()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            self.emit_conv(rhs.ty, Type::scalar(Base::Int));
            let jf2 = self.code.emit(Opcode::Jf, Arg::Addr(0));

            self.code.emit(Opcode::PushI, Arg::Int(1));
            let jmp = self.code.emit(Opcode::Jmp, Arg::Addr(0));
            let false_addr = self.code.len();
            self.code.patch_addr(jf1, false_addr);
            self.code.patch_addr(jf2, false_addr);
            self.code.emit(Opcode::PushI, Arg::Int(0));
            self.code.patch_addr(jmp, self.code.len());

            acc = Returned::rvalue(Type::scalar(Base::Int));
        }
        Ok(acc)
    }

    /// `==`/`!=`. There is no `EQ` opcode, only `LESS_I`/`LESS_F`; equality
    /// of two mutually-exclusive-ordered scalars is `!(a<b) && !(b<a)`,
    /// computed here as `1 - ((a<b) + (b<a))` (and inequality as the sum
    /// directly), which needs each operand's code twice.
    fn expr_eq(&mut self) -> Result<Returned, SemError> {
        let start = self.code.len();
        let mut acc = self.expr_rel()?;
        while matches!(self.kind(), TokenKind::Equal | TokenKind::Noteq) {
            let is_eq = matches!(self.kind(), TokenKind::Equal);
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;
            let acc_code = self.code.split_off(start);

            let rhs_start = self.code.len();
            let rhs = self.expr_rel()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            let rhs_code = self.code.split_off(rhs_start);

            let common = arith(acc.ty, rhs.ty).ok_or_else(|| SemError::InvalidType {
                line,
                message: "operands are not comparable".to_owned(),
            })?;
            let use_float = common.base == Base::Double;
            let a = with_conv(&acc_code, acc.ty, common);
            let b = with_conv(&rhs_code, rhs.ty, common);
            let less_op = if use_float { Opcode::LessF } else { Opcode::LessI };

            // `==` needs 1-(x+y); pushing the 1 ahead of x and y leaves it
            // untouched underneath their sum until the final SUB_I.
            if is_eq {
                self.code.emit(Opcode::PushI, Arg::Int(1));
            }
            // x = a<b
            self.code.extend(a.clone());
            self.code.extend(b.clone());
            self.code.emit(less_op, Arg::None);
            // y = b<a
            self.code.extend(b);
            self.code.extend(a);
            self.code.emit(less_op, Arg::None);
            self.code.emit(Opcode::AddI, Arg::None); // x + y
            if is_eq {
                self.code.emit(Opcode::SubI, Arg::None); // 1 - (x+y)
            }
            acc = Returned::rvalue(Type::scalar(Base::Int));
        }
        Ok(acc)
    }

    fn expr_rel(&mut self) -> Result<Returned, SemError> {
        let start = self.code.len();
        let mut acc = self.expr_add()?;
        loop {
            let kind = self.kind().clone();
            let rel = match kind {
                TokenKind::Less => Rel::Lt,
                TokenKind::Lesseq => Rel::Le,
                TokenKind::Greater => Rel::Gt,
                TokenKind::Greatereq => Rel::Ge,
                _ => break,
            };
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;
            let acc_code = self.code.split_off(start);

            let rhs_start = self.code.len();
            let rhs = self.expr_add()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            let rhs_code = self.code.split_off(rhs_start);

            let common = arith(acc.ty, rhs.ty).ok_or_else(|| SemError::InvalidType {
                line,
                message: "operands are not comparable".to_owned(),
            })?;
            let use_float = common.base == Base::Double;
            let left = with_conv(&acc_code, acc.ty, common);
            let right = with_conv(&rhs_code, rhs.ty, common);
            let less_op = if use_float { Opcode::LessF } else { Opcode::LessI };

            match rel {
                Rel::Lt => {
                    self.code.extend(left);
                    self.code.extend(right);
                    self.code.emit(less_op, Arg::None);
                }
                Rel::Gt => {
                    self.code.extend(right);
                    self.code.extend(left);
                    self.code.emit(less_op, Arg::None);
                }
                Rel::Le => {
                    // a<=b == !(b<a) == 1 - (b<a)
                    self.code.emit(Opcode::PushI, Arg::Int(1));
                    self.code.extend(right);
                    self.code.extend(left);
                    self.code.emit(less_op, Arg::None);
                    self.code.emit(Opcode::SubI, Arg::None);
                }
                Rel::Ge => {
                    // a>=b == !(a<b) == 1 - (a<b)
                    self.code.emit(Opcode::PushI, Arg::Int(1));
                    self.code.extend(left);
                    self.code.extend(right);
                    self.code.emit(less_op, Arg::None);
                    self.code.emit(Opcode::SubI, Arg::None);
                }
            }
            acc = Returned::rvalue(Type::scalar(Base::Int));
        }
        Ok(acc)
    }

    fn expr_add(&mut self) -> Result<Returned, SemError> {
        let mut acc = self.expr_mul()?;
        loop {
            let op = match self.kind() {
                TokenKind::Add => BinArith::Add,
                TokenKind::Sub => BinArith::Sub,
                _ => break,
            };
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;

            let scratch = std::mem::take(&mut self.code);
            let rhs = self.expr_mul()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            let rhs_code = std::mem::replace(&mut self.code, scratch).into_instructions();

            let common = arith(acc.ty, rhs.ty).ok_or_else(|| SemError::InvalidType {
                line,
                message: "operands are not compatible for arithmetic".to_owned(),
            })?;
            self.emit_conv(acc.ty, common);
            self.code.extend(rhs_code);
            self.emit_conv(rhs.ty, common);
            let use_float = common.base == Base::Double;
            let opcode = match (op, use_float) {
                (BinArith::Add, false) => Opcode::AddI,
                (BinArith::Add, true) => Opcode::AddF,
                (BinArith::Sub, false) => Opcode::SubI,
                (BinArith::Sub, true) => Opcode::SubF,
                _ => unreachable!(),
            };
            self.code.emit(opcode, Arg::None);
            acc = Returned::rvalue(common);
        }
        Ok(acc)
    }

    fn expr_mul(&mut self) -> Result<Returned, SemError> {
        let mut acc = self.expr_cast()?;
        loop {
            let op = match self.kind() {
                TokenKind::Mul => BinArith::Mul,
                TokenKind::Div => BinArith::Div,
                _ => break,
            };
            let line = self.line();
            self.advance();
            acc = self.load_if_lval(acc);
            require_scalar(acc.ty, line)?;

            let scratch = std::mem::take(&mut self.code);
            let rhs = self.expr_cast()?;
            let rhs = self.load_if_lval(rhs);
            require_scalar(rhs.ty, line)?;
            let rhs_code = std::mem::replace(&mut self.code, scratch).into_instructions();

            let common = arith(acc.ty, rhs.ty).ok_or_else(|| SemError::InvalidType {
                line,
                message: "operands are not compatible for arithmetic".to_owned(),
            })?;
            self.emit_conv(acc.ty, common);
            self.code.extend(rhs_code);
            self.emit_conv(rhs.ty, common);
            let use_float = common.base == Base::Double;
            let opcode = match (op, use_float) {
                (BinArith::Mul, false) => Opcode::MulI,
                (BinArith::Mul, true) => Opcode::MulF,
                (BinArith::Div, false) => Opcode::DivI,
                (BinArith::Div, true) => Opcode::DivF,
                _ => unreachable!(),
            };
            self.code.emit(opcode, Arg::None);
            acc = Returned::rvalue(common);
        }
        Ok(acc)
    }

    /// `exprCast := LPAR typeBase arrayDecl? RPAR exprCast | exprUnary`.
    /// Committed only once a type keyword is seen right after `(`; any
    /// other `(` belongs to `exprPrimary`'s parenthesized alternative.
    fn expr_cast(&mut self) -> Result<Returned, SemError> {
        if self.check(&TokenKind::Lpar) {
            let mark = self.mark();
            self.advance();
            if matches!(self.kind(), TokenKind::Int | TokenKind::Double | TokenKind::Char | TokenKind::Struct) {
                let line = self.line();
                let base = self.type_base()?;
                let dim = self.array_decl()?;
                let target = match dim {
                    None => Type { base: base.base, dim: -1 },
                    Some(n) => Type { base: base.base, dim: n },
                };
                if matches!(target.base, Base::Struct(_)) {
                    return Err(SemError::InvalidType {
                        line,
                        message: "cannot cast to a struct type".to_owned(),
                    });
                }
                self.expect(TokenKind::Rpar)?;
                let inner = self.expr_cast()?;
                let inner = self.load_if_lval(inner);
                if !can_be_cast_to(inner.ty, target) {
                    return Err(SemError::TypeCast {
                        line,
                        message: "incompatible cast".to_owned(),
                    });
                }
                self.emit_conv(inner.ty, target);
                return Ok(Returned::rvalue(target));
            }
            self.reset(mark);
        }
        self.expr_unary()
    }

    /// `exprUnary := (SUB|NOT) exprUnary | exprPostfix`.
    fn expr_unary(&mut self) -> Result<Returned, SemError> {
        if self.check(&TokenKind::Sub) {
            let line = self.line();
            self.advance();
            let operand = self.expr_unary()?;
            let operand = self.load_if_lval(operand);
            require_scalar(operand.ty, line)?;
            let use_float = operand.ty.base == Base::Double;
            if use_float {
                self.code.emit(Opcode::PushF, Arg::Float(-1.0));
                self.code.emit(Opcode::MulF, Arg::None);
            } else {
                self.code.emit(Opcode::PushI, Arg::Int(-1));
                self.code.emit(Opcode::MulI, Arg::None);
            }
            return Ok(Returned::rvalue(operand.ty));
        }
        if self.check(&TokenKind::Not) {
            let line = self.line();
            self.advance();
            let start = self.code.len();
            let operand = self.expr_unary()?;
            let operand = self.load_if_lval(operand);
            require_scalar(operand.ty, line)?;
            let int_ty = Type::scalar(Base::Int);
            let operand_code = with_conv(&self.code.split_off(start), operand.ty, int_ty);

            // !x == (x == 0), reusing the eq(a,b) = 1-((a<b)+(b<a)) identity
            // with b the constant 0.
            let zero = vec![Instruction::new(Opcode::PushI, Arg::Int(0))];
            self.code.emit(Opcode::PushI, Arg::Int(1));
            self.code.extend(operand_code.clone());
            self.code.extend(zero.clone());
            self.code.emit(Opcode::LessI, Arg::None);
            self.code.extend(zero);
            self.code.extend(operand_code);
            self.code.emit(Opcode::LessI, Arg::None);
            self.code.emit(Opcode::AddI, Arg::None);
            self.code.emit(Opcode::SubI, Arg::None);
            return Ok(Returned::rvalue(int_ty));
        }
        self.expr_postfix()
    }

    /// `exprPostfix := exprPrimary (LBRACKET expr RBRACKET | DOT ID)*`.
    /// `[idx]` and `.field` both resolve to the same primitive: shift the
    /// base address by a slot count (dynamic for indexing, static for a
    /// field) via `OFFSET`, keeping the result an address (l-value).
    fn expr_postfix(&mut self) -> Result<Returned, SemError> {
        let mut acc = self.expr_primary()?;
        loop {
            if self.accept(&TokenKind::Lbracket).is_some() {
                let line = self.line();
                if !acc.ty.is_pointer_like() {
                    return Err(SemError::InvalidType {
                        line,
                        message: "indexing a non-array value".to_owned(),
                    });
                }
                if !acc.is_lval {
                    return Err(SemError::NotLval { line });
                }
                let idx = self.expr()?;
                let idx = self.load_if_lval(idx);
                if !can_be_cast_to(idx.ty, Type::scalar(Base::Int)) {
                    return Err(SemError::TypeCast {
                        line,
                        message: "array index must be castable to int".to_owned(),
                    });
                }
                self.emit_conv(idx.ty, Type::scalar(Base::Int));
                self.expect(TokenKind::Rbracket)?;
                let elem_ty = acc.ty.element();
                let stride = elem_ty.slots(&self.symbols);
                self.code.emit(Opcode::Offset, Arg::Int(stride));
                acc = Returned::lvalue(elem_ty);
                continue;
            }
            if self.accept(&TokenKind::Dot).is_some() {
                let line = self.line();
                let struct_id = match acc.ty.base {
                    Base::Struct(id) if acc.ty.dim == -1 => id,
                    _ => {
                        return Err(SemError::InvalidType {
                            line,
                            message: "field access on a non-struct value".to_owned(),
                        })
                    }
                };
                if !acc.is_lval {
                    return Err(SemError::NotLval { line });
                }
                let name_tok = self.expect(TokenKind::Id(String::new()))?;
                let field_name = Self::id_name(&name_tok);
                let (field_ty, field_offset) = self.find_struct_member(struct_id, field_name, line)?;
                self.code.emit(Opcode::PushI, Arg::Int(field_offset));
                self.code.emit(Opcode::Offset, Arg::Int(1));
                acc = Returned::lvalue(field_ty);
                continue;
            }
            break;
        }
        Ok(acc)
    }

    fn find_struct_member(&self, struct_id: atomc_sem::SymbolId, name: atomc_util::Symbol, line: u32) -> Result<(Type, i64), SemError> {
        let members = match self.symbols.get(struct_id) {
            Symbol::StructDef { members, .. } => members,
            _ => unreachable!("type_base only ever resolves STRUCT ids to StructDef symbols"),
        };
        for &member_id in members {
            if let Symbol::Variable { name: member_name, ty, index, .. } = self.symbols.get(member_id) {
                if *member_name == name {
                    return Ok((*ty, *index));
                }
            }
        }
        Err(SemError::UndefinedId {
            line,
            name: name.as_str().to_owned(),
        })
    }

    /// `exprPrimary := ID (LPAR (expr (COMMA expr)*)? RPAR)? | CT_INT |
    ///                CT_REAL | CT_CHAR | CT_STRING | LPAR expr RPAR`
    fn expr_primary(&mut self) -> Result<Returned, SemError> {
        let line = self.line();
        match self.kind().clone() {
            TokenKind::Id(_) => {
                let tok = self.advance();
                let name = Self::id_name(&tok);
                if self.check(&TokenKind::Lpar) {
                    return self.call(name, line);
                }
                self.resolve_variable(name, line)
            }
            TokenKind::CtInt(v) => {
                self.advance();
                self.code.emit(Opcode::PushI, Arg::Int(v));
                Ok(Returned::constant(Type::scalar(Base::Int)))
            }
            TokenKind::CtReal(v) => {
                self.advance();
                self.code.emit(Opcode::PushF, Arg::Float(v));
                Ok(Returned::constant(Type::scalar(Base::Double)))
            }
            TokenKind::CtChar(c) => {
                self.advance();
                self.code.emit(Opcode::PushI, Arg::Int(c as i64));
                Ok(Returned::constant(Type::scalar(Base::Char)))
            }
            TokenKind::CtString(_) => {
                // String manipulation is out of scope; a string constant
                // still needs a stack cell so surrounding DROP/argument
                // codegen stays balanced.
                self.advance();
                self.code.emit(Opcode::PushI, Arg::Int(0));
                Ok(Returned::constant(Type { base: Base::Char, dim: 0 }))
            }
            TokenKind::Lpar => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::Rpar)?;
                Ok(inner)
            }
            _ => Err(SemError::Syntax {
                line,
                expected: "an expression".to_owned(),
            }),
        }
    }

    fn resolve_variable(&mut self, name: atomc_util::Symbol, line: u32) -> Result<Returned, SemError> {
        let id = self.domains.find(name).ok_or_else(|| SemError::UndefinedId {
            line,
            name: name.as_str().to_owned(),
        })?;
        match self.symbols.get(id).clone() {
            Symbol::Variable { ty, owner, index, .. } => {
                use atomc_sem::Owner;
                match owner {
                    Owner::Global => {
                        self.code.emit(Opcode::Addr, Arg::Int(index));
                    }
                    Owner::Function(_) => {
                        let op = if ty.base == Base::Double { Opcode::FpAddrF } else { Opcode::FpAddrI };
                        self.code.emit(op, Arg::Offset(index as isize));
                    }
                    Owner::Struct(_) => unreachable!("struct members are never looked up via DomainStack"),
                }
                Ok(Returned::lvalue(ty))
            }
            Symbol::Parameter { ty, index, .. } => {
                let op = if ty.base == Base::Double { Opcode::FpAddrF } else { Opcode::FpAddrI };
                self.code.emit(op, Arg::Offset(index as isize));
                Ok(Returned::lvalue(ty))
            }
            Symbol::Function { .. } | Symbol::ExternalFunction { .. } => Err(SemError::InvalidType {
                line,
                message: format!("'{}' denotes a function, not a value", name.as_str()),
            }),
            Symbol::StructDef { .. } => Err(SemError::InvalidType {
                line,
                message: format!("'{}' denotes a struct definition, not a value", name.as_str()),
            }),
        }
    }

    /// `ID LPAR (expr (COMMA expr)*)? RPAR`. Each argument's codegen is
    /// captured in isolation so the whole set can be re-emitted in reverse
    /// (right-to-left) declaration order: the VM's calling convention
    /// leaves the first-declared parameter closest to `fp`, which only
    /// happens if it is the last one pushed.
    fn call(&mut self, name: atomc_util::Symbol, line: u32) -> Result<Returned, SemError> {
        let fn_id = self.domains.find(name).ok_or_else(|| SemError::UndefinedId {
            line,
            name: name.as_str().to_owned(),
        })?;
        let (params, ret_type, is_external) = match self.symbols.get(fn_id).clone() {
            Symbol::Function { params, ret_type, .. } => (params, ret_type, false),
            Symbol::ExternalFunction { params, ret_type, .. } => (params, ret_type, true),
            _ => {
                return Err(SemError::UncallableId {
                    line,
                    name: name.as_str().to_owned(),
                })
            }
        };

        self.expect(TokenKind::Lpar)?;
        let mut arg_chunks: Vec<Chunk> = Vec::new();
        if !self.check(&TokenKind::Rpar) {
            arg_chunks.push(self.call_arg(&params, 0, line)?);
            let mut i = 1;
            while self.accept(&TokenKind::Comma).is_some() {
                arg_chunks.push(self.call_arg(&params, i, line)?);
                i += 1;
            }
        }
        self.expect(TokenKind::Rpar)?;

        if arg_chunks.len() < params.len() {
            return Err(SemError::TooFewArguments {
                line,
                name: name.as_str().to_owned(),
            });
        }
        if arg_chunks.len() > params.len() {
            return Err(SemError::TooManyArguments {
                line,
                name: name.as_str().to_owned(),
            });
        }

        for chunk in arg_chunks.into_iter().rev() {
            self.code.extend(chunk);
        }
        if is_external {
            self.code.emit(Opcode::CallExt, Arg::Name(name.as_str().to_owned()));
        } else {
            let idx = self.code.emit(Opcode::Call, Arg::Addr(0));
            self.pending_calls.push((idx, fn_id));
        }
        Ok(Returned::rvalue(ret_type))
    }

    fn call_arg(&mut self, params: &[atomc_sem::SymbolId], index: usize, line: u32) -> Result<Chunk, SemError> {
        let param_ty = match params.get(index) {
            Some(&p) => match self.symbols.get(p) {
                Symbol::Parameter { ty, .. } => *ty,
                _ => unreachable!(),
            },
            None => {
                // more arguments than declared; still parse it so the
                // cursor advances correctly, the count mismatch is
                // reported by the caller once all arguments are in.
                let scratch = std::mem::take(&mut self.code);
                let arg = self.expr()?;
                let arg = self.load_if_lval(arg);
                let _ = arg;
                return Ok(std::mem::replace(&mut self.code, scratch).into_instructions());
            }
        };
        let scratch = std::mem::take(&mut self.code);
        let arg = self.expr()?;
        let arg = self.load_if_lval(arg);
        if !can_be_cast_to(arg.ty, param_ty) {
            return Err(SemError::TypeCast {
                line,
                message: "argument type does not match the parameter's type".to_owned(),
            });
        }
        self.emit_conv(arg.ty, param_ty);
        Ok(std::mem::replace(&mut self.code, scratch).into_instructions())
    }
}

#[derive(Clone, Copy)]
enum Rel {
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Clone, Copy)]
enum BinArith {
    Add,
    Sub,
    Mul,
    Div,
}

/// Returns `chunk` with a trailing `CONV_I_F`/`CONV_F_I` appended when
/// `src` and `dst` differ, without disturbing `chunk` itself.
fn with_conv(chunk: &[Instruction], src: Type, dst: Type) -> Chunk {
    let mut out = chunk.to_vec();
    use Base::*;
    match (src.base, dst.base) {
        (Double, Int) | (Double, Char) => out.push(Instruction::new(Opcode::ConvFI, Arg::None)),
        (Int, Double) | (Char, Double) => out.push(Instruction::new(Opcode::ConvIF, Arg::None)),
        _ => {}
    }
    out
}
