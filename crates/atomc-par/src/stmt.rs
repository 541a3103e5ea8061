use crate::parser::{require_scalar, Parser};
use atomc_lex::TokenKind;
use atomc_sem::{can_be_cast_to, Base, Symbol};
use atomc_util::SemError;
use atomc_vm::{Arg, Opcode};

impl Parser {
    /// `stmCompound := LACC (varDef | stm)* RACC`, the nested-block variant
    /// reached through `stm`: unlike a function's own body, this one opens
    /// its own domain so locals shadow outer ones and vanish at `}`.
    pub(crate) fn stm_compound(&mut self) -> Result<(), SemError> {
        self.expect(TokenKind::Lacc)?;
        self.domains.push_domain();
        while !self.check(&TokenKind::Racc) {
            self.var_def_or_stmt()?;
        }
        self.domains.pop_domain();
        self.expect(TokenKind::Racc)?;
        Ok(())
    }

    /// `stm := stmCompound | IF ... | WHILE ... | FOR ... | BREAK ; |
    ///         RETURN expr? ; | expr? ;`
    pub(crate) fn stmt(&mut self) -> Result<(), SemError> {
        if self.check(&TokenKind::Lacc) {
            return self.stm_compound();
        }
        if self.accept(&TokenKind::If).is_some() {
            return self.if_stmt();
        }
        if self.accept(&TokenKind::While).is_some() {
            return self.while_stmt();
        }
        if self.accept(&TokenKind::For).is_some() {
            return self.for_stmt();
        }
        if self.accept(&TokenKind::Break).is_some() {
            return self.break_stmt();
        }
        if self.accept(&TokenKind::Return).is_some() {
            return self.return_stmt();
        }
        self.expr_stmt()
    }

    /// `IF LPAR expr RPAR stm (ELSE stm)?`
    fn if_stmt(&mut self) -> Result<(), SemError> {
        self.expect(TokenKind::Lpar)?;
        let line = self.line();
        let cond = self.expr()?;
        require_scalar(cond.ty, line)?;
        self.coerce_condition(cond);
        self.expect(TokenKind::Rpar)?;

        let jf_idx = self.code.emit(Opcode::Jf, Arg::Addr(0));
        self.stmt()?;
        if self.accept(&TokenKind::Else).is_some() {
            let jmp_idx = self.code.emit(Opcode::Jmp, Arg::Addr(0));
            self.code.patch_addr(jf_idx, self.code.len());
            self.stmt()?;
            self.code.patch_addr(jmp_idx, self.code.len());
        } else {
            self.code.patch_addr(jf_idx, self.code.len());
        }
        Ok(())
    }

    /// `WHILE LPAR expr RPAR stm`
    fn while_stmt(&mut self) -> Result<(), SemError> {
        let check_addr = self.code.len();
        self.expect(TokenKind::Lpar)?;
        let line = self.line();
        let cond = self.expr()?;
        require_scalar(cond.ty, line)?;
        self.coerce_condition(cond);
        self.expect(TokenKind::Rpar)?;

        let jf_idx = self.code.emit(Opcode::Jf, Arg::Addr(0));
        self.loop_breaks.push(Vec::new());
        self.stmt()?;
        self.code.emit(Opcode::Jmp, Arg::Addr(check_addr));
        let end_addr = self.code.len();
        self.code.patch_addr(jf_idx, end_addr);
        self.patch_breaks(end_addr);
        Ok(())
    }

    /// `FOR LPAR expr? SEMICOLON expr? SEMICOLON expr? RPAR stm`.
    ///
    /// The condition and step expressions appear before the body in source
    /// order but must run after it at the bottom of each iteration, so they
    /// are parsed into a scratch buffer first and re-spliced once the body
    /// (which comes textually after them) has been emitted into the real
    /// stream: `init; JMP check; body_start: body; step; check: cond; JT
    /// body_start;` (or an unconditional back-edge when there is no `cond`).
    fn for_stmt(&mut self) -> Result<(), SemError> {
        self.expect(TokenKind::Lpar)?;
        if !self.check(&TokenKind::Semicolon) {
            let r = self.expr()?;
            if r.ty.base != Base::Void {
                self.code.emit(Opcode::Drop, Arg::None);
            }
        }
        self.expect(TokenKind::Semicolon)?;

        let scratch = std::mem::take(&mut self.code);
        let has_cond = !self.check(&TokenKind::Semicolon);
        if has_cond {
            let line = self.line();
            let cond = self.expr()?;
            require_scalar(cond.ty, line)?;
            self.coerce_condition(cond);
        }
        self.expect(TokenKind::Semicolon)?;
        let cond_code = std::mem::replace(&mut self.code, scratch);

        let scratch = std::mem::take(&mut self.code);
        let has_step = !self.check(&TokenKind::Rpar);
        if has_step {
            let r = self.expr()?;
            if r.ty.base != Base::Void {
                self.code.emit(Opcode::Drop, Arg::None);
            }
        }
        let step_code = std::mem::replace(&mut self.code, scratch);
        self.expect(TokenKind::Rpar)?;

        let jmp_to_check = self.code.emit(Opcode::Jmp, Arg::Addr(0));
        let body_addr = self.code.len();
        self.loop_breaks.push(Vec::new());
        self.stmt()?;

        self.code.extend(step_code.into_instructions());
        let check_addr = self.code.len();
        self.code.patch_addr(jmp_to_check, check_addr);

        if has_cond {
            self.code.extend(cond_code.into_instructions());
            self.code.emit(Opcode::Jt, Arg::Addr(body_addr));
        } else {
            self.code.emit(Opcode::Jmp, Arg::Addr(body_addr));
        }
        let end_addr = self.code.len();
        self.patch_breaks(end_addr);
        Ok(())
    }

    fn patch_breaks(&mut self, end_addr: usize) {
        let pending = self.loop_breaks.pop().expect("loop_breaks pushed by the enclosing loop");
        for idx in pending {
            self.code.patch_addr(idx, end_addr);
        }
    }

    fn break_stmt(&mut self) -> Result<(), SemError> {
        let line = self.line();
        if self.loop_breaks.is_empty() {
            return Err(SemError::Syntax {
                line,
                expected: "break used outside a loop".to_owned(),
            });
        }
        let idx = self.code.emit(Opcode::Jmp, Arg::Addr(0));
        self.loop_breaks.last_mut().unwrap().push(idx);
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn return_stmt(&mut self) -> Result<(), SemError> {
        let line = self.line();
        let fn_id = self.current_function.ok_or_else(|| SemError::Syntax {
            line,
            expected: "return used outside a function".to_owned(),
        })?;
        let ret_type = match self.symbols.get(fn_id) {
            Symbol::Function { ret_type, .. } => *ret_type,
            _ => unreachable!(),
        };
        let nparams = self.nparams_of(fn_id);

        if self.accept(&TokenKind::Semicolon).is_some() {
            if ret_type.base != Base::Void {
                return Err(SemError::InvalidType {
                    line,
                    message: "non-void function must return a value".to_owned(),
                });
            }
            self.code.emit(Opcode::RetVoid, Arg::Int(nparams));
            return Ok(());
        }

        if ret_type.base == Base::Void {
            return Err(SemError::InvalidType {
                line,
                message: "void function cannot return a value".to_owned(),
            });
        }
        let value = self.expr()?;
        let value = self.load_if_lval(value);
        if !can_be_cast_to(value.ty, ret_type) {
            return Err(SemError::TypeCast {
                line,
                message: "return value does not match the function's return type".to_owned(),
            });
        }
        self.emit_conv(value.ty, ret_type);
        self.expect(TokenKind::Semicolon)?;
        self.code.emit(Opcode::Ret, Arg::Int(nparams));
        Ok(())
    }

    fn expr_stmt(&mut self) -> Result<(), SemError> {
        if self.accept(&TokenKind::Semicolon).is_some() {
            return Ok(());
        }
        let r = self.expr()?;
        // A void-typed expression (a void external call, or a call to a
        // user-defined void function) leaves the stack exactly as it found
        // it — nothing to drop. Only a value-producing expression does.
        if r.ty.base != Base::Void {
            self.code.emit(Opcode::Drop, Arg::None);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }
}
