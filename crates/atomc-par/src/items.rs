use crate::parser::Parser;
use atomc_lex::{Token, TokenKind};
use atomc_sem::{Base, Owner, Symbol, SymbolId, Type};
use atomc_util::SemError;
use atomc_vm::{Arg, Opcode};

impl Parser {
    /// `unit := (structDef | fnDef | varDef)* END`.
    pub fn unit(&mut self) -> Result<(), SemError> {
        while !self.at_end() {
            self.top_level_decl()?;
        }
        self.expect(TokenKind::End)?;
        Ok(())
    }

    fn top_level_decl(&mut self) -> Result<(), SemError> {
        if self.check(&TokenKind::Struct) {
            let mark = self.mark();
            self.advance();
            let name_tok = self.expect(TokenKind::Id(String::new()))?;
            if self.check(&TokenKind::Lacc) {
                return self.struct_def(name_tok);
            }
            self.reset(mark);
            return self.decl_with_type_base();
        }
        if self.check(&TokenKind::Void) {
            self.advance();
            return self.finish_decl(Type::scalar(Base::Void));
        }
        if matches!(self.kind(), TokenKind::Int | TokenKind::Double | TokenKind::Char) {
            return self.decl_with_type_base();
        }
        Err(SemError::Syntax {
            line: self.line(),
            expected: "a struct, function or variable declaration".to_owned(),
        })
    }

    fn decl_with_type_base(&mut self) -> Result<(), SemError> {
        let base_ty = self.type_base()?;
        self.finish_decl(base_ty)
    }

    /// Disambiguates `fnDef` from `varDef`: both share `typeBase ID`; seeing
    /// `LPAR` next commits to `fnDef`.
    fn finish_decl(&mut self, base_ty: Type) -> Result<(), SemError> {
        let name_tok = self.expect(TokenKind::Id(String::new()))?;
        let line = name_tok.line;
        let name = Self::id_name(&name_tok);
        if self.check(&TokenKind::Lpar) {
            return self.fn_def(name, base_ty, line);
        }
        if base_ty.base == Base::Void {
            return Err(SemError::Syntax {
                line: self.line(),
                expected: "( after a void-returning function name".to_owned(),
            });
        }
        let dim = self.array_decl()?;
        let ty = match dim {
            None => Type { base: base_ty.base, dim: -1 },
            Some(n) => Type { base: base_ty.base, dim: n },
        };
        if ty.dim == 0 {
            return Err(SemError::InvalidArraySize { line });
        }
        self.expect(TokenKind::Semicolon)?;
        self.declare_variable(name, ty, line)
    }

    /// `structDef := STRUCT ID LACC varDef* RACC SEMICOLON`. `name_tok` is
    /// the already-consumed struct name (the `STRUCT ID` prefix committed
    /// this rule once `LACC` was seen).
    fn struct_def(&mut self, name_tok: Token) -> Result<(), SemError> {
        let line = name_tok.line;
        let name = Self::id_name(&name_tok);
        let struct_id = self.symbols.push(Symbol::StructDef {
            name,
            members: Vec::new(),
            next_member_offset: 0,
        });
        self.domains.add(name, struct_id, line)?;

        self.expect(TokenKind::Lacc)?;
        self.domains.push_domain();
        while !self.check(&TokenKind::Racc) {
            self.struct_member(struct_id)?;
        }
        self.domains.pop_domain();
        self.expect(TokenKind::Racc)?;
        self.expect(TokenKind::Semicolon)?;
        Ok(())
    }

    fn struct_member(&mut self, struct_id: SymbolId) -> Result<(), SemError> {
        let (name, ty, line) = self.typed_decl()?;
        if ty.dim == 0 {
            return Err(SemError::InvalidArraySize { line });
        }
        self.expect(TokenKind::Semicolon)?;
        let id = self.symbols.add_member(struct_id, name, ty);
        self.domains.add(name, id, line)?;
        Ok(())
    }

    /// `varDef := typeBase ID arrayDecl? SEMICOLON`, used inside function
    /// bodies where the leading keyword already disambiguates it from a
    /// statement (there is no function-valued local).
    pub(crate) fn var_def(&mut self) -> Result<(), SemError> {
        let (name, ty, line) = self.typed_decl()?;
        if ty.dim == 0 {
            return Err(SemError::InvalidArraySize { line });
        }
        self.expect(TokenKind::Semicolon)?;
        self.declare_variable(name, ty, line)
    }

    pub(crate) fn declare_variable(&mut self, name: atomc_util::Symbol, ty: Type, line: u32) -> Result<(), SemError> {
        match self.current_function {
            Some(f) => {
                let id = self.symbols.add_local(f, name, ty);
                self.domains.add(name, id, line)
            }
            None => {
                let slots = ty.slots(&self.symbols);
                let id = self.symbols.push(Symbol::Variable {
                    name,
                    ty,
                    owner: Owner::Global,
                    index: self.next_global_offset,
                });
                self.next_global_offset += slots;
                self.domains.add(name, id, line)
            }
        }
    }

    /// `fnDef := (typeBase | VOID) ID LPAR (fnParam (COMMA fnParam)*)? RPAR stmCompound`.
    /// The function is added to the *current* (global) domain before a new
    /// domain is opened for its parameters and locals; that domain is shared
    /// by the outermost `stmCompound` (no second push for it).
    fn fn_def(&mut self, name: atomc_util::Symbol, ret_ty: Type, line: u32) -> Result<(), SemError> {
        let fn_id = self.symbols.push(Symbol::Function {
            name,
            ret_type: ret_ty,
            params: Vec::new(),
            locals: Vec::new(),
            next_param_offset: -1,
            next_local_offset: 1,
            entry_addr: None,
        });
        self.domains.add(name, fn_id, line)?;
        self.domains.push_domain();
        let prev_function = self.current_function.replace(fn_id);

        self.expect(TokenKind::Lpar)?;
        if !self.check(&TokenKind::Rpar) {
            self.fn_param(fn_id)?;
            while self.accept(&TokenKind::Comma).is_some() {
                self.fn_param(fn_id)?;
            }
        }
        self.expect(TokenKind::Rpar)?;

        let entry_addr = self.code.len();
        if let Symbol::Function { entry_addr: slot, .. } = self.symbols.get_mut(fn_id) {
            *slot = Some(entry_addr);
        }
        let enter_idx = self.code.emit(Opcode::Enter, Arg::Int(0));

        self.fn_body()?;

        let (local_slots, nparams) = match self.symbols.get(fn_id) {
            Symbol::Function { next_local_offset, next_param_offset, .. } => {
                (*next_local_offset - 1, -*next_param_offset - 1)
            }
            _ => unreachable!(),
        };
        self.code.patch_int(enter_idx, local_slots);
        // Fall-through safety net: a function whose last statement isn't a
        // `return` still needs its frame torn down correctly.
        self.code.emit(Opcode::RetVoid, Arg::Int(nparams));

        self.domains.pop_domain();
        self.current_function = prev_function;
        Ok(())
    }

    fn fn_param(&mut self, fn_id: SymbolId) -> Result<(), SemError> {
        let (name, ty, line) = self.typed_decl()?;
        let id = self.symbols.add_parameter(fn_id, name, ty);
        self.domains.add(name, id, line)
    }

    /// `stmCompound := LACC (varDef | stm)* RACC`, the variant used directly
    /// as a function's body: it does not push its own domain (params and
    /// top-level locals share the function's domain).
    fn fn_body(&mut self) -> Result<(), SemError> {
        self.expect(TokenKind::Lacc)?;
        while !self.check(&TokenKind::Racc) {
            self.var_def_or_stmt()?;
        }
        self.expect(TokenKind::Racc)?;
        Ok(())
    }

    /// Inside a body, `STRUCT` can only start a struct-typed `varDef`
    /// (`structDef` is a unit-level production only), so no lookahead is
    /// needed to tell `varDef` from `stm` here.
    pub(crate) fn var_def_or_stmt(&mut self) -> Result<(), SemError> {
        if matches!(self.kind(), TokenKind::Int | TokenKind::Double | TokenKind::Char | TokenKind::Struct) {
            self.var_def()
        } else {
            self.stmt()
        }
    }
}
