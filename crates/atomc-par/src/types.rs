use crate::parser::Parser;
use atomc_lex::TokenKind;
use atomc_sem::{Base, Type};
use atomc_util::SemError;

impl Parser {
    /// `typeBase := INT | DOUBLE | CHAR | STRUCT ID`. The struct name must
    /// already be defined in the global domain (`NoStructDef` otherwise).
    pub(crate) fn type_base(&mut self) -> Result<Type, SemError> {
        match self.kind().clone() {
            TokenKind::Int => {
                self.advance();
                Ok(Type::scalar(Base::Int))
            }
            TokenKind::Double => {
                self.advance();
                Ok(Type::scalar(Base::Double))
            }
            TokenKind::Char => {
                self.advance();
                Ok(Type::scalar(Base::Char))
            }
            TokenKind::Struct => {
                self.advance();
                let line = self.line();
                let name_tok = self.expect(TokenKind::Id(String::new()))?;
                let name = Self::id_name(&name_tok);
                let struct_id = self
                    .domains
                    .find_struct_def(name)
                    .ok_or_else(|| SemError::NoStructDef {
                        line,
                        name: name.as_str().to_owned(),
                    })?;
                Ok(Type::scalar(Base::Struct(struct_id)))
            }
            _ => Err(SemError::Syntax {
                line: self.line(),
                expected: "a type".to_owned(),
            }),
        }
    }

    /// `arrayDecl := LBRACKET CT_INT? RBRACKET`. `None` means the declarator
    /// had no brackets at all (scalar); `Some(0)` means `[]` (open
    /// array/pointer); `Some(n)` means a fixed size of `n`.
    pub(crate) fn array_decl(&mut self) -> Result<Option<i32>, SemError> {
        if self.accept(&TokenKind::Lbracket).is_none() {
            return Ok(None);
        }
        let dim = if let TokenKind::CtInt(n) = self.kind().clone() {
            self.advance();
            n as i32
        } else {
            0
        };
        self.expect(TokenKind::Rbracket)?;
        Ok(Some(dim))
    }

    /// `typeBase ID arrayDecl?`, shared by `varDef`, struct members and
    /// `fnParam`. Returns the declared name, its full type, and the line the
    /// name appeared on (for diagnostics).
    pub(crate) fn typed_decl(&mut self) -> Result<(atomc_util::Symbol, Type, u32), SemError> {
        let base = self.type_base()?;
        let name_tok = self.expect(TokenKind::Id(String::new()))?;
        let line = name_tok.line;
        let name = Self::id_name(&name_tok);
        let dim = self.array_decl()?;
        let ty = match dim {
            None => Type { base: base.base, dim: -1 },
            Some(n) => Type { base: base.base, dim: n },
        };
        Ok((name, ty, line))
    }
}
