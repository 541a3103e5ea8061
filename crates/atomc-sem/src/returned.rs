use crate::ty::Type;

/// The result of analyzing an expression. Invariants enforced by
/// construction, not checked after the fact: `Returned::constant` never
/// sets `is_lval`; array-typed results (`ty.dim >= 0`) are never treated as
/// scalar by callers; a call's result is always built via `Returned::rvalue`.
#[derive(Debug, Clone, Copy)]
pub struct Returned {
    pub ty: Type,
    pub is_lval: bool,
    pub is_ct: bool,
}

impl Returned {
    pub fn lvalue(ty: Type) -> Self {
        Self {
            ty,
            is_lval: true,
            is_ct: false,
        }
    }

    pub fn rvalue(ty: Type) -> Self {
        Self {
            ty,
            is_lval: false,
            is_ct: false,
        }
    }

    pub fn constant(ty: Type) -> Self {
        Self {
            ty,
            is_lval: false,
            is_ct: true,
        }
    }
}
