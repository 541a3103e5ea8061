use crate::ty::Type;
use atomc_util::Symbol as Name;

/// Index into the compile's symbol arena. Functions and struct
/// definitions are referenced by id (from `Owner`, from `Base::Struct`,
/// from a call site) rather than owned by value, since they are mutated
/// in place as their body is parsed (running offset counters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// Where a `Variable`/`Parameter` symbol's `index` is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Global,
    Function(SymbolId),
    Struct(SymbolId),
}

/// The five symbol kinds the language has. `index` is always counted in VM
/// address-space slots (see `Type::slots`): from the start of the globals
/// vector for `Owner::Global`, from `fp` for parameters (negative) and
/// locals (positive) of a function, and from the start of the struct's
/// layout for members.
#[derive(Debug, Clone)]
pub enum Symbol {
    Variable {
        name: Name,
        ty: Type,
        owner: Owner,
        index: i64,
    },
    Parameter {
        name: Name,
        ty: Type,
        owner: SymbolId,
        index: i64,
    },
    Function {
        name: Name,
        ret_type: Type,
        params: Vec<SymbolId>,
        locals: Vec<SymbolId>,
        next_param_offset: i64,
        next_local_offset: i64,
        entry_addr: Option<usize>,
    },
    ExternalFunction {
        name: Name,
        ret_type: Type,
        params: Vec<SymbolId>,
    },
    StructDef {
        name: Name,
        members: Vec<SymbolId>,
        next_member_offset: i64,
    },
}

impl Symbol {
    pub fn name(&self) -> Name {
        match self {
            Symbol::Variable { name, .. }
            | Symbol::Parameter { name, .. }
            | Symbol::Function { name, .. }
            | Symbol::ExternalFunction { name, .. }
            | Symbol::StructDef { name, .. } => *name,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self, Symbol::Function { .. } | Symbol::ExternalFunction { .. })
    }
}

/// Arena owning every symbol created during a compile. Functions and
/// structs hand out `SymbolId`s for their members/params/locals so the
/// parser can keep adding to them as it walks a body.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len() as u32);
        self.symbols.push(symbol);
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    pub fn struct_size(&self, id: SymbolId) -> usize {
        match self.get(id) {
            Symbol::StructDef { next_member_offset, .. } => *next_member_offset as usize,
            _ => 0,
        }
    }

    /// A struct's width in VM address-space slots: one per member (see
    /// `Type::slots`), independent of its declared byte size.
    pub fn struct_slot_count(&self, id: SymbolId) -> i64 {
        match self.get(id) {
            Symbol::StructDef { members, .. } => members.len() as i64,
            _ => 0,
        }
    }

    /// Allocates a new local or parameter inside `function`, advancing the
    /// running offset, and returns the new symbol's id.
    pub fn add_parameter(&mut self, function: SymbolId, name: Name, ty: Type) -> SymbolId {
        let size = ty.slots(self);
        let Symbol::Function { next_param_offset, .. } = self.get(function) else {
            panic!("add_parameter on non-function symbol")
        };
        let offset = *next_param_offset;
        let id = self.push(Symbol::Parameter {
            name,
            ty,
            owner: function,
            index: offset,
        });
        if let Symbol::Function { params, next_param_offset, .. } = self.get_mut(function) {
            *next_param_offset -= size;
            params.push(id);
        }
        id
    }

    pub fn add_local(&mut self, function: SymbolId, name: Name, ty: Type) -> SymbolId {
        let size = ty.slots(self);
        let Symbol::Function { next_local_offset, .. } = self.get(function) else {
            panic!("add_local on non-function symbol")
        };
        let offset = *next_local_offset;
        let id = self.push(Symbol::Variable {
            name,
            ty,
            owner: Owner::Function(function),
            index: offset,
        });
        if let Symbol::Function { locals, next_local_offset, .. } = self.get_mut(function) {
            *next_local_offset += size;
            locals.push(id);
        }
        id
    }

    pub fn add_member(&mut self, struct_def: SymbolId, name: Name, ty: Type) -> SymbolId {
        let size = ty.slots(self);
        let Symbol::StructDef { next_member_offset, .. } = self.get(struct_def) else {
            panic!("add_member on non-struct symbol")
        };
        let offset = *next_member_offset;
        let id = self.push(Symbol::Variable {
            name,
            ty,
            owner: Owner::Struct(struct_def),
            index: offset,
        });
        if let Symbol::StructDef { members, next_member_offset, .. } = self.get_mut(struct_def) {
            *next_member_offset += size;
            members.push(id);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Base;

    #[test]
    fn parameters_get_decreasing_negative_offsets() {
        let mut table = SymbolTable::new();
        let f = table.push(Symbol::Function {
            name: Name::intern("f"),
            ret_type: Type::scalar(Base::Void),
            params: vec![],
            locals: vec![],
            next_param_offset: -1,
            next_local_offset: 1,
            entry_addr: None,
        });
        let p1 = table.add_parameter(f, Name::intern("a"), Type::scalar(Base::Int));
        let p2 = table.add_parameter(f, Name::intern("b"), Type::scalar(Base::Int));
        match table.get(p1) {
            Symbol::Parameter { index, .. } => assert_eq!(*index, -1),
            _ => panic!(),
        }
        match table.get(p2) {
            Symbol::Parameter { index, .. } => assert_eq!(*index, -2),
            _ => panic!(),
        }
    }

    #[test]
    fn locals_get_increasing_positive_offsets() {
        let mut table = SymbolTable::new();
        let f = table.push(Symbol::Function {
            name: Name::intern("f"),
            ret_type: Type::scalar(Base::Void),
            params: vec![],
            locals: vec![],
            next_param_offset: -1,
            next_local_offset: 1,
            entry_addr: None,
        });
        let l1 = table.add_local(f, Name::intern("i"), Type::scalar(Base::Int));
        let l2 = table.add_local(f, Name::intern("d"), Type::scalar(Base::Double));
        match table.get(l1) {
            Symbol::Variable { index, .. } => assert_eq!(*index, 1),
            _ => panic!(),
        }
        match table.get(l2) {
            Symbol::Variable { index, .. } => assert_eq!(*index, 2),
            _ => panic!(),
        }
    }
}
