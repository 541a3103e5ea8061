use crate::symbol::SymbolId;
use atomc_util::{SemError, Symbol as Name};
use indexmap::IndexMap;

/// An ordered, name-unique collection of symbols — one lexical scope.
#[derive(Debug, Default)]
pub struct Domain {
    symbols: IndexMap<Name, SymbolId>,
}

impl Domain {
    fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: Name) -> Option<SymbolId> {
        self.symbols.get(&name).copied()
    }

    pub fn contains(&self, name: Name) -> bool {
        self.symbols.contains_key(&name)
    }
}

/// LIFO chain of domains. Lookup always walks top (most nested) to bottom
/// (global), so inner scopes shadow outer ones.
#[derive(Debug)]
pub struct DomainStack {
    domains: Vec<Domain>,
}

impl Default for DomainStack {
    fn default() -> Self {
        Self {
            domains: vec![Domain::new()],
        }
    }
}

impl DomainStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_domain(&mut self) {
        self.domains.push(Domain::new());
    }

    pub fn pop_domain(&mut self) {
        if self.domains.len() > 1 {
            self.domains.pop();
        }
    }

    pub fn is_global(&self) -> bool {
        self.domains.len() == 1
    }

    /// Inserts `id` under `name` in the current (top) domain. Fails if
    /// that domain already has a symbol with this name.
    pub fn add(&mut self, name: Name, id: SymbolId, line: u32) -> Result<(), SemError> {
        let top = self.domains.last_mut().expect("domain stack never empty");
        if top.contains(name) {
            return Err(SemError::Redefinition {
                line,
                name: name.as_str().to_owned(),
            });
        }
        top.symbols.insert(name, id);
        Ok(())
    }

    /// Walks from the top domain down to the global one, returning the
    /// first match.
    pub fn find(&self, name: Name) -> Option<SymbolId> {
        self.domains.iter().rev().find_map(|d| d.get(name))
    }

    /// Struct definitions only ever live in the global domain.
    pub fn find_struct_def(&self, name: Name) -> Option<SymbolId> {
        self.domains[0].get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_prefers_innermost_scope() {
        let mut table = crate::symbol::SymbolTable::new();
        let outer = table.push(crate::symbol::Symbol::Variable {
            name: Name::intern("x"),
            ty: crate::ty::Type::scalar(crate::ty::Base::Int),
            owner: crate::symbol::Owner::Global,
            index: 0,
        });
        let mut stack = DomainStack::new();
        stack.add(Name::intern("x"), outer, 1).unwrap();
        stack.push_domain();
        let inner = table.push(crate::symbol::Symbol::Variable {
            name: Name::intern("x"),
            ty: crate::ty::Type::scalar(crate::ty::Base::Int),
            owner: crate::symbol::Owner::Global,
            index: 4,
        });
        stack.add(Name::intern("x"), inner, 2).unwrap();
        assert_eq!(stack.find(Name::intern("x")), Some(inner));
        stack.pop_domain();
        assert_eq!(stack.find(Name::intern("x")), Some(outer));
    }

    #[test]
    fn redefinition_in_same_domain_is_rejected() {
        let mut table = crate::symbol::SymbolTable::new();
        let a = table.push(crate::symbol::Symbol::Variable {
            name: Name::intern("a"),
            ty: crate::ty::Type::scalar(crate::ty::Base::Int),
            owner: crate::symbol::Owner::Global,
            index: 0,
        });
        let b = table.push(crate::symbol::Symbol::Variable {
            name: Name::intern("a"),
            ty: crate::ty::Type::scalar(crate::ty::Base::Int),
            owner: crate::symbol::Owner::Global,
            index: 4,
        });
        let mut stack = DomainStack::new();
        stack.add(Name::intern("a"), a, 1).unwrap();
        assert!(stack.add(Name::intern("a"), b, 1).is_err());
    }
}
