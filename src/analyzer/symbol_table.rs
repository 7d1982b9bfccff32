use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::SemanticError;

use super::Type;

#[derive(Clone, Debug, PartialEq)]
pub enum Symbol {
    Variable {
        name: String,
        scope: i32,
        ty: Type,
    },
    Array {
        name: String,
        scope: i32,
        ty: Type,
        size: usize,
    },
    Function {
        name: String,
        scope: i32,
        ty: Type,
        params: Vec<Symbol>,
    },
}

impl Symbol {
    pub fn name(&self) -> &str {
        match self {
            Symbol::Variable { name, .. }
            | Symbol::Array { name, .. }
            | Symbol::Function { name, .. } => name,
        }
    }

    pub fn scope(&self) -> i32 {
        match self {
            Symbol::Variable { scope, .. }
            | Symbol::Array { scope, .. }
            | Symbol::Function { scope, .. } => *scope,
        }
    }

    pub fn ty(&self) -> Type {
        match self {
            Symbol::Variable { ty, .. }
            | Symbol::Array { ty, .. }
            | Symbol::Function { ty, .. } => *ty,
        }
    }

    pub fn is_global(&self) -> bool {
        self.scope() == 0
    }
}

type Frame = HashMap<String, Symbol>;

/// Stack of scope frames. The scope counter starts at -1, so the first
/// `enter_scope` opens the global scope 0.
#[derive(Clone, Debug)]
pub struct SymbolTable {
    frames: Vec<Frame>,
    retired: Vec<Frame>,
    scope: i32,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            frames: vec![],
            retired: vec![],
            scope: -1,
        }
    }

    pub fn scope(&self) -> i32 {
        self.scope
    }

    pub fn enter_scope(&mut self) {
        self.frames.push(Frame::new());
        self.scope += 1;
        debug!(scope = self.scope, "entered scope");
    }

    pub fn exit_scope(&mut self) {
        if let Some(frame) = self.frames.pop() {
            self.retired.push(frame);
            debug!(scope = self.scope, "exited scope");
            self.scope -= 1;
        }
    }

    /// Declares `symbol` in the innermost frame.
    pub fn insert(&mut self, symbol: Symbol) -> Result<(), SemanticError> {
        let Some(frame) = self.frames.last_mut() else {
            return Err(SemanticError::Undeclared(symbol.name().to_string()));
        };
        if frame.contains_key(symbol.name()) {
            return Err(SemanticError::Duplicate(symbol.name().to_string()));
        }
        frame.insert(symbol.name().to_string(), symbol);
        Ok(())
    }

    /// Nearest enclosing declaration of `name`.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Frames popped by `exit_scope`, oldest first.
    pub fn retired_frames(&self) -> impl Iterator<Item = &Symbol> {
        self.retired.iter().flat_map(|frame| frame.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(name: &str, scope: i32) -> Symbol {
        Symbol::Variable {
            name: name.to_string(),
            scope,
            ty: Type::Int,
        }
    }

    #[test]
    fn scope_counter_starts_below_global() {
        let mut table = SymbolTable::new();
        assert_eq!(table.scope(), -1);
        table.enter_scope();
        assert_eq!(table.scope(), 0);
        table.enter_scope();
        table.exit_scope();
        assert_eq!(table.scope(), 0);
    }

    #[test]
    fn duplicate_in_same_frame() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        assert!(table.insert(var("x", 0)).is_ok());
        assert_eq!(
            table.insert(var("x", 0)),
            Err(SemanticError::Duplicate("x".to_string()))
        );
    }

    #[test]
    fn shadowing_in_inner_frame() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.insert(var("x", 0)).unwrap();
        table.enter_scope();
        table
            .insert(Symbol::Variable {
                name: "x".to_string(),
                scope: 1,
                ty: Type::Float,
            })
            .unwrap();
        assert_eq!(table.get("x").map(Symbol::ty), Some(Type::Float));
        table.exit_scope();
        assert_eq!(table.get("x").map(Symbol::ty), Some(Type::Int));
        assert_eq!(table.retired_frames().count(), 1);
    }

    #[test]
    fn lookup_misses_after_exit() {
        let mut table = SymbolTable::new();
        table.enter_scope();
        table.enter_scope();
        table.insert(var("y", 1)).unwrap();
        table.exit_scope();
        assert!(table.get("y").is_none());
    }

    #[test]
    fn insert_without_scope_fails() {
        let mut table = SymbolTable::new();
        assert!(table.insert(var("x", 0)).is_err());
    }
}
