use crate::context::CompilationContext;
use crate::diagnostics::{Diagnostic, SemanticError};
use crate::lexer::{Token, TokenKind};

use super::{Symbol, SymbolTable, Type};

/// Semantic checks run by the parser as it goes. Failures are reported to
/// the context and never stop the parse.
#[derive(Debug)]
pub struct Analyzer {
    table: SymbolTable,
    entry_point: String,
}

impl Analyzer {
    pub fn new(entry_point: impl Into<String>) -> Self {
        Self {
            table: SymbolTable::new(),
            entry_point: entry_point.into(),
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn scope(&self) -> i32 {
        self.table.scope()
    }

    pub fn enter_scope(&mut self) {
        self.table.enter_scope();
    }

    pub fn exit_scope(&mut self) {
        self.table.exit_scope();
    }

    pub fn is_entry_point(&self, name: &str) -> bool {
        self.entry_point == name
    }

    pub fn add_symbol(
        &mut self,
        ctx: &mut CompilationContext,
        symbol: Symbol,
        token: &Token,
    ) -> bool {
        if let Symbol::Variable {
            ty: Type::Void,
            name,
            ..
        }
        | Symbol::Array {
            ty: Type::Void,
            name,
            ..
        } = &symbol
        {
            ctx.report(Diagnostic::semantic(token, SemanticError::VoidVariable(name.clone())));
            return false;
        }
        match self.table.insert(symbol) {
            Ok(()) => true,
            Err(e) => {
                ctx.report(Diagnostic::semantic(token, e));
                false
            }
        }
    }

    pub fn get(&self, ctx: &mut CompilationContext, token: &Token) -> Option<Symbol> {
        let symbol = self.table.get(&token.lexeme).cloned();
        if symbol.is_none() {
            ctx.report(Diagnostic::semantic(
                token,
                SemanticError::Undeclared(token.lexeme.clone()),
            ));
        }
        symbol
    }

    pub fn check_type_agreement(
        &self,
        ctx: &mut CompilationContext,
        expected: Type,
        found: Type,
        token: &Token,
    ) -> bool {
        if check_type_agreement(expected, found) {
            return true;
        }
        ctx.report(Diagnostic::semantic(
            token,
            SemanticError::TypeMismatch { expected, found },
        ));
        false
    }

    /// Type of a plain variable use. Functions are not values.
    pub fn check_variable(
        &self,
        ctx: &mut CompilationContext,
        symbol: Option<&Symbol>,
        token: &Token,
    ) -> Type {
        match symbol {
            Some(Symbol::Function { name, .. }) => {
                ctx.report(Diagnostic::semantic(
                    token,
                    SemanticError::FunctionAsVariable(name.clone()),
                ));
                Type::None
            }
            Some(symbol) => symbol.ty(),
            None => Type::None,
        }
    }

    /// Element type of an indexed variable.
    pub fn check_array(
        &self,
        ctx: &mut CompilationContext,
        symbol: Option<&Symbol>,
        index: Type,
        token: &Token,
    ) -> Type {
        if index != Type::Int {
            ctx.report(Diagnostic::semantic(token, SemanticError::NonIntegerIndex(index)));
        }
        match symbol {
            Some(Symbol::Array { ty, .. }) => *ty,
            Some(symbol) => {
                ctx.report(Diagnostic::semantic(
                    token,
                    SemanticError::NotAnArray(symbol.name().to_string()),
                ));
                Type::None
            }
            None => Type::None,
        }
    }

    pub fn check_callee<'s>(
        &self,
        ctx: &mut CompilationContext,
        symbol: Option<&'s Symbol>,
        token: &Token,
    ) -> Option<&'s Symbol> {
        match symbol {
            Some(function @ Symbol::Function { .. }) => Some(function),
            Some(symbol) => {
                ctx.report(Diagnostic::semantic(
                    token,
                    SemanticError::NotAFunction(symbol.name().to_string()),
                ));
                None
            }
            None => None,
        }
    }

    /// Compares the argument count at the call whose `(` sits at
    /// `tokens[open]` with the callee's parameter count.
    pub fn check_arguments(
        &self,
        ctx: &mut CompilationContext,
        callee: &Symbol,
        tokens: &[Token],
        open: usize,
    ) -> bool {
        let Symbol::Function { name, params, .. } = callee else {
            return false;
        };
        let found = count_arguments(tokens, open);
        if found == params.len() {
            return true;
        }
        ctx.report(Diagnostic::semantic(
            &tokens[open.saturating_sub(1)],
            SemanticError::Arity {
                name: name.clone(),
                expected: params.len(),
                found,
            },
        ));
        false
    }

    pub fn check_entry_point(
        &self,
        ctx: &mut CompilationContext,
        function: &Symbol,
        token: &Token,
    ) {
        let Symbol::Function { name, params, ty, .. } = function else {
            return;
        };
        if !ctx.mark_entry_seen() {
            ctx.report(Diagnostic::semantic(
                token,
                SemanticError::DuplicateEntryPoint(name.clone()),
            ));
            return;
        }
        if !function.is_global() || !params.is_empty() || *ty != Type::Void {
            ctx.report(Diagnostic::semantic(
                token,
                SemanticError::InvalidEntryPoint(name.clone()),
            ));
        }
    }

    /// A non-void function must contain at least one `return`.
    pub fn check_returns(
        &self,
        ctx: &mut CompilationContext,
        function: &FunctionFrame,
        token: &Token,
    ) {
        if function.ty != Type::Void && function.returns == 0 {
            ctx.report(Diagnostic::semantic(
                token,
                SemanticError::MissingReturn(function.name.clone()),
            ));
        }
    }

    /// Checks one `return` against the enclosing function. `value` is the
    /// type of the returned expression, if there is one.
    pub fn check_return(
        &self,
        ctx: &mut CompilationContext,
        function: &FunctionFrame,
        value: Option<Type>,
        token: &Token,
    ) {
        match (function.ty, value) {
            (Type::Void, None) => (),
            (Type::Void, Some(_)) => ctx.report(Diagnostic::semantic(
                token,
                SemanticError::ReturnValueInVoid(function.name.clone()),
            )),
            (expected, found) => {
                self.check_type_agreement(ctx, expected, found.unwrap_or(Type::Void), token);
            }
        }
    }

    /// Closes the analysis once the whole program has been parsed.
    pub fn finish(&self, ctx: &mut CompilationContext, last: &Token) {
        if !ctx.entry_seen() {
            ctx.report(Diagnostic::semantic(
                last,
                SemanticError::MissingEntryPoint(self.entry_point.clone()),
            ));
        }
    }
}

/// The function whose body is being parsed.
#[derive(Clone, Debug)]
pub struct FunctionFrame {
    pub name: String,
    pub ty: Type,
    pub returns: usize,
}

impl FunctionFrame {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            returns: 0,
        }
    }
}

pub fn check_type_agreement(a: Type, b: Type) -> bool {
    a.agrees_with(&b)
}

/// Counts comma-separated arguments between `tokens[open]` (a `(`) and its
/// matching `)`. Only commas at the call's own paren depth count, so nested
/// calls do not inflate the total.
pub fn count_arguments(tokens: &[Token], open: usize) -> usize {
    let Some(open_token) = tokens.get(open) else {
        return 0;
    };
    let depth = open_token.paren_depth;
    let mut commas = 0;
    let mut any = false;

    for token in &tokens[open + 1..] {
        if token.kind == TokenKind::EndOfInput
            || (token.is_grouping(')') && token.paren_depth == depth - 1)
        {
            break;
        }
        any = true;
        if token.is_grouping(',') && token.paren_depth == depth {
            commas += 1;
        }
    }

    if any {
        commas + 1
    } else {
        0
    }
}
