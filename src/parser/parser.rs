use crate::analyzer::{Analyzer, FunctionFrame, Symbol, Type};
use crate::codegen::PLACEHOLDER;
use crate::context::CompilationContext;
use crate::diagnostics::{Diagnostic, SemanticError, SyntaxError};
use crate::lexer::{Keyword, Token, TokenKind};

use super::ParseResult;

/// Single-pass recursive-descent parser. Productions address the token tape
/// by index and drive the analyzer and code generator as they match.
#[derive(Debug)]
pub struct Parser<'a> {
    pub(super) tokens: Vec<Token>,
    pub(super) analyzer: Analyzer,
    pub(super) ctx: &'a mut CompilationContext,
}

impl<'a> Parser<'a> {
    /// Whitespace and comment tokens are left off the tape.
    pub fn new(tokens: &[Token], entry_point: &str, ctx: &'a mut CompilationContext) -> Self {
        let tokens = tokens
            .iter()
            .filter(|t| !matches!(t.kind, TokenKind::Whitespace | TokenKind::Comment))
            .cloned()
            .collect();
        Self {
            tokens,
            analyzer: Analyzer::new(entry_point),
            ctx,
        }
    }

    #[tracing::instrument(skip_all, fields(tokens = self.tokens.len()))]
    pub fn parse(&mut self) -> Result<ParseResult, SyntaxError> {
        let line = self.tokens.last().map_or(1, |t| t.line);
        self.tokens.push(Token::end_of_input(line));

        self.analyzer.enter_scope();
        let result = self.declaration_list(0);
        self.analyzer.exit_scope();

        let marker = self.tokens.len() - 1;
        let outcome = if result.is_accept() && result.end == marker {
            self.analyzer.finish(self.ctx, &self.tokens[marker]);
            Ok(result)
        } else {
            let token = self.peek(result.end);
            Err(SyntaxError {
                lexeme: token.lexeme.clone(),
                line: token.line,
            })
        };

        self.tokens.pop();
        outcome
    }

    /// Token at `index`; indices past the end land on the end marker.
    pub(super) fn peek(&self, index: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[index.min(last)]
    }

    fn type_specifier(&self, index: usize) -> Option<Type> {
        self.peek(index).keyword().and_then(Type::from_keyword)
    }

    /// declaration-list = declaration+
    fn declaration_list(&mut self, beg: usize) -> ParseResult {
        let mut index = beg;
        loop {
            let result = self.declaration(index);
            if result.is_reject() {
                return result;
            }
            index = result.end;
            if self.peek(index).is_end() {
                break;
            }
        }
        ParseResult::accept(Type::None, beg, index)
    }

    /// declaration = var-declaration | fun-declaration
    fn declaration(&mut self, beg: usize) -> ParseResult {
        let Some(ty) = self.type_specifier(beg) else {
            return ParseResult::reject(beg, beg);
        };
        if self.peek(beg + 1).kind != TokenKind::Identifier {
            return ParseResult::reject(beg, beg + 1);
        }
        if self.peek(beg + 2).is_grouping('(') {
            self.function_declaration(beg, ty)
        } else {
            self.var_declaration(beg)
        }
    }

    /// var-declaration = type ID ";" | type ID "[" INT "]" ";"
    fn var_declaration(&mut self, beg: usize) -> ParseResult {
        let Some(ty) = self.type_specifier(beg) else {
            return ParseResult::reject(beg, beg);
        };
        let name = self.peek(beg + 1).clone();
        if name.kind != TokenKind::Identifier {
            return ParseResult::reject(beg, beg + 1);
        }
        let scope = self.analyzer.scope();

        if self.peek(beg + 2).is_grouping(';') {
            let symbol = Symbol::Variable {
                name: name.lexeme.clone(),
                scope,
                ty,
            };
            self.analyzer.add_symbol(self.ctx, symbol, &name);
            self.ctx.codegen.write_variable_alloc(&name.lexeme);
            return ParseResult::accept(ty, beg, beg + 3);
        }

        if !self.peek(beg + 2).is_grouping('[') {
            return ParseResult::reject(beg, beg + 2);
        }
        let size_token = self.peek(beg + 3);
        if size_token.kind != TokenKind::Integer {
            return ParseResult::reject(beg, beg + 3);
        }
        // digits only, so parsing fails on overflow alone
        let size = size_token.lexeme.parse::<usize>().ok();
        if !self.peek(beg + 4).is_grouping(']') {
            return ParseResult::reject(beg, beg + 4);
        }
        if !self.peek(beg + 5).is_grouping(';') {
            return ParseResult::reject(beg, beg + 5);
        }

        let symbol = Symbol::Array {
            name: name.lexeme.clone(),
            scope,
            ty,
            size: size.unwrap_or(0),
        };
        self.analyzer.add_symbol(self.ctx, symbol, &name);
        let allocated = match size {
            Some(size) => self.ctx.codegen.write_array_alloc(&name.lexeme, size),
            None => false,
        };
        if !allocated {
            self.ctx.report(Diagnostic::semantic(
                &name,
                SemanticError::ArrayTooLarge(name.lexeme.clone()),
            ));
        }
        ParseResult::accept(ty, beg, beg + 6)
    }

    /// fun-declaration = type ID "(" params ")" compound
    fn function_declaration(&mut self, beg: usize, ty: Type) -> ParseResult {
        let name = self.peek(beg + 1).clone();

        let mut params = vec![];
        let result = self.params(beg + 3, &mut params);
        if result.is_reject() {
            return result;
        }
        if !self.peek(result.end).is_grouping(')') {
            return ParseResult::reject(beg, result.end);
        }

        let function = Symbol::Function {
            name: name.lexeme.clone(),
            scope: self.analyzer.scope(),
            ty,
            params: params.iter().map(|(param, _)| param.clone()).collect(),
        };
        self.analyzer.add_symbol(self.ctx, function.clone(), &name);
        if self.analyzer.is_entry_point(&name.lexeme) {
            self.analyzer.check_entry_point(self.ctx, &function, &name);
        }
        self.ctx.codegen.write_function_start(&name.lexeme, ty, params.len());

        // parameters and the body's own declarations share one frame
        self.analyzer.enter_scope();
        for (param, token) in params {
            self.ctx.codegen.write_parameter(param.name());
            self.analyzer.add_symbol(self.ctx, param, &token);
        }
        let mut frame = FunctionFrame::new(name.lexeme.clone(), ty);
        let body = self.compound_statement(result.end + 1, &mut frame, false);
        self.analyzer.exit_scope();
        if body.is_reject() {
            return body;
        }

        self.analyzer.check_returns(self.ctx, &frame, &name);
        self.ctx.codegen.write_function_stop(&name.lexeme);
        ParseResult::accept(ty, beg, body.end)
    }

    /// params = "void" | param ("," param)*
    fn params(&mut self, beg: usize, params: &mut Vec<(Symbol, Token)>) -> ParseResult {
        if self.peek(beg).is_keyword(Keyword::Void) && self.peek(beg + 1).is_grouping(')') {
            return ParseResult::accept(Type::Void, beg, beg + 1);
        }

        let mut index = beg;
        loop {
            let result = self.param(index, params);
            if result.is_reject() {
                return result;
            }
            index = result.end;
            if !self.peek(index).is_grouping(',') {
                break;
            }
            index += 1;
        }
        ParseResult::accept(Type::None, beg, index)
    }

    /// param = type ID ("[" "]")?
    fn param(&mut self, beg: usize, params: &mut Vec<(Symbol, Token)>) -> ParseResult {
        let Some(ty) = self.type_specifier(beg) else {
            return ParseResult::reject(beg, beg);
        };
        let name = self.peek(beg + 1).clone();
        if name.kind != TokenKind::Identifier {
            return ParseResult::reject(beg, beg + 1);
        }
        let scope = self.analyzer.scope() + 1;

        let (symbol, end) = if self.peek(beg + 2).is_grouping('[') {
            if !self.peek(beg + 3).is_grouping(']') {
                return ParseResult::reject(beg, beg + 3);
            }
            let symbol = Symbol::Array {
                name: name.lexeme.clone(),
                scope,
                ty,
                size: 0,
            };
            (symbol, beg + 4)
        } else {
            let symbol = Symbol::Variable {
                name: name.lexeme.clone(),
                scope,
                ty,
            };
            (symbol, beg + 2)
        };

        params.push((symbol, name));
        ParseResult::accept(ty, beg, end)
    }

    /// compound = "{" var-declaration* statement-list "}"
    fn compound_statement(
        &mut self,
        beg: usize,
        function: &mut FunctionFrame,
        new_scope: bool,
    ) -> ParseResult {
        if !self.peek(beg).is_grouping('{') {
            return ParseResult::reject(beg, beg);
        }

        if new_scope {
            self.analyzer.enter_scope();
        }
        let result = self.compound_body(beg + 1, function);
        if new_scope {
            self.analyzer.exit_scope();
        }

        if result.is_reject() {
            return result;
        }
        if !self.peek(result.end).is_grouping('}') {
            return ParseResult::reject(beg, result.end);
        }
        ParseResult::accept(Type::None, beg, result.end + 1)
    }

    fn compound_body(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let mut index = beg;
        while self.type_specifier(index).is_some() {
            let result = self.var_declaration(index);
            if result.is_reject() {
                return result;
            }
            index = result.end;
        }

        let statements = self.statement_list(index, function);
        if statements.is_reject() {
            return statements;
        }
        ParseResult::accept(Type::None, beg, statements.end)
    }

    /// statement-list = statement*
    fn statement_list(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let mut index = beg;
        while !self.peek(index).is_grouping('}') && !self.peek(index).is_end() {
            let result = self.statement(index, function);
            if result.is_reject() {
                return result;
            }
            index = result.end;
        }

        if index == beg {
            ParseResult::empty(beg)
        } else {
            ParseResult::accept(Type::None, beg, index)
        }
    }

    /// statement = expression-stmt | compound | selection | iteration | return
    fn statement(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let token = self.peek(beg);
        let opens_block = token.is_grouping('{');
        let is_empty = token.is_grouping(';');
        let keyword = token.keyword();

        if opens_block {
            return self.compound_statement(beg, function, true);
        }
        if is_empty {
            return ParseResult::accept(Type::None, beg, beg + 1);
        }
        match keyword {
            Some(Keyword::If) => self.selection_statement(beg, function),
            Some(Keyword::While) => self.iteration_statement(beg, function),
            Some(Keyword::Return) => self.return_statement(beg, function),
            Some(_) => ParseResult::reject(beg, beg),
            None => self.expression_statement(beg),
        }
    }

    /// expression-stmt = expression ";"
    fn expression_statement(&mut self, beg: usize) -> ParseResult {
        let expression = self.expression(beg);
        if expression.is_reject() {
            return expression;
        }
        if !self.peek(expression.end).is_grouping(';') {
            return ParseResult::reject(beg, expression.end);
        }
        ParseResult::accept(expression.ty, beg, expression.end + 1)
    }

    /// "(" expression ")" heading a control statement. A comparison at its
    /// top emits the placeholder branch that skips the guarded statement.
    fn condition(&mut self, beg: usize) -> ParseResult {
        if !self.peek(beg).is_grouping('(') {
            return ParseResult::reject(beg, beg);
        }

        self.ctx.codegen.enter_condition();
        let expression = self.expression(beg + 1);
        self.ctx.codegen.leave_condition();

        if expression.is_reject() {
            return expression;
        }
        if !self.peek(expression.end).is_grouping(')') {
            return ParseResult::reject(beg, expression.end);
        }
        ParseResult::accept(expression.ty, beg, expression.end + 1).with_place(expression.place)
    }

    /// selection = "if" "(" expression ")" statement ("else" statement)?
    fn selection_statement(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let condition = self.condition(beg + 1);
        if condition.is_reject() {
            return condition;
        }
        let body = self.statement(condition.end, function);
        if body.is_reject() {
            return body;
        }

        if !self.peek(body.end).is_keyword(Keyword::Else) {
            let after = self.ctx.codegen.next_index();
            self.ctx.codegen.backpatch(after);
            return ParseResult::accept(Type::None, beg, body.end);
        }

        // the false branch lands just past the jump over the else part
        let skip = self.ctx.codegen.next_index() + 1;
        self.ctx.codegen.backpatch(skip);
        self.ctx.codegen.write_unconditional_branch(PLACEHOLDER);

        let alternative = self.statement(body.end + 1, function);
        if alternative.is_reject() {
            return alternative;
        }
        let after = self.ctx.codegen.next_index();
        self.ctx.codegen.backpatch(after);
        ParseResult::accept(Type::None, beg, alternative.end)
    }

    /// iteration = "while" "(" expression ")" statement
    fn iteration_statement(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let start = self.ctx.codegen.next_index();
        let condition = self.condition(beg + 1);
        if condition.is_reject() {
            return condition;
        }
        let body = self.statement(condition.end, function);
        if body.is_reject() {
            return body;
        }

        self.ctx.codegen.write_unconditional_branch(&start.to_string());
        let after = self.ctx.codegen.next_index();
        self.ctx.codegen.backpatch(after);
        ParseResult::accept(Type::None, beg, body.end)
    }

    /// return = "return" expression? ";"
    fn return_statement(&mut self, beg: usize, function: &mut FunctionFrame) -> ParseResult {
        let keyword = self.peek(beg).clone();
        function.returns += 1;

        if self.peek(beg + 1).is_grouping(';') {
            self.analyzer.check_return(self.ctx, function, None, &keyword);
            self.ctx.codegen.write_return(None);
            return ParseResult::accept(Type::Void, beg, beg + 2);
        }

        let value = self.expression(beg + 1);
        if value.is_reject() {
            return value;
        }
        if !self.peek(value.end).is_grouping(';') {
            return ParseResult::reject(beg, value.end);
        }
        self.analyzer.check_return(self.ctx, function, Some(value.ty), &keyword);
        self.ctx.codegen.write_return(Some(&value.place));
        ParseResult::accept(value.ty, beg, value.end + 1)
    }
}
