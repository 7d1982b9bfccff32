use crate::analyzer::{count_arguments, Symbol, Type};
use crate::lexer::{Grouping, Nest, Operator, Token, TokenKind};

use super::{ParseResult, Parser};

impl Parser<'_> {
    /// expression = variable "=" expression | simple-expression
    pub(super) fn expression(&mut self, beg: usize) -> ParseResult {
        if !self.is_assignment(beg) {
            return self.simple_expression(beg);
        }

        let target = self.variable(beg);
        if target.is_reject() {
            return target;
        }
        let assign = self.peek(target.end).clone();
        let value = self.expression(target.end + 1);
        if value.is_reject() {
            return value;
        }

        self.analyzer
            .check_type_agreement(self.ctx, target.ty, value.ty, &assign);
        self.ctx.codegen.write_assignment(&value.place, &target.place);
        ParseResult::accept(target.ty, beg, value.end).with_place(target.place)
    }

    /// Whether `beg` starts `variable "="`. Looks past an index through the
    /// bracket depth stamps so nothing is emitted while deciding.
    fn is_assignment(&self, beg: usize) -> bool {
        if self.peek(beg).kind != TokenKind::Identifier {
            return false;
        }
        let end = if self.peek(beg + 1).is_grouping('[') {
            match self.matching_close(beg + 1) {
                Some(close) => close + 1,
                None => return false,
            }
        } else {
            beg + 1
        };
        self.peek(end).is_operator(Operator::Assign)
    }

    /// Index of the grouping closing the one opened at `open`.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let token = self.peek(open);
        let (close, depth): (char, fn(&Token) -> i32) = match token.grouping()? {
            Grouping::Open(Nest::Paren) => (')', |t: &Token| t.paren_depth),
            Grouping::Open(Nest::Bracket) => (']', |t: &Token| t.bracket_depth),
            Grouping::Open(Nest::Brace) => ('}', |t: &Token| t.brace_depth),
            _ => return None,
        };
        // a closer carries the depth outside the pair it closes
        let outer = depth(token) - 1;
        self.tokens[open + 1..]
            .iter()
            .position(|t| t.is_grouping(close) && depth(t) == outer)
            .map(|i| open + 1 + i)
    }

    /// simple-expression = additive (relop additive)?
    fn simple_expression(&mut self, beg: usize) -> ParseResult {
        let left = self.additive_expression(beg);
        if left.is_reject() {
            return left;
        }
        let Some(op) = self.peek(left.end).operator().filter(Operator::is_relational) else {
            return left;
        };
        let op_token = self.peek(left.end).clone();

        let right = self.additive_expression(left.end + 1);
        if right.is_reject() {
            return right;
        }

        self.analyzer
            .check_type_agreement(self.ctx, left.ty, right.ty, &op_token);
        let temp = self.ctx.codegen.reserve_temp();
        self.ctx.codegen.write_comparison(&left.place, &right.place, &temp);
        if self.ctx.codegen.take_condition() {
            self.ctx.codegen.write_conditional_branch(op, &temp);
        }
        ParseResult::accept(Type::Int, beg, right.end).with_place(temp)
    }

    /// additive = term (("+" | "-") term)*
    fn additive_expression(&mut self, beg: usize) -> ParseResult {
        let mut result = self.term(beg);
        if result.is_reject() {
            return result;
        }

        while let Some(op) = self.peek(result.end).operator().filter(Operator::is_additive) {
            let op_token = self.peek(result.end).clone();
            let right = self.term(result.end + 1);
            if right.is_reject() {
                return right;
            }

            self.analyzer
                .check_type_agreement(self.ctx, result.ty, right.ty, &op_token);
            let temp = self.ctx.codegen.reserve_temp();
            self.ctx
                .codegen
                .write_add_or_sub(op, &result.place, &right.place, &temp);
            result = ParseResult::accept(result.ty, beg, right.end).with_place(temp);
        }

        result
    }

    /// term = factor (("*" | "/") factor)*
    fn term(&mut self, beg: usize) -> ParseResult {
        let mut result = self.factor(beg);
        if result.is_reject() {
            return result;
        }

        while let Some(op) = self.peek(result.end).operator().filter(Operator::is_multiplicative) {
            let op_token = self.peek(result.end).clone();
            let right = self.factor(result.end + 1);
            if right.is_reject() {
                return right;
            }

            self.analyzer
                .check_type_agreement(self.ctx, result.ty, right.ty, &op_token);
            let temp = self.ctx.codegen.reserve_temp();
            self.ctx
                .codegen
                .write_mult_or_div(op, &result.place, &right.place, &temp);
            result = ParseResult::accept(result.ty, beg, right.end).with_place(temp);
        }

        result
    }

    /// factor = "(" expression ")" | variable | call | NUM
    fn factor(&mut self, beg: usize) -> ParseResult {
        let token = self.peek(beg).clone();
        match token.kind {
            TokenKind::Grouping if token.is_grouping('(') => {
                let inner = self.expression(beg + 1);
                if inner.is_reject() {
                    return inner;
                }
                if !self.peek(inner.end).is_grouping(')') {
                    return ParseResult::reject(beg, inner.end);
                }
                ParseResult::accept(inner.ty, beg, inner.end + 1).with_place(inner.place)
            }
            TokenKind::Integer => {
                ParseResult::accept(Type::Int, beg, beg + 1).with_place(token.lexeme)
            }
            TokenKind::Float => {
                ParseResult::accept(Type::Float, beg, beg + 1).with_place(token.lexeme)
            }
            TokenKind::Identifier if self.peek(beg + 1).is_grouping('(') => self.call(beg),
            TokenKind::Identifier => self.variable(beg),
            _ => ParseResult::reject(beg, beg),
        }
    }

    /// variable = ID ("[" expression "]")?
    fn variable(&mut self, beg: usize) -> ParseResult {
        let token = self.peek(beg).clone();
        if token.kind != TokenKind::Identifier {
            return ParseResult::reject(beg, beg);
        }
        let symbol = self.analyzer.get(self.ctx, &token);

        if !self.peek(beg + 1).is_grouping('[') {
            let ty = self.analyzer.check_variable(self.ctx, symbol.as_ref(), &token);
            return ParseResult::accept(ty, beg, beg + 1).with_place(token.lexeme);
        }

        // a comparison inside the index is not the statement's condition
        let suspended = self.ctx.codegen.take_condition();
        let index = self.expression(beg + 2);
        if suspended {
            self.ctx.codegen.enter_condition();
        }
        if index.is_reject() {
            return index;
        }
        if !self.peek(index.end).is_grouping(']') {
            return ParseResult::reject(beg, index.end);
        }

        let ty = self
            .analyzer
            .check_array(self.ctx, symbol.as_ref(), index.ty, &token);
        let offset = self.ctx.codegen.reserve_temp();
        let address = self.ctx.codegen.reserve_temp();
        self.ctx
            .codegen
            .write_displacement(&token.lexeme, &index.place, &offset, &address);
        ParseResult::accept(ty, beg, index.end + 1).with_place(address)
    }

    /// call = ID "(" args ")"
    fn call(&mut self, beg: usize) -> ParseResult {
        let token = self.peek(beg).clone();
        let symbol = self.analyzer.get(self.ctx, &token);
        let callee = self
            .analyzer
            .check_callee(self.ctx, symbol.as_ref(), &token)
            .cloned();

        let params = match &callee {
            Some(function @ Symbol::Function { params, .. }) => {
                self.analyzer
                    .check_arguments(self.ctx, function, &self.tokens, beg + 1);
                params.clone()
            }
            _ => vec![],
        };

        let suspended = self.ctx.codegen.take_condition();
        let args = self.args(beg + 2, &params);
        if suspended {
            self.ctx.codegen.enter_condition();
        }
        if args.is_reject() {
            return args;
        }
        if !self.peek(args.end).is_grouping(')') {
            return ParseResult::reject(beg, args.end);
        }

        let ty = callee.as_ref().map_or(Type::None, Symbol::ty);
        let argc = count_arguments(&self.tokens, beg + 1);
        let temp = self.ctx.codegen.reserve_temp();
        self.ctx
            .codegen
            .write_function_call(&token.lexeme, argc, &temp);
        ParseResult::accept(ty, beg, args.end + 1).with_place(temp)
    }

    /// args = (expression ("," expression)*)?
    fn args(&mut self, beg: usize, params: &[Symbol]) -> ParseResult {
        if self.peek(beg).is_grouping(')') {
            return ParseResult::empty(beg);
        }

        let mut index = beg;
        let mut position = 0;
        loop {
            let arg = self.expression(index);
            if arg.is_reject() {
                return arg;
            }
            if let Some(param) = params.get(position) {
                let token = self.peek(index).clone();
                self.analyzer
                    .check_type_agreement(self.ctx, param.ty(), arg.ty, &token);
            }
            self.ctx.codegen.write_argument(&arg.place);
            position += 1;

            if !self.peek(arg.end).is_grouping(',') {
                return ParseResult::accept(Type::None, beg, arg.end);
            }
            index = arg.end + 1;
        }
    }
}
