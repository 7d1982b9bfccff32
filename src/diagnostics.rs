use std::fmt;

use thiserror::Error;

use crate::analyzer::Type;
use crate::lexer::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
    Lexical,
    Syntax,
    Semantic,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Lexical => write!(f, "lexical"),
            DiagnosticKind::Syntax => write!(f, "syntax"),
            DiagnosticKind::Semantic => write!(f, "semantic"),
        }
    }
}

/// Why a semantic check failed. Attached to every semantic diagnostic so the
/// individual failures survive until the end of the compilation.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("`{0}` is already declared in this scope")]
    Duplicate(String),
    #[error("`{0}` is not declared")]
    Undeclared(String),
    #[error("`{0}` cannot be declared void")]
    VoidVariable(String),
    #[error("type mismatch between {expected} and {found}")]
    TypeMismatch { expected: Type, found: Type },
    #[error("`{name}` takes {expected} argument(s) but {found} were given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("function `{0}` must return a value")]
    MissingReturn(String),
    #[error("void function `{0}` cannot return a value")]
    ReturnValueInVoid(String),
    #[error("entry point `{0}` must be a global void function without parameters")]
    InvalidEntryPoint(String),
    #[error("entry point `{0}` is declared more than once")]
    DuplicateEntryPoint(String),
    #[error("no entry point `{0}` was declared")]
    MissingEntryPoint(String),
    #[error("`{0}` is not a function")]
    NotAFunction(String),
    #[error("`{0}` is not an array")]
    NotAnArray(String),
    #[error("function `{0}` cannot be used as a variable")]
    FunctionAsVariable(String),
    #[error("array index must be int, found {0}")]
    NonIntegerIndex(Type),
    #[error("array `{0}` is too large")]
    ArrayTooLarge(String),
}

/// A single reported problem, rendered as
/// `*ERROR*: <kind> error on token "<lexeme>", line <n>.`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub lexeme: String,
    pub line: usize,
    pub reason: Option<SemanticError>,
}

impl Diagnostic {
    pub fn lexical(lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DiagnosticKind::Lexical,
            lexeme: lexeme.into(),
            line,
            reason: None,
        }
    }

    pub fn syntax(lexeme: impl Into<String>, line: usize) -> Self {
        Self {
            kind: DiagnosticKind::Syntax,
            lexeme: lexeme.into(),
            line,
            reason: None,
        }
    }

    pub fn semantic(token: &Token, reason: SemanticError) -> Self {
        Self {
            kind: DiagnosticKind::Semantic,
            lexeme: token.lexeme.clone(),
            line: token.line,
            reason: Some(reason),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "*ERROR*: {} error on token \"{}\", line {}.",
            self.kind, self.lexeme, self.line
        )?;
        if let Some(reason) = &self.reason {
            write!(f, " {}", reason)?;
        }
        Ok(())
    }
}

/// Terminal parse failure naming the first token no production could accept.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("syntax error on token \"{lexeme}\", line {line}")]
pub struct SyntaxError {
    pub lexeme: String,
    pub line: usize,
}

impl SyntaxError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::syntax(self.lexeme.clone(), self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_diagnostic_format() {
        let d = Diagnostic::lexical("$", 3);
        assert_eq!(d.to_string(), "*ERROR*: lexical error on token \"$\", line 3.");
    }

    #[test]
    fn semantic_diagnostic_appends_reason() {
        let d = Diagnostic {
            kind: DiagnosticKind::Semantic,
            lexeme: "x".to_string(),
            line: 1,
            reason: Some(SemanticError::Duplicate("x".to_string())),
        };
        assert_eq!(
            d.to_string(),
            "*ERROR*: semantic error on token \"x\", line 1. `x` is already declared in this scope"
        );
    }

    #[test]
    fn syntax_error_converts() {
        let e = SyntaxError {
            lexeme: "}".to_string(),
            line: 7,
        };
        assert_eq!(
            e.to_diagnostic().to_string(),
            "*ERROR*: syntax error on token \"}\", line 7."
        );
    }
}
