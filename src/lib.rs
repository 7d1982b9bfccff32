pub mod analyzer;
pub mod codegen;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod lexer;
pub mod parser;

use codegen::Quadruple;
use config::CompileOptions;
use context::CompilationContext;
use diagnostics::{Diagnostic, SyntaxError};
use lexer::{Lexer, Token};
use parser::{Parser, Verdict};

/// Everything a compilation produced. The quadruples are kept even when the
/// syntax was rejected; they are then only the prefix emitted before the
/// failure.
#[derive(Debug)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub lexical_errors: Vec<Diagnostic>,
    pub syntax: Verdict,
    pub syntax_error: Option<SyntaxError>,
    pub semantics: Verdict,
    pub diagnostics: Vec<Diagnostic>,
    pub program: Vec<Quadruple>,
}

impl Compilation {
    pub fn had_lexical_errors(&self) -> bool {
        !self.lexical_errors.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.syntax == Verdict::Accept && self.semantics == Verdict::Accept
    }

    /// Lexical, syntax and semantic diagnostics in that order.
    pub fn all_diagnostics(&self) -> Vec<Diagnostic> {
        let mut all = self.lexical_errors.clone();
        all.extend(self.syntax_error.as_ref().map(SyntaxError::to_diagnostic));
        all.extend(self.diagnostics.iter().cloned());
        all
    }

    pub fn listing(&self) -> String {
        self.program.iter().map(|q| format!("{}\n", q)).collect()
    }
}

pub fn compile(source: &str) -> Compilation {
    compile_with(source, &CompileOptions::default())
}

#[tracing::instrument(skip_all, fields(lines = source.lines().count()))]
pub fn compile_with(source: &str, options: &CompileOptions) -> Compilation {
    let (tokens, lexical_errors) = Lexer::tokenize(source, options.lex);

    let mut ctx = CompilationContext::new();
    let parsed = Parser::new(&tokens, &options.entry_point, &mut ctx).parse();

    let (syntax, syntax_error) = match parsed {
        Ok(_) => (Verdict::Accept, None),
        Err(e) => (Verdict::Reject, Some(e)),
    };
    let semantics = if syntax == Verdict::Accept && !ctx.has_errors() && ctx.entry_seen() {
        Verdict::Accept
    } else {
        Verdict::Reject
    };
    tracing::debug!(?syntax, ?semantics, "compiled");

    let (codegen, diagnostics) = ctx.into_parts();
    Compilation {
        tokens,
        lexical_errors,
        syntax,
        syntax_error,
        semantics,
        diagnostics,
        program: codegen.into_quadruples(),
    }
}
