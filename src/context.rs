use crate::codegen::CodeGenerator;
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Everything one compilation mutates. A fresh context per compilation keeps
/// runs independent of each other.
#[derive(Debug, Default)]
pub struct CompilationContext {
    pub codegen: CodeGenerator,
    diagnostics: Vec<Diagnostic>,
    entry_seen: bool,
}

impl CompilationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        tracing::debug!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::Semantic)
    }

    pub fn entry_seen(&self) -> bool {
        self.entry_seen
    }

    /// Records the entry point, returning `false` if one was already seen.
    pub fn mark_entry_seen(&mut self) -> bool {
        !std::mem::replace(&mut self.entry_seen, true)
    }

    pub fn into_parts(self) -> (CodeGenerator, Vec<Diagnostic>) {
        (self.codegen, self.diagnostics)
    }
}
