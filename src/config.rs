use crate::lexer::LexOptions;

pub const DEFAULT_ENTRY_POINT: &str = "main";

/// Knobs for one compilation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompileOptions {
    pub lex: LexOptions,
    /// Name of the function the program starts in.
    pub entry_point: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            lex: LexOptions::default(),
            entry_point: DEFAULT_ENTRY_POINT.to_string(),
        }
    }
}
