use crate::analyzer::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// The production matched without consuming anything.
    Empty,
}

/// What every grammar production hands back to its caller.
///
/// On rejection `end` is the index of the token that could not be matched.
/// `place` names where an expression's value lives: a literal, a variable
/// or a temporary.
#[derive(Clone, Debug, PartialEq)]
pub struct ParseResult {
    pub ty: Type,
    pub verdict: Verdict,
    pub beg: usize,
    pub end: usize,
    pub place: String,
}

impl ParseResult {
    pub fn accept(ty: Type, beg: usize, end: usize) -> Self {
        Self {
            ty,
            verdict: Verdict::Accept,
            beg,
            end,
            place: String::new(),
        }
    }

    pub fn reject(beg: usize, end: usize) -> Self {
        Self {
            ty: Type::None,
            verdict: Verdict::Reject,
            beg,
            end,
            place: String::new(),
        }
    }

    pub fn empty(beg: usize) -> Self {
        Self {
            ty: Type::None,
            verdict: Verdict::Empty,
            beg,
            end: beg,
            place: String::new(),
        }
    }

    pub fn with_place(mut self, place: impl Into<String>) -> Self {
        self.place = place.into();
        self
    }

    pub fn is_accept(&self) -> bool {
        self.verdict == Verdict::Accept
    }

    pub fn is_reject(&self) -> bool {
        self.verdict == Verdict::Reject
    }
}
