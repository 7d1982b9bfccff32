use std::fmt;

use phf::phf_map;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    Else,
    Float,
    If,
    Int,
    Return,
    Void,
    While,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    Plus,
    Minus,
    Star,
    Slash,
    Less,
    Greater,
    Assign,
}

impl Operator {
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Operator::LessEqual
                | Operator::GreaterEqual
                | Operator::Equal
                | Operator::NotEqual
                | Operator::Less
                | Operator::Greater
        )
    }

    pub fn is_additive(&self) -> bool {
        matches!(self, Operator::Plus | Operator::Minus)
    }

    pub fn is_multiplicative(&self) -> bool {
        matches!(self, Operator::Star | Operator::Slash)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nest {
    Brace,
    Bracket,
    Paren,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Grouping {
    Open(Nest),
    Close(Nest),
    Separator,
}

pub(crate) static KEYWORDS: phf::Map<&str, Keyword> = phf_map! {
    "else" => Keyword::Else,
    "float" => Keyword::Float,
    "if" => Keyword::If,
    "int" => Keyword::Int,
    "return" => Keyword::Return,
    "void" => Keyword::Void,
    "while" => Keyword::While,
};

pub(crate) static GROUPINGS: phf::Map<char, Grouping> = phf_map! {
    '(' => Grouping::Open(Nest::Paren),
    ')' => Grouping::Close(Nest::Paren),
    '[' => Grouping::Open(Nest::Bracket),
    ']' => Grouping::Close(Nest::Bracket),
    '{' => Grouping::Open(Nest::Brace),
    '}' => Grouping::Close(Nest::Brace),
    ',' => Grouping::Separator,
    ';' => Grouping::Separator,
};

pub(crate) static TWO_SYMBOL_OPERATORS: phf::Map<&str, Operator> = phf_map! {
    "<=" => Operator::LessEqual,
    ">=" => Operator::GreaterEqual,
    "==" => Operator::Equal,
    "!=" => Operator::NotEqual,
};

pub(crate) static ONE_SYMBOL_OPERATORS: phf::Map<char, Operator> = phf_map! {
    '+' => Operator::Plus,
    '-' => Operator::Minus,
    '*' => Operator::Star,
    '/' => Operator::Slash,
    '<' => Operator::Less,
    '>' => Operator::Greater,
    '=' => Operator::Assign,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Grouping,
    Keyword,
    Identifier,
    /// Numeric literal before it is refined into `Integer` or `Float`.
    Number,
    Integer,
    Float,
    Operator,
    Whitespace,
    Error,
    /// Marker appended by the parser after the last real token.
    EndOfInput,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Comment => "comment",
            TokenKind::Grouping => "grouping",
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
            TokenKind::Number => "number",
            TokenKind::Integer => "integer",
            TokenKind::Float => "float",
            TokenKind::Operator => "operator",
            TokenKind::Whitespace => "whitespace",
            TokenKind::Error => "error",
            TokenKind::EndOfInput => "end",
        };
        write!(f, "{}", name)
    }
}

/// Running nesting counts. The lexer owns one set for a whole compilation so
/// that nesting carries over from line to line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepthCounters {
    pub brace: i32,
    pub bracket: i32,
    pub paren: i32,
    pub comment: i32,
}

impl DepthCounters {
    pub(crate) fn apply(&mut self, grouping: Grouping) {
        let (nest, step) = match grouping {
            Grouping::Open(nest) => (nest, 1),
            Grouping::Close(nest) => (nest, -1),
            Grouping::Separator => return,
        };
        match nest {
            Nest::Brace => self.brace += step,
            Nest::Bracket => self.bracket += step,
            Nest::Paren => self.paren += step,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub line: usize,
    pub brace_depth: i32,
    pub bracket_depth: i32,
    pub paren_depth: i32,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        line: usize,
        depth: DepthCounters,
    ) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            brace_depth: depth.brace,
            bracket_depth: depth.bracket,
            paren_depth: depth.paren,
        }
    }

    pub fn end_of_input(line: usize) -> Self {
        Self::new(TokenKind::EndOfInput, "$", line, DepthCounters::default())
    }

    pub fn is_grouping(&self, c: char) -> bool {
        self.kind == TokenKind::Grouping && self.lexeme.len() == 1 && self.lexeme.starts_with(c)
    }

    pub fn grouping(&self) -> Option<Grouping> {
        if self.kind != TokenKind::Grouping {
            return None;
        }
        self.lexeme.chars().next().and_then(|c| GROUPINGS.get(&c).copied())
    }

    pub fn keyword(&self) -> Option<Keyword> {
        if self.kind != TokenKind::Keyword {
            return None;
        }
        KEYWORDS.get(self.lexeme.as_str()).copied()
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.keyword() == Some(keyword)
    }

    pub fn operator(&self) -> Option<Operator> {
        if self.kind != TokenKind::Operator {
            return None;
        }
        if let Some(op) = TWO_SYMBOL_OPERATORS.get(self.lexeme.as_str()) {
            return Some(*op);
        }
        let mut chars = self.lexeme.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => ONE_SYMBOL_OPERATORS.get(&c).copied(),
            _ => None,
        }
    }

    pub fn is_operator(&self, op: Operator) -> bool {
        self.operator() == Some(op)
    }

    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::EndOfInput
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<5} {:<11} {}", self.line, self.kind, self.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_lookup() {
        let t = Token::new(TokenKind::Operator, "<=", 1, DepthCounters::default());
        assert_eq!(t.operator(), Some(Operator::LessEqual));
        assert!(t.operator().is_some_and(|op| op.is_relational()));

        let t = Token::new(TokenKind::Operator, "=", 1, DepthCounters::default());
        assert!(t.is_operator(Operator::Assign));
    }

    #[test]
    fn keyword_requires_keyword_kind() {
        let t = Token::new(TokenKind::Identifier, "int", 1, DepthCounters::default());
        assert_eq!(t.keyword(), None);
    }

    #[test]
    fn depth_counters_track_nesting() {
        let mut depth = DepthCounters::default();
        depth.apply(Grouping::Open(Nest::Paren));
        depth.apply(Grouping::Open(Nest::Bracket));
        depth.apply(Grouping::Separator);
        depth.apply(Grouping::Close(Nest::Bracket));
        assert_eq!(depth.paren, 1);
        assert_eq!(depth.bracket, 0);
    }
}
