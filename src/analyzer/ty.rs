use std::fmt;

use crate::lexer::Keyword;

/// Inferred type of a declaration or expression. `None` marks an expression
/// whose type could not be determined (e.g. an undeclared name).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Float,
    Void,
    None,
}

impl Type {
    pub fn from_keyword(keyword: Keyword) -> Option<Type> {
        match keyword {
            Keyword::Int => Some(Type::Int),
            Keyword::Float => Some(Type::Float),
            Keyword::Void => Some(Type::Void),
            _ => None,
        }
    }

    pub fn agrees_with(&self, other: &Self) -> bool {
        self == other
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Void => write!(f, "void"),
            Type::None => write!(f, "none"),
        }
    }
}
