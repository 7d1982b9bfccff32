use std::fmt;

use crate::lexer::Operator;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Add,
    Sub,
    Mult,
    Div,
    Assign,
    Comp,
    Br,
    Bre,
    Brg,
    Brge,
    Brl,
    Brle,
    Brne,
    Alloc,
    Arg,
    Call,
    Param,
    Func,
    End,
    Return,
    Disp,
}

impl Opcode {
    /// Branch taken when the comparison `op` is false.
    pub fn negated_branch(op: Operator) -> Option<Opcode> {
        match op {
            Operator::Less => Some(Opcode::Brge),
            Operator::LessEqual => Some(Opcode::Brg),
            Operator::Greater => Some(Opcode::Brle),
            Operator::GreaterEqual => Some(Opcode::Brl),
            Operator::Equal => Some(Opcode::Brne),
            Operator::NotEqual => Some(Opcode::Bre),
            _ => None,
        }
    }

    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Opcode::Br
                | Opcode::Bre
                | Opcode::Brg
                | Opcode::Brge
                | Opcode::Brl
                | Opcode::Brle
                | Opcode::Brne
        )
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mult => "mult",
            Opcode::Div => "div",
            Opcode::Assign => "assign",
            Opcode::Comp => "comp",
            Opcode::Br => "br",
            Opcode::Bre => "bre",
            Opcode::Brg => "brg",
            Opcode::Brge => "brge",
            Opcode::Brl => "brl",
            Opcode::Brle => "brle",
            Opcode::Brne => "brne",
            Opcode::Alloc => "alloc",
            Opcode::Arg => "arg",
            Opcode::Call => "call",
            Opcode::Param => "param",
            Opcode::Func => "func",
            Opcode::End => "end",
            Opcode::Return => "return",
            Opcode::Disp => "disp",
        };
        // pad() so width specifiers apply
        f.pad(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quadruple {
    pub index: usize,
    pub opcode: Opcode,
    pub a: String,
    pub b: String,
    pub result: String,
}

impl fmt::Display for Quadruple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // every column is followed by at least one space
        let line = format!(
            "{:<5} {:<7} {:<11} {:<11} {}",
            self.index, self.opcode, self.a, self.b, self.result
        );
        write!(f, "{}", line.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negation_covers_relational_operators() {
        assert_eq!(Opcode::negated_branch(Operator::Less), Some(Opcode::Brge));
        assert_eq!(Opcode::negated_branch(Operator::NotEqual), Some(Opcode::Bre));
        assert_eq!(Opcode::negated_branch(Operator::Plus), None);
    }

    #[test]
    fn fixed_width_line() {
        let q = Quadruple {
            index: 3,
            opcode: Opcode::Add,
            a: "1".to_string(),
            b: "2".to_string(),
            result: "_t0".to_string(),
        };
        assert_eq!(q.to_string(), "3     add     1           2           _t0");
    }

    #[test]
    fn long_operands_stay_separated() {
        let q = Quadruple {
            index: 0,
            opcode: Opcode::Func,
            a: "computeaverage".to_string(),
            b: "int".to_string(),
            result: "0".to_string(),
        };
        let line = q.to_string();
        assert_eq!(line, "0     func    computeaverage int         0");
        let fields: Vec<_> = line.split_whitespace().collect();
        assert_eq!(fields, vec!["0", "func", "computeaverage", "int", "0"]);
    }

    #[test]
    fn empty_fields_are_trimmed() {
        let q = Quadruple {
            index: 10,
            opcode: Opcode::Return,
            a: String::new(),
            b: String::new(),
            result: String::new(),
        };
        assert_eq!(q.to_string(), "10    return");
    }
}
