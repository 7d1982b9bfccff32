use tracing::debug;

use crate::analyzer::Type;
use crate::lexer::Operator;

use super::{Opcode, Quadruple};

pub const TEMP_PREFIX: &str = "_t";
/// Result field of a branch whose target is not known yet.
pub const PLACEHOLDER: &str = "?";

const WORD_SIZE: usize = 4;

/// When the temporary counter moves relative to reading it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fix {
    /// read, then move
    Post,
    /// move, then read
    Pre,
    /// read only
    Fixed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

#[derive(Debug, Default)]
pub struct CodeGenerator {
    quadruples: Vec<Quadruple>,
    next_index: usize,
    next_temp: i64,
    within_condition: bool,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn quadruples(&self) -> &[Quadruple] {
        &self.quadruples
    }

    pub fn into_quadruples(self) -> Vec<Quadruple> {
        self.quadruples
    }

    fn temp_name(&self) -> String {
        format!("{}{}", TEMP_PREFIX, self.next_temp)
    }

    /// Names the temporary under the counter, moving the counter one step in
    /// `direction` before (`Pre`) or after (`Post`) reading it.
    pub fn get_temp_var(&mut self, fix: Fix, direction: Direction) -> String {
        let step = match direction {
            Direction::Forward => 1,
            Direction::Backward => -1,
        };
        match fix {
            Fix::Post => {
                let name = self.temp_name();
                self.next_temp += step;
                name
            }
            Fix::Pre => {
                self.next_temp += step;
                self.temp_name()
            }
            Fix::Fixed => self.temp_name(),
        }
    }

    /// A temporary no one else holds.
    pub fn reserve_temp(&mut self) -> String {
        self.get_temp_var(Fix::Post, Direction::Forward)
    }

    /// The temporary the next `reserve_temp` will hand out.
    pub fn current_temp(&mut self) -> String {
        self.get_temp_var(Fix::Fixed, Direction::Forward)
    }

    /// Marks the start of a control-statement condition: the next comparison
    /// is followed by a placeholder branch.
    pub fn enter_condition(&mut self) {
        self.within_condition = true;
    }

    pub fn leave_condition(&mut self) {
        self.within_condition = false;
    }

    /// Clears the condition flag, returning whether it was set.
    pub fn take_condition(&mut self) -> bool {
        std::mem::take(&mut self.within_condition)
    }

    fn write(&mut self, opcode: Opcode, a: &str, b: &str, result: &str) {
        self.quadruples.push(Quadruple {
            index: self.next_index,
            opcode,
            a: a.to_string(),
            b: b.to_string(),
            result: result.to_string(),
        });
        self.next_index += 1;
    }

    pub fn write_add_or_sub(&mut self, op: Operator, a: &str, b: &str, result: &str) {
        let opcode = if op == Operator::Minus {
            Opcode::Sub
        } else {
            Opcode::Add
        };
        self.write(opcode, a, b, result);
    }

    pub fn write_mult_or_div(&mut self, op: Operator, a: &str, b: &str, result: &str) {
        let opcode = if op == Operator::Slash {
            Opcode::Div
        } else {
            Opcode::Mult
        };
        self.write(opcode, a, b, result);
    }

    pub fn write_comparison(&mut self, a: &str, b: &str, result: &str) {
        self.write(Opcode::Comp, a, b, result);
    }

    pub fn write_assignment(&mut self, value: &str, target: &str) {
        self.write(Opcode::Assign, value, "", target);
    }

    pub fn write_argument(&mut self, value: &str) {
        self.write(Opcode::Arg, "", "", value);
    }

    pub fn write_function_call(&mut self, name: &str, argc: usize, result: &str) {
        self.write(Opcode::Call, name, &argc.to_string(), result);
    }

    pub fn write_function_start(&mut self, name: &str, ty: Type, paramc: usize) {
        self.write(Opcode::Func, name, &ty.to_string(), &paramc.to_string());
    }

    pub fn write_function_stop(&mut self, name: &str) {
        self.write(Opcode::End, "func", name, "");
    }

    pub fn write_parameter(&mut self, name: &str) {
        self.write(Opcode::Param, "", "", name);
    }

    pub fn write_return(&mut self, value: Option<&str>) {
        self.write(Opcode::Return, "", "", value.unwrap_or(""));
    }

    /// Emits nothing and returns `false` when the byte size overflows.
    pub fn write_array_alloc(&mut self, name: &str, size: usize) -> bool {
        let Some(bytes) = size.checked_mul(WORD_SIZE) else {
            return false;
        };
        self.write(Opcode::Alloc, &bytes.to_string(), "", name);
        true
    }

    pub fn write_variable_alloc(&mut self, name: &str) {
        self.write(Opcode::Alloc, &WORD_SIZE.to_string(), "", name);
    }

    /// `offset = index * 4; address = array + offset`
    pub fn write_displacement(&mut self, array: &str, index: &str, offset: &str, address: &str) {
        self.write(Opcode::Mult, index, &WORD_SIZE.to_string(), offset);
        self.write(Opcode::Disp, array, offset, address);
    }

    /// Branch around the guarded statement when comparison `op` fails. The
    /// target stays a placeholder until `backpatch`.
    pub fn write_conditional_branch(&mut self, op: Operator, condition: &str) {
        let opcode = Opcode::negated_branch(op).unwrap_or(Opcode::Bre);
        self.write(opcode, condition, "", PLACEHOLDER);
    }

    pub fn write_unconditional_branch(&mut self, target: &str) {
        self.write(Opcode::Br, "", "", target);
    }

    /// Points the most recently emitted placeholder at `target`. Returns the
    /// index of the patched quadruple.
    pub fn backpatch(&mut self, target: usize) -> Option<usize> {
        let slot = self
            .quadruples
            .iter_mut()
            .rev()
            .find(|q| q.result == PLACEHOLDER);
        match slot {
            Some(q) => {
                q.result = target.to_string();
                debug!(index = q.index, target, "backpatched branch");
                Some(q.index)
            }
            None => {
                debug!(target, "no placeholder to backpatch");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_protocol() {
        let mut g = CodeGenerator::new();
        assert_eq!(g.current_temp(), "_t0");
        assert_eq!(g.reserve_temp(), "_t0");
        assert_eq!(g.reserve_temp(), "_t1");
        assert_eq!(g.current_temp(), "_t2");
        // step back onto the last reserved temporary
        assert_eq!(g.get_temp_var(Fix::Pre, Direction::Backward), "_t1");
        assert_eq!(g.get_temp_var(Fix::Pre, Direction::Forward), "_t2");
        assert_eq!(g.get_temp_var(Fix::Post, Direction::Backward), "_t2");
        assert_eq!(g.current_temp(), "_t1");
    }

    #[test]
    fn indices_are_contiguous() {
        let mut g = CodeGenerator::new();
        g.write_variable_alloc("x");
        g.write_displacement("a", "i", "_t0", "_t1");
        g.write_return(None);
        let indices: Vec<_> = g.quadruples().iter().map(|q| q.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(g.next_index(), 4);
    }

    #[test]
    fn displacement_scales_index() {
        let mut g = CodeGenerator::new();
        g.write_displacement("a", "3", "_t0", "_t1");
        let q = g.quadruples();
        assert_eq!((q[0].opcode, q[0].a.as_str(), q[0].b.as_str()), (Opcode::Mult, "3", "4"));
        assert_eq!((q[1].opcode, q[1].a.as_str(), q[1].b.as_str()), (Opcode::Disp, "a", "_t0"));
        assert_eq!(q[1].result, "_t1");
    }

    #[test]
    fn array_alloc_is_word_sized() {
        let mut g = CodeGenerator::new();
        assert!(g.write_array_alloc("a", 10));
        assert_eq!(g.quadruples()[0].a, "40");
    }

    #[test]
    fn oversized_array_alloc_is_refused() {
        let mut g = CodeGenerator::new();
        assert!(!g.write_array_alloc("a", usize::MAX / 2));
        assert!(g.quadruples().is_empty());
        assert_eq!(g.next_index(), 0);
    }

    #[test]
    fn backpatch_targets_nearest_placeholder() {
        let mut g = CodeGenerator::new();
        g.write_comparison("x", "1", "_t0");
        g.write_conditional_branch(Operator::Less, "_t0");
        g.write_comparison("y", "2", "_t1");
        g.write_conditional_branch(Operator::Equal, "_t1");
        assert_eq!(g.backpatch(7), Some(3));
        assert_eq!(g.quadruples()[3].result, "7");
        assert_eq!(g.quadruples()[3].opcode, Opcode::Brne);
        assert_eq!(g.backpatch(9), Some(1));
        assert_eq!(g.quadruples()[1].opcode, Opcode::Brge);
        assert_eq!(g.backpatch(11), None);
    }

    #[test]
    fn condition_flag_is_taken_once() {
        let mut g = CodeGenerator::new();
        g.enter_condition();
        assert!(g.take_condition());
        assert!(!g.take_condition());
        g.enter_condition();
        g.leave_condition();
        assert!(!g.take_condition());
    }

    #[test]
    fn function_bracket_lines() {
        let mut g = CodeGenerator::new();
        g.write_function_start("main", Type::Void, 0);
        g.write_function_stop("main");
        let lines: Vec<_> = g.quadruples().iter().map(|q| q.to_string()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("0     func    main        void        0"));
        assert!(lines[1].starts_with("1     end     func        main"));
    }
}
