//! Label pre-pass: name → instruction index, built before execution so
//! forward jumps resolve.

use std::collections::HashMap;

use ippcode_core::{Instruction, OpCode, Operand};
use tracing::debug;

use crate::vm::VmError;

#[derive(Debug, Default, Clone)]
pub struct LabelTable {
    targets: HashMap<String, usize>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan every `LABEL` instruction once, in program order.
    pub fn build(instructions: &[Instruction]) -> Result<Self, VmError> {
        let mut table = Self::new();
        for (index, instr) in instructions.iter().enumerate() {
            if instr.opcode != OpCode::Label {
                continue;
            }
            let name = match instr.args.as_slice() {
                [Operand::Label(name)] => name,
                _ => return Err(VmError::bad_operands(instr)),
            };
            if table.targets.insert(name.clone(), index).is_some() {
                return Err(VmError::DuplicateLabel(name.clone()));
            }
        }
        debug!(labels = table.targets.len(), "label table built");
        Ok(table)
    }

    pub fn resolve(&self, name: &str) -> Result<usize, VmError> {
        self.targets
            .get(name)
            .copied()
            .ok_or_else(|| VmError::UndefinedLabel(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ippcode_core::Program;

    fn label(name: &str) -> (OpCode, Vec<Operand>) {
        (OpCode::Label, vec![Operand::Label(name.into())])
    }

    #[test]
    fn records_indices() {
        let program = Program::from_instructions(vec![
            (OpCode::Break, vec![]),
            label("a"),
            (OpCode::Break, vec![]),
            label("b"),
        ]);
        let table = LabelTable::build(&program.instructions).unwrap();
        assert_eq!(table.resolve("a").unwrap(), 1);
        assert_eq!(table.resolve("b").unwrap(), 3);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn duplicate_label_is_fatal() {
        let program = Program::from_instructions(vec![label("a"), label("a")]);
        let err = LabelTable::build(&program.instructions).unwrap_err();
        assert!(matches!(err, VmError::DuplicateLabel(ref n) if n == "a"));
        assert_eq!(err.exit_code(), 52);
    }

    #[test]
    fn unknown_label() {
        let table = LabelTable::new();
        assert!(matches!(table.resolve("x"), Err(VmError::UndefinedLabel(_))));
    }

    #[test]
    fn malformed_label_instruction() {
        let program = Program::from_instructions(vec![(OpCode::Label, vec![])]);
        let err = LabelTable::build(&program.instructions).unwrap_err();
        assert_eq!(err.exit_code(), 52);
    }
}
