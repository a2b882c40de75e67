//! Limits checking for Tarn bytecode.

use crate::error::VerifyError;
use tarn_common::{Instruction, Op};

/// Default maximum bytecode size in instructions.
pub const MAX_BYTECODE_SIZE: usize = 65_536;

/// Default stash bank size, matching the VM's default frame.
pub const STASH_SLOTS: usize = 8;

/// Limits the bytecode is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_size: usize,
    pub stash_slots: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_size: MAX_BYTECODE_SIZE,
            stash_slots: STASH_SLOTS,
        }
    }
}

impl Limits {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_stash_slots(mut self, stash_slots: usize) -> Self {
        self.stash_slots = stash_slots;
        self
    }
}

/// Run the limits check.
pub fn check_limits(instrs: &[Instruction], limits: &Limits) -> Vec<VerifyError> {
    let mut errors = Vec::new();

    if instrs.len() > limits.max_size {
        errors.push(VerifyError::BytecodeTooLarge {
            size: instrs.len(),
            max: limits.max_size,
        });
    }

    for (i, instr) in instrs.iter().enumerate() {
        match instr.op {
            Op::Stash(slot) | Op::Unstash(slot) if slot >= limits.stash_slots => {
                errors.push(VerifyError::StashSlotOutOfRange {
                    at: i,
                    slot,
                    slots: limits.stash_slots,
                });
            }
            _ => {}
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instr(op: Op) -> Instruction {
        Instruction::new(op)
    }

    #[test]
    fn small_bytecode_passes() {
        let instrs = [instr(Op::push(1i64)), instr(Op::Stash(7)), instr(Op::Unstash(7))];
        assert!(check_limits(&instrs, &Limits::default()).is_empty());
    }

    #[test]
    fn stash_slot_too_high() {
        let instrs = [instr(Op::push(1i64)), instr(Op::Stash(8)), instr(Op::Unstash(2))];
        let errors = check_limits(&instrs, &Limits::default().with_stash_slots(2));
        assert_eq!(
            errors,
            vec![
                VerifyError::StashSlotOutOfRange {
                    at: 1,
                    slot: 8,
                    slots: 2
                },
                VerifyError::StashSlotOutOfRange {
                    at: 2,
                    slot: 2,
                    slots: 2
                },
            ]
        );
    }

    #[test]
    fn bytecode_too_large() {
        let instrs = vec![instr(Op::Nop); 4];
        let errors = check_limits(&instrs, &Limits::default().with_max_size(3));
        assert_eq!(errors, vec![VerifyError::BytecodeTooLarge { size: 4, max: 3 }]);
    }
}
