//! Context pairing: each `ENTER_CONTEXT` must be closed by the
//! `LEAVE_CONTEXT` its catch label marks, and no block may be left before
//! it is entered.

use crate::error::VerifyError;
use tarn_common::{Bytecode, Op};

/// Run the context pairing check.
///
/// Catch labels that do not resolve are left to the labels pass.
pub fn check_contexts(bytecode: &Bytecode) -> Vec<VerifyError> {
    let mut errors = Vec::new();
    let instrs = bytecode.instructions();
    let mut enters = 0usize;
    let mut leaves = 0usize;

    for (i, instr) in instrs.iter().enumerate() {
        match &instr.op {
            Op::EnterContext { catch, .. } => {
                enters += 1;
                let Some(target) = bytecode.label_index(catch) else {
                    continue;
                };
                if !matches!(instrs[target].op, Op::LeaveContext(_)) {
                    errors.push(VerifyError::CatchNotLeave {
                        at: i,
                        label: catch.clone(),
                    });
                } else if target <= i {
                    errors.push(VerifyError::CatchBeforeEnter {
                        at: i,
                        label: catch.clone(),
                    });
                }
            }
            Op::LeaveContext(_) => {
                leaves += 1;
                if leaves > enters {
                    errors.push(VerifyError::LeaveWithoutEnter { at: i });
                }
            }
            _ => {}
        }
    }

    if enters != leaves {
        errors.push(VerifyError::UnbalancedContexts { enters, leaves });
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::{Instruction, Name};

    fn enter(catch: &str) -> Instruction {
        Instruction::new(Op::EnterContext {
            var: Name::parse("h"),
            catch: catch.into(),
        })
    }

    fn leave() -> Instruction {
        Instruction::new(Op::LeaveContext(Name::empty()))
    }

    fn bytecode(instrs: Vec<Instruction>) -> Bytecode {
        Bytecode::new("t", instrs).unwrap()
    }

    #[test]
    fn nested_blocks_pass() {
        let b = bytecode(vec![
            enter("O"),
            enter("I"),
            Instruction::new(Op::Nop),
            leave().with_label("I"),
            leave().with_label("O"),
        ]);
        assert!(check_contexts(&b).is_empty());
    }

    #[test]
    fn catch_on_wrong_instruction() {
        let b = bytecode(vec![
            enter("H"),
            Instruction::new(Op::Nop).with_label("H"),
            leave(),
        ]);
        assert_eq!(
            check_contexts(&b),
            vec![VerifyError::CatchNotLeave {
                at: 0,
                label: "H".into()
            }]
        );
    }

    #[test]
    fn leave_before_enter() {
        let b = bytecode(vec![leave().with_label("H"), enter("H")]);
        let errors = check_contexts(&b);
        assert!(errors.contains(&VerifyError::LeaveWithoutEnter { at: 0 }));
        assert!(errors.contains(&VerifyError::CatchBeforeEnter {
            at: 1,
            label: "H".into()
        }));
    }

    #[test]
    fn missing_leave() {
        let b = bytecode(vec![enter("H"), Instruction::new(Op::Nop).with_label("H")]);
        let errors = check_contexts(&b);
        assert!(errors.contains(&VerifyError::UnbalancedContexts {
            enters: 1,
            leaves: 0
        }));
    }
}
