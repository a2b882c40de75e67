//! Tarn verifier: static checks for bytecode before execution.
//!
//! The verifier checks a [`Bytecode`] for faults the VM would otherwise only
//! report while running: unknown labels, stash slots past the bank, context
//! blocks that do not close where their catch label says. It collects ALL
//! errors (not just the first) and returns them.
//!
//! # Usage
//!
//! ```
//! use tarn_common::{Bytecode, Op};
//! use tarn_verifier::verify;
//!
//! let mut b = Bytecode::builder("main");
//! b.push(Op::push(42i64)).push(Op::Return);
//! let bytecode = b.finish().unwrap();
//!
//! assert!(verify(&bytecode).is_ok());
//! ```
//!
//! # Passes
//!
//! 1. **Limits**: bytecode size, stash slot indices
//! 2. **Labels**: every branch target resolves
//! 3. **Contexts**: catch labels mark the closing `LEAVE_CONTEXT`; enters and leaves pair up
//! 4. **Reachability**: dead code detection, following catch edges

pub mod contexts;
pub mod error;
pub mod labels;
pub mod limits;
pub mod reachability;

pub use error::VerifyError;
pub use limits::Limits;

use tarn_common::Bytecode;

/// Verify bytecode against the default [`Limits`].
///
/// Returns `Ok(())` if the bytecode passes all checks, or
/// `Err(Vec<VerifyError>)` with all errors found.
pub fn verify(bytecode: &Bytecode) -> Result<(), Vec<VerifyError>> {
    verify_with(bytecode, &Limits::default())
}

/// Verify bytecode against explicit limits.
///
/// If any branch target is undefined, the reachability pass is skipped: the
/// control flow graph would be incomplete.
pub fn verify_with(bytecode: &Bytecode, limits: &Limits) -> Result<(), Vec<VerifyError>> {
    let mut all_errors = Vec::new();

    // Pass 1: Limits (independent)
    all_errors.extend(limits::check_limits(bytecode.instructions(), limits));

    // Pass 2: Labels
    let label_errors = labels::check_labels(bytecode);
    let labels_ok = label_errors.is_empty();
    all_errors.extend(label_errors);

    // Pass 3: Contexts
    all_errors.extend(contexts::check_contexts(bytecode));

    // Pass 4: Reachability
    if labels_ok {
        all_errors.extend(reachability::check_reachability(bytecode));
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tarn_common::{Instruction, Name, Op};

    fn instr(op: Op) -> Instruction {
        Instruction::new(op)
    }

    fn bytecode(instrs: Vec<Instruction>) -> Bytecode {
        Bytecode::new("test", instrs).unwrap()
    }

    #[test]
    fn empty_bytecode_is_valid() {
        assert!(verify(&bytecode(vec![])).is_ok());
    }

    #[test]
    fn multiple_errors_collected() {
        let b = bytecode(vec![
            instr(Op::push(1i64)),
            instr(Op::Stash(12)),
            instr(Op::Jump("nowhere".into())),
        ]);
        let errors = verify(&b).unwrap_err();
        assert!(errors.len() >= 2, "expected multiple errors, got: {errors:?}");
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::StashSlotOutOfRange { slot: 12, .. })));
        assert!(errors
            .iter()
            .any(|e| matches!(e, VerifyError::UndefinedLabel { .. })));
    }

    #[test]
    fn undefined_label_skips_reachability() {
        let b = bytecode(vec![instr(Op::Jump("nowhere".into())), instr(Op::Nop)]);
        let errors = verify(&b).unwrap_err();
        assert!(!errors
            .iter()
            .any(|e| matches!(e, VerifyError::UnreachableInstruction { .. })));
    }

    #[test]
    fn custom_stash_bank() {
        let b = bytecode(vec![instr(Op::push(1i64)), instr(Op::Stash(10))]);
        assert!(verify(&b).is_err());
        assert!(verify_with(&b, &Limits::default().with_stash_slots(16)).is_ok());
    }

    #[test]
    fn try_block_valid() {
        let b = bytecode(vec![
            instr(Op::EnterContext {
                var: Name::parse("h"),
                catch: "H".into(),
            }),
            instr(Op::var("risky")),
            instr(Op::Pop),
            instr(Op::LeaveContext(Name::empty())).with_label("H"),
        ]);
        assert!(verify(&b).is_ok());
    }
}
