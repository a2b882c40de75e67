//! Reachability analysis for Tarn bytecode.
//!
//! Every instruction must be reachable from the entry point, either by
//! normal flow or by the catch edge of an enclosing `ENTER_CONTEXT`.
//! Branches to undefined labels contribute no edge.

use crate::error::VerifyError;
use tarn_common::{Bytecode, Op};

/// Run the reachability check.
pub fn check_reachability(bytecode: &Bytecode) -> Vec<VerifyError> {
    let len = bytecode.len();
    if len == 0 {
        return Vec::new();
    }

    let mut reachable = vec![false; len];
    let mut work = vec![0usize];
    while let Some(pc) = work.pop() {
        if pc >= len || reachable[pc] {
            continue;
        }
        reachable[pc] = true;
        work.extend(successors(bytecode, pc));
    }

    reachable
        .into_iter()
        .enumerate()
        .filter(|(_, is_reachable)| !is_reachable)
        .map(|(i, _)| VerifyError::UnreachableInstruction { at: i })
        .collect()
}

/// Instructions control may reach directly after `pc`.
fn successors(bytecode: &Bytecode, pc: usize) -> Vec<usize> {
    let Some(instr) = bytecode.get(pc) else {
        return Vec::new();
    };
    let target = instr
        .op
        .target_label()
        .and_then(|label| bytecode.label_index(label));
    match &instr.op {
        // Exception routing ends at a catch edge already recorded by the
        // block's ENTER_CONTEXT.
        Op::Throw | Op::Return => Vec::new(),
        Op::Jump(_) => target.into_iter().collect(),
        // Conditional branches, loop ends and context entry (its catch
        // edge) fall through as well.
        Op::Test(_) | Op::Next(_) | Op::EndLoop(_) | Op::EnterContext { .. } => {
            let mut next = vec![pc + 1];
            next.extend(target);
            next
        }
        _ => vec![pc + 1],
    }
}
