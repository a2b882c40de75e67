//! Opcode identifiers for the Tarn instruction set.

/// Identifies the operation an [`Op`](crate::Op) performs, without its
/// operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Values and variables
    /// Push a constant.
    PushVal,
    /// Resolve a path against the scope and push the result.
    PushVar,
    /// Pop a receiver, resolve a path against it, push the result.
    Deref,
    /// Pop a value and assign it to a path in the scope.
    Assign,

    // Stack shuffles
    Dup,
    Pop,
    Swap,
    /// Move top of stack into a stash slot.
    Stash,
    /// Copy a stash slot onto the stack.
    Unstash,

    // Control flow
    Jump,
    /// Pop, cast to bool, jump when false.
    Test,
    Iter,
    /// Advance an iterator, jump when exhausted.
    Next,
    /// Loop back-edge. Consumes break/continue status.
    EndLoop,
    /// Set break/continue status.
    VmStatus,

    // Calls and contexts
    FunctionCall,
    EnterContext,
    LeaveContext,
    Throw,
    Return,
    Yield,

    // Misc
    /// Pop subscript and receiver, push `receiver[subscript]`.
    Subscript,
    PushScope,
    /// Push the handler of the innermost context.
    PushCtx,
    Incr,
    Decr,
    Nop,
}

/// All opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 27] = [
    Opcode::PushVal,
    Opcode::PushVar,
    Opcode::Deref,
    Opcode::Assign,
    Opcode::Dup,
    Opcode::Pop,
    Opcode::Swap,
    Opcode::Stash,
    Opcode::Unstash,
    Opcode::Jump,
    Opcode::Test,
    Opcode::Iter,
    Opcode::Next,
    Opcode::EndLoop,
    Opcode::VmStatus,
    Opcode::FunctionCall,
    Opcode::EnterContext,
    Opcode::LeaveContext,
    Opcode::Throw,
    Opcode::Return,
    Opcode::Yield,
    Opcode::Subscript,
    Opcode::PushScope,
    Opcode::PushCtx,
    Opcode::Incr,
    Opcode::Decr,
    Opcode::Nop,
];

impl Opcode {
    /// Returns the listing mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::PushVal => "PUSH_VAL",
            Opcode::PushVar => "PUSH_VAR",
            Opcode::Deref => "DEREF",
            Opcode::Assign => "ASSIGN",
            Opcode::Dup => "DUP",
            Opcode::Pop => "POP",
            Opcode::Swap => "SWAP",
            Opcode::Stash => "STASH",
            Opcode::Unstash => "UNSTASH",
            Opcode::Jump => "JUMP",
            Opcode::Test => "TEST",
            Opcode::Iter => "ITER",
            Opcode::Next => "NEXT",
            Opcode::EndLoop => "END_LOOP",
            Opcode::VmStatus => "VM_STATUS",
            Opcode::FunctionCall => "FUNCTION_CALL",
            Opcode::EnterContext => "ENTER_CONTEXT",
            Opcode::LeaveContext => "LEAVE_CONTEXT",
            Opcode::Throw => "THROW",
            Opcode::Return => "RETURN",
            Opcode::Yield => "YIELD",
            Opcode::Subscript => "SUBSCRIPT",
            Opcode::PushScope => "PUSH_SCOPE",
            Opcode::PushCtx => "PUSH_CTX",
            Opcode::Incr => "INCR",
            Opcode::Decr => "DECR",
            Opcode::Nop => "NOP",
        }
    }

    /// Look up an opcode by its mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .copied()
            .find(|op| op.mnemonic() == mnemonic)
    }

    /// Opcodes that may transfer control to a label.
    pub fn is_branch(&self) -> bool {
        matches!(
            self,
            Opcode::Jump | Opcode::Test | Opcode::Next | Opcode::EndLoop | Opcode::EnterContext
        )
    }

    /// Opcodes the dispatcher still executes while break/continue status is
    /// set.
    pub fn runs_during_loop_exit(&self) -> bool {
        matches!(self, Opcode::EndLoop | Opcode::LeaveContext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 27);
    }

    #[test]
    fn mnemonics_are_unique_and_uppercase() {
        let mut seen = std::collections::HashSet::new();
        for &opcode in &ALL_OPCODES {
            let m = opcode.mnemonic();
            assert!(!m.is_empty(), "empty mnemonic for {opcode:?}");
            assert_eq!(m, m.to_uppercase(), "mnemonic should be uppercase: {m}");
            assert!(seen.insert(m), "duplicate mnemonic {m}");
        }
    }

    #[test]
    fn mnemonic_lookup() {
        for &opcode in &ALL_OPCODES {
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
        assert_eq!(Opcode::from_mnemonic("HALT"), None);
    }

    #[test]
    fn branch_opcodes() {
        let branches: Vec<_> = ALL_OPCODES.iter().filter(|o| o.is_branch()).collect();
        assert_eq!(branches.len(), 5);
        assert!(!Opcode::FunctionCall.is_branch());
    }

    #[test]
    fn loop_exit_opcodes() {
        assert!(Opcode::EndLoop.runs_during_loop_exit());
        assert!(Opcode::LeaveContext.runs_during_loop_exit());
        assert!(!Opcode::Jump.runs_during_loop_exit());
    }
}
