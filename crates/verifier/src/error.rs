//! Verification errors for the Tarn verifier.
//!
//! Every error that concerns a single instruction carries its index (`at`).
//! The verifier collects ALL errors, not just the first.

use thiserror::Error;

/// Errors found during static verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Limits ---
    /// Bytecode exceeds the configured size.
    #[error("bytecode too large: {size} instructions (max {max})")]
    BytecodeTooLarge { size: usize, max: usize },

    /// `STASH`/`UNSTASH` names a slot the frame will not have.
    #[error("stash slot {slot} out of range ({slots} slots) at instruction {at}")]
    StashSlotOutOfRange { at: usize, slot: usize, slots: usize },

    // --- Labels ---
    /// A branch names a label no instruction carries.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: usize, label: String },

    // --- Contexts ---
    /// The catch label of an `ENTER_CONTEXT` is not on a `LEAVE_CONTEXT`.
    #[error("catch label '{label}' of ENTER_CONTEXT at instruction {at} does not mark a LEAVE_CONTEXT")]
    CatchNotLeave { at: usize, label: String },

    /// The catch label of an `ENTER_CONTEXT` precedes it.
    #[error("catch label '{label}' of ENTER_CONTEXT at instruction {at} comes before the block")]
    CatchBeforeEnter { at: usize, label: String },

    /// `LEAVE_CONTEXT` with no open block before it.
    #[error("LEAVE_CONTEXT without ENTER_CONTEXT at instruction {at}")]
    LeaveWithoutEnter { at: usize },

    /// Enter and leave counts differ.
    #[error("unbalanced contexts: {enters} ENTER_CONTEXT, {leaves} LEAVE_CONTEXT")]
    UnbalancedContexts { enters: usize, leaves: usize },

    // --- Reachability ---
    /// Instruction is reachable neither by normal flow nor by a catch edge.
    #[error("unreachable instruction at {at}")]
    UnreachableInstruction { at: usize },
}
