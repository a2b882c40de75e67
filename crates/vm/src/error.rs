//! Engine faults for the Tarn VM.
//!
//! These are invariant violations in the executing bytecode or the engine's
//! resource limits, never language-level errors. Language errors travel as
//! [`Exception`](tarn_common::Exception)s through the context stack; a
//! `VmError` stops the frame immediately and is never seen by a handler.

use thiserror::Error;

/// Faults that abort execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    /// Pop on an empty operand stack.
    #[error("stack underflow at instruction {at}")]
    StackUnderflow { at: usize },

    /// Operand stack exceeded the configured depth.
    #[error("stack overflow (limit {limit}) at instruction {at}")]
    StackOverflow { at: usize, limit: usize },

    /// `Stash`/`Unstash` slot beyond the stash bank.
    #[error("stash slot {slot} out of range ({slots} slots) at instruction {at}")]
    StashOutOfRange { at: usize, slot: usize, slots: usize },

    /// The frame ran off the end of its bytecode with contexts still open.
    #[error("{depth} context(s) still open when the frame finished at instruction {at}")]
    UnbalancedContexts { at: usize, depth: usize },

    /// `LeaveContext` or `PushCtx` with an empty context stack.
    #[error("no active context at instruction {at}")]
    NoActiveContext { at: usize },

    /// Jump to a label absent from the current bytecode.
    #[error("label '{label}' not found at instruction {at}")]
    LabelNotFound { at: usize, label: String },

    /// Nested calls exceeded the configured depth.
    #[error("call depth {depth} exceeds limit {limit}")]
    CallDepthExceeded { depth: usize, limit: usize },

    /// An engine-internal exception reached a frame without a recorded fault.
    #[error("aborted at instruction {at}: {message}")]
    Aborted { at: usize, message: String },
}
