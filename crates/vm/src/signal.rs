//! Control results of instruction execution and of whole frames.

use tarn_common::{Exception, Value};

use crate::error::VmError;

/// What the dispatcher does after one instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Advance to the next instruction.
    Continue,
    /// Continue at the instruction carrying this label.
    Jump(String),
    /// Route an exception through the context stack.
    Unwind(Exception),
}

/// How a frame stopped running.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// Normal end (top of stack, or Null) or the payload of `Return`.
    Returned(Value),
    /// The payload of `Yield`. The frame can be resumed.
    Yielded(Value),
    /// An exception no context consumed.
    Raised(Exception),
}

impl Completion {
    /// The returned value, if the frame returned.
    pub fn returned(self) -> Option<Value> {
        match self {
            Completion::Returned(value) => Some(value),
            _ => None,
        }
    }

    /// The raised exception, if the frame raised.
    pub fn raised(self) -> Option<Exception> {
        match self {
            Completion::Raised(exception) => Some(exception),
            _ => None,
        }
    }
}

/// Failure of a single instruction: an engine fault, or a language-level
/// exception to unwind with. Lets `exec_*` methods use `?` on both.
#[derive(Debug)]
pub(crate) enum Fault {
    Engine(VmError),
    Raise(Exception),
}

impl From<VmError> for Fault {
    fn from(err: VmError) -> Self {
        Fault::Engine(err)
    }
}

impl From<Exception> for Fault {
    fn from(exception: Exception) -> Self {
        Fault::Raise(exception)
    }
}

pub(crate) type ExecResult = Result<Signal, Fault>;
