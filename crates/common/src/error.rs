//! Error codes carried by runtime exceptions, and bytecode build errors.

use std::fmt;

use thiserror::Error;

/// Classifies an [`Exception`](crate::Exception).
///
/// The code alone decides how the dispatcher and the context handlers treat
/// an exception. `Return`, `Yield`, `Leave` and `Exit` are control signals
/// rather than user-visible errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Bad cast, e.g. a non-boolean value in `Test`.
    Type,
    /// Unresolved variable, attribute, subscript or path.
    Name,
    /// Call arity mismatch.
    ArgCount,
    /// Call on a value that is not callable.
    NotCallable,
    /// Assignment into a container without a setter.
    NotAssignable,
    /// Iterator end. Intercepted by `Next`.
    Exhausted,
    /// Construct not allowed in this position (e.g. `yield` in a plain function).
    Syntax,
    /// A thrown value that was not an exception.
    Throwable,
    /// Generic error raised by host code.
    Runtime,
    /// Function return carrying the returned value.
    Return,
    /// Generator yield carrying the yielded value.
    Yield,
    /// Early exit from a context block.
    Leave,
    /// Program termination.
    Exit,
    /// Engine fault crossing a call boundary. Never catchable.
    Internal,
}

/// All error codes, in definition order.
pub const ALL_ERROR_CODES: [ErrorCode; 14] = [
    ErrorCode::Type,
    ErrorCode::Name,
    ErrorCode::ArgCount,
    ErrorCode::NotCallable,
    ErrorCode::NotAssignable,
    ErrorCode::Exhausted,
    ErrorCode::Syntax,
    ErrorCode::Throwable,
    ErrorCode::Runtime,
    ErrorCode::Return,
    ErrorCode::Yield,
    ErrorCode::Leave,
    ErrorCode::Exit,
    ErrorCode::Internal,
];

impl ErrorCode {
    /// Symbolic name, as shown in exception listings.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCode::Type => "TypeError",
            ErrorCode::Name => "NameError",
            ErrorCode::ArgCount => "ArgCountError",
            ErrorCode::NotCallable => "NotCallableError",
            ErrorCode::NotAssignable => "NotAssignableError",
            ErrorCode::Exhausted => "Exhausted",
            ErrorCode::Syntax => "SyntaxError",
            ErrorCode::Throwable => "Throwable",
            ErrorCode::Runtime => "RuntimeError",
            ErrorCode::Return => "Return",
            ErrorCode::Yield => "Yield",
            ErrorCode::Leave => "Leave",
            ErrorCode::Exit => "Exit",
            ErrorCode::Internal => "InternalError",
        }
    }

    /// Codes that no leave hook can swallow. They unwind to the frame boundary.
    pub fn bypasses_handlers(&self) -> bool {
        matches!(self, ErrorCode::Exit | ErrorCode::Return | ErrorCode::Yield)
    }

    /// Codes that are control signals, not failures. Control exceptions
    /// carry no trace.
    pub fn is_control(&self) -> bool {
        matches!(
            self,
            ErrorCode::Return | ErrorCode::Yield | ErrorCode::Leave | ErrorCode::Exit
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors raised while assembling a [`Bytecode`](crate::Bytecode).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// The same label was attached to two instructions.
    #[error("duplicate label '{label}' at instructions {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },

    /// A label was set but no instruction followed it.
    #[error("label '{0}' does not precede any instruction")]
    DanglingLabel(String),

    /// Bookmark operation with no bookmark set.
    #[error("no bookmark set")]
    NoBookmark,

    /// A bookmark was still set when the bytecode was finished.
    #[error("{0} bookmark(s) still set")]
    OpenBookmarks(usize),

    /// Deferred block operation with no deferred block available.
    #[error("no deferred block")]
    NoDeferredBlock,

    /// `end_deferred_block` without a matching `start_deferred_block`.
    #[error("not inside a deferred block")]
    NotInDeferredBlock,

    /// Deferred blocks were started or stashed but never merged back.
    #[error("{0} deferred block(s) not merged")]
    UnmergedDeferredBlocks(usize),
}
