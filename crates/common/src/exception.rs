//! Runtime exceptions.
//!
//! Every language-level error, and every non-local exit (`return`, `yield`,
//! `leave`, `exit`), travels through the engine as an [`Exception`]. An
//! exception is a cheap shared handle: cloning it shares the same record,
//! so the `handled` flag and trace are visible to every holder.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::ErrorCode;
use crate::value::Value;

/// Result type for every host capability: `Err` is a raised exception.
pub type Fallible<T = Value> = Result<T, Exception>;

/// One location an exception unwound through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    /// Owner of the bytecode (function or module name).
    pub owner: String,
    /// Source line, if the bytecode carried line markers.
    pub line: Option<u32>,
    /// Listing of the instruction that raised or propagated the exception.
    pub instruction: String,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.owner, line, self.instruction),
            None => write!(f, "{}: {}", self.owner, self.instruction),
        }
    }
}

#[derive(Debug)]
struct Inner {
    code: ErrorCode,
    message: String,
    payload: Option<Value>,
    handled: Cell<bool>,
    trace: RefCell<Vec<TraceEntry>>,
}

/// A shared exception record.
#[derive(Debug, Clone)]
pub struct Exception(Rc<Inner>);

impl Exception {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::build(code, message.into(), None)
    }

    /// An exception carrying a value: the returned value of `Return`, the
    /// yielded value of `Yield`, or the thrown value of `Throwable`.
    pub fn with_payload(code: ErrorCode, message: impl Into<String>, payload: Value) -> Self {
        Self::build(code, message.into(), Some(payload))
    }

    fn build(code: ErrorCode, message: String, payload: Option<Value>) -> Self {
        Self(Rc::new(Inner {
            code,
            message,
            payload,
            handled: Cell::new(false),
            trace: RefCell::new(Vec::new()),
        }))
    }

    /// Wrap a thrown value. A thrown exception is copied with
    /// [`rethrow`](Self::rethrow), so the value being thrown (often a
    /// bytecode constant) is left untouched.
    pub fn throwable(value: Value) -> Self {
        match value {
            Value::Exception(e) => e.rethrow(),
            other => Self::with_payload(ErrorCode::Throwable, other.to_string(), other),
        }
    }

    /// A new record with the same code, message, payload and trace so far,
    /// not yet handled.
    pub fn rethrow(&self) -> Self {
        Self(Rc::new(Inner {
            code: self.0.code,
            message: self.0.message.clone(),
            payload: self.0.payload.clone(),
            handled: Cell::new(false),
            trace: RefCell::new(self.trace()),
        }))
    }

    pub fn code(&self) -> ErrorCode {
        self.0.code
    }

    pub fn message(&self) -> &str {
        &self.0.message
    }

    pub fn payload(&self) -> Option<&Value> {
        self.0.payload.as_ref()
    }

    pub fn is_handled(&self) -> bool {
        self.0.handled.get()
    }

    pub fn set_handled(&self, handled: bool) {
        self.0.handled.set(handled);
    }

    pub fn push_trace(&self, entry: TraceEntry) {
        self.0.trace.borrow_mut().push(entry);
    }

    /// Snapshot of the locations this exception unwound through, innermost first.
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.0.trace.borrow().clone()
    }

    /// True when both handles share the same record.
    pub fn ptr_eq(&self, other: &Exception) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

// Structural equality: code, message and payload. The handled flag and the
// trace are bookkeeping and do not take part.
impl PartialEq for Exception {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
            || (self.code() == other.code()
                && self.message() == other.message()
                && self.payload() == other.payload())
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}
