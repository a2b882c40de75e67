//! Context stack instructions: structured exception handling.
//!
//! `EnterContext` pushes a (label, handler) entry. When an exception
//! unwinds, the dispatcher jumps to the label of the innermost entry, which
//! is the block's `LeaveContext`. The same `LeaveContext` also runs when the
//! block ends normally, so it covers both `finally` and `catch`.

use tarn_common::{resolve_path, ErrorCode, Name, Value};
use tracing::debug;

use crate::machine::Frame;
use crate::signal::{ExecResult, Fault, Signal};

impl Frame {
    pub(crate) fn exec_enter_context(&mut self, var: &Name, catch: &str) -> ExecResult {
        let handler = if var.is_empty() {
            Value::Null
        } else {
            resolve_path(&self.scope, var)?
        };
        if let Some(entered) = handler.enter() {
            entered?;
        }
        debug!(
            owner = self.bytecode.owner(),
            at = self.pc,
            catch,
            depth = self.contexts.len() + 1,
            "enter context"
        );
        self.push_context(catch.to_string(), handler);
        Ok(Signal::Continue)
    }

    pub(crate) fn exec_leave_context(&mut self) -> ExecResult {
        let exception = self.exception.take();
        if let Some(e) = &exception {
            e.set_handled(true);
        }
        let entry = self.pop_context()?;

        let param = match &exception {
            Some(e)
                if !matches!(
                    e.code(),
                    ErrorCode::Leave | ErrorCode::Return | ErrorCode::Yield
                ) =>
            {
                Value::Exception(e.clone())
            }
            _ => Value::Bool(false),
        };

        let bubbling = exception
            .as_ref()
            .filter(|e| e.code().bypasses_handlers())
            .cloned();

        let hook_error = match entry.handler.leave(param) {
            Some(Ok(_)) => None,
            Some(Err(e)) => Some(e),
            None => {
                // No leave hook: hand the exception (or Null) to the catch
                // block, unless the frame keeps unwinding.
                if bubbling.is_none() {
                    self.push(exception.clone().map(Value::Exception).unwrap_or_default())?;
                }
                None
            }
        };

        debug!(
            owner = self.bytecode.owner(),
            at = self.pc,
            label = %entry.label,
            code = ?exception.as_ref().map(|e| e.code()),
            "leave context"
        );

        if let Some(e) = bubbling {
            return Err(Fault::Raise(e));
        }
        match hook_error {
            Some(e) => Err(Fault::Raise(e)),
            None => Ok(Signal::Continue),
        }
    }
}
