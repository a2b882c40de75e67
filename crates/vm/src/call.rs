//! `FunctionCall`: argument marshalling and invocation.
//!
//! Stack layout at the call site, bottom to top:
//!
//! ```text
//! positional... | keyword values... | [varargs count] | [callable]
//! ```
//!
//! The callable is only on the stack when the call has no target path. The
//! varargs count is only there under `CallFlags::VARARGS`. Keyword values are
//! pushed in the order of the names in the descriptor.

use tarn_common::{
    resolve_path, Call, CallFlags, ErrorCode, Exception, Kwargs, Value,
};
use tracing::debug;

use crate::machine::Frame;
use crate::signal::{ExecResult, Fault, Signal};

impl Frame {
    pub(crate) fn exec_function_call(&mut self, call: &Call) -> ExecResult {
        let popped_callee = match call.target {
            None => Some(self.pop()?),
            Some(_) => None,
        };

        let mut count = call.arg_count;
        if call.flags.contains(CallFlags::VARARGS) {
            count += self.pop_varargs_count()?;
        }

        // Keyword values come off most recent first and pair with names
        // from the tail of the list.
        let mut values = Vec::with_capacity(call.kwargs.len());
        for _ in &call.kwargs {
            values.push(self.pop()?);
        }
        values.reverse();
        let kwargs: Kwargs = call.kwargs.iter().cloned().zip(values).collect();

        let args = self.pop_n(count)?;

        let mut callee = match (&call.target, popped_callee) {
            (Some(target), _) => resolve_path(&self.scope, target)?,
            (None, Some(callee)) => callee,
            (None, None) => Value::Null,
        };

        if call.flags.contains(CallFlags::CONSTRUCTOR) {
            // Without a `self` in scope the callee is called unbound.
            if let Some(receiver) = self.scope.resolve("self")? {
                if let Some(bound) = callee.bind(&receiver) {
                    callee = bound;
                }
            }
        }

        debug!(
            owner = self.bytecode.owner(),
            at = self.pc,
            callee = %callee,
            args = args.len(),
            kwargs = kwargs.len(),
            "call"
        );
        let result = callee.call(args, kwargs)?;
        self.push(result)?;
        Ok(Signal::Continue)
    }

    fn pop_varargs_count(&mut self) -> Result<usize, Fault> {
        let count = self.pop()?;
        match count.as_int() {
            Some(n) if n >= 0 => Ok(n as usize),
            _ => Err(Fault::Raise(Exception::new(
                ErrorCode::Type,
                format!(
                    "Varargs count must be a non-negative integer, not {} '{}'",
                    count.type_name(),
                    count
                ),
            ))),
        }
    }
}
