//! Main execution loop and opcode dispatch for the Tarn VM.

use std::rc::Rc;

use tarn_common::{
    assign_path, resolve_path, ErrorCode, Exception, Instruction, Name, Op, Status, TraceEntry,
    Value,
};
use tracing::{debug, trace, warn};

use crate::error::VmError;
use crate::machine::Frame;
use crate::signal::{Completion, ExecResult, Fault, Signal};

impl Frame {
    /// Run until the bytecode ends, a `Yield` suspends the frame, or an
    /// exception escapes every context.
    ///
    /// A frame that yielded resumes at the instruction after its `Yield`
    /// when run again.
    ///
    /// # Errors
    ///
    /// Returns [`VmError`] on engine faults: stack underflow or overflow,
    /// bad stash slots, unknown labels, unbalanced contexts, exceeded call
    /// depth, or a fault inside a nested call.
    pub fn run(&mut self) -> Result<Completion, VmError> {
        let bytecode = Rc::clone(&self.bytecode);
        loop {
            let at = self.pc;
            let Some(instr) = bytecode.get(at) else {
                return self.finish();
            };
            if !self.status.is_empty() && !instr.opcode().runs_during_loop_exit() {
                self.pc += 1;
                continue;
            }
            if let Some(line) = instr.line {
                self.line = Some(line);
            }

            let signal = if self.runtime.tick() {
                warn!(
                    owner = bytecode.owner(),
                    at,
                    steps = self.runtime.steps(),
                    "step limit exceeded, cancelling"
                );
                Signal::Unwind(Exception::new(ErrorCode::Exit, "step limit exceeded"))
            } else {
                trace!(target: "tarn::trace", owner = bytecode.owner(), at, op = %instr.op);
                match self.execute(instr) {
                    Ok(signal) => signal,
                    Err(Fault::Raise(exception)) => Signal::Unwind(exception),
                    Err(Fault::Engine(err)) => return Err(err),
                }
            };

            match signal {
                Signal::Continue => self.pc += 1,
                Signal::Jump(label) => {
                    self.pc = self.seek(&label)?;
                    debug!(owner = bytecode.owner(), at, %label, to = self.pc, "jump");
                }
                Signal::Unwind(exception) => {
                    if let Some(done) = self.unwind(exception, instr)? {
                        return Ok(done);
                    }
                }
            }
        }
    }

    /// Normal end of the bytecode.
    fn finish(&mut self) -> Result<Completion, VmError> {
        if !self.contexts.is_empty() {
            return Err(VmError::UnbalancedContexts {
                at: self.pc,
                depth: self.contexts.len(),
            });
        }
        Ok(Completion::Returned(self.stack.pop().unwrap_or_default()))
    }

    /// Route an exception: suspend on `Yield`, otherwise jump to the
    /// innermost context's `LeaveContext`, or end the frame when none is
    /// left.
    fn unwind(
        &mut self,
        exception: Exception,
        instr: &Instruction,
    ) -> Result<Option<Completion>, VmError> {
        let at = self.pc;
        let code = exception.code();
        if code == ErrorCode::Internal {
            return Err(self.runtime.take_fault().unwrap_or(VmError::Aborted {
                at,
                message: exception.message().to_string(),
            }));
        }
        if !code.is_control() {
            exception.push_trace(TraceEntry {
                owner: self.bytecode.owner().to_string(),
                line: self.line,
                instruction: instr.op.to_string(),
            });
        }

        if code == ErrorCode::Yield {
            self.pc += 1;
            let value = exception.payload().cloned().unwrap_or_default();
            return Ok(Some(Completion::Yielded(value)));
        }

        if let Some(entry) = self.contexts.last() {
            let target = self.seek(&entry.label)?;
            debug!(owner = self.bytecode.owner(), at, %code, to = target, "unwinding to context");
            self.exception = Some(exception);
            self.pc = target;
            return Ok(None);
        }

        debug!(owner = self.bytecode.owner(), at, %code, "exception leaves frame");
        self.exception = None;
        self.pc = self.bytecode.len();
        if code == ErrorCode::Return {
            let value = exception.payload().cloned().unwrap_or_default();
            return Ok(Some(Completion::Returned(value)));
        }
        Ok(Some(Completion::Raised(exception)))
    }

    /// Execute one instruction against this frame.
    fn execute(&mut self, instr: &Instruction) -> ExecResult {
        match &instr.op {
            Op::PushVal(value) => self.exec_push(value.clone()),
            Op::PushVar(path) => self.exec_push_var(path),
            Op::Deref(path) => self.exec_deref(path),
            Op::Assign(path) => self.exec_assign(path),
            Op::Dup => self.exec_dup(),
            Op::Pop => {
                self.pop()?;
                Ok(Signal::Continue)
            }
            Op::Swap => self.exec_swap(),
            Op::Stash(slot) => {
                self.stash_top(*slot)?;
                Ok(Signal::Continue)
            }
            Op::Unstash(slot) => {
                self.unstash(*slot)?;
                Ok(Signal::Continue)
            }
            Op::Jump(label) => Ok(Signal::Jump(label.clone())),
            Op::Test(label) => self.exec_test(label),
            Op::Iter => self.exec_iter(),
            Op::Next(end) => self.exec_next(end),
            Op::EndLoop(label) => Ok(self.exec_end_loop(label)),
            Op::VmStatus(flags) => {
                self.status |= *flags;
                Ok(Signal::Continue)
            }
            Op::FunctionCall(call) => self.exec_function_call(call),
            Op::EnterContext { var, catch } => self.exec_enter_context(var, catch),
            Op::LeaveContext(_) => self.exec_leave_context(),
            Op::Throw => {
                let value = self.pop()?;
                Ok(Signal::Unwind(Exception::throwable(value)))
            }
            Op::Return => self.exec_signal(ErrorCode::Return),
            Op::Yield => self.exec_signal(ErrorCode::Yield),
            Op::Subscript => self.exec_subscript(),
            Op::PushScope => self.exec_push(self.scope.clone()),
            Op::PushCtx => {
                let handler = self.peek_context()?.handler.clone();
                self.exec_push(handler)
            }
            Op::Incr => self.exec_step(1),
            Op::Decr => self.exec_step(-1),
            Op::Nop => Ok(Signal::Continue),
        }
    }

    fn exec_push(&mut self, value: Value) -> ExecResult {
        self.push(value)?;
        Ok(Signal::Continue)
    }

    fn exec_push_var(&mut self, path: &Name) -> ExecResult {
        let value = resolve_path(&self.scope, path)?;
        self.exec_push(value)
    }

    fn exec_deref(&mut self, path: &Name) -> ExecResult {
        let receiver = self.pop()?;
        let value = resolve_path(&receiver, path)?;
        self.exec_push(value)
    }

    fn exec_assign(&mut self, path: &Name) -> ExecResult {
        let value = self.pop()?;
        assign_path(&self.scope, path, value)?;
        Ok(Signal::Continue)
    }

    fn exec_dup(&mut self) -> ExecResult {
        let top = self.peek()?.clone();
        self.exec_push(top)
    }

    fn exec_swap(&mut self) -> ExecResult {
        let a = self.pop()?;
        let b = self.pop()?;
        self.push(a)?;
        self.exec_push(b)
    }

    fn exec_test(&mut self, label: &str) -> ExecResult {
        let value = self.pop()?;
        match value.as_bool() {
            Some(true) => Ok(Signal::Continue),
            Some(false) => Ok(Signal::Jump(label.to_string())),
            None => Err(Fault::Raise(Exception::new(
                ErrorCode::Type,
                format!(
                    "Cannot convert {} '{}' to boolean",
                    value.type_name(),
                    value
                ),
            ))),
        }
    }

    fn exec_iter(&mut self) -> ExecResult {
        let value = self.pop()?;
        let iterator = value.iterate()?;
        self.exec_push(iterator)
    }

    fn exec_next(&mut self, end: &str) -> ExecResult {
        let iterator = self.pop()?;
        match iterator.next() {
            Ok(value) => {
                self.push(iterator)?;
                self.exec_push(value)
            }
            Err(e) if e.code() == ErrorCode::Exhausted => Ok(Signal::Jump(end.to_string())),
            Err(e) => Err(Fault::Raise(e)),
        }
    }

    /// Loop back-edge: jump unless breaking, and consume the loop status.
    fn exec_end_loop(&mut self, label: &str) -> Signal {
        let breaking = self.status.contains(Status::BREAK);
        self.status.remove(Status::BREAK | Status::CONTINUE);
        if breaking {
            Signal::Continue
        } else {
            Signal::Jump(label.to_string())
        }
    }

    /// `Return` and `Yield`: unwind with a control exception carrying the
    /// popped value.
    fn exec_signal(&mut self, code: ErrorCode) -> ExecResult {
        let value = self.pop()?;
        Ok(Signal::Unwind(Exception::with_payload(
            code,
            code.name(),
            value,
        )))
    }

    fn exec_subscript(&mut self) -> ExecResult {
        let subscript = self.pop()?;
        let receiver = self.pop()?;
        let key = subscript.to_string();
        match receiver.resolve(&key)? {
            Some(value) => self.exec_push(value),
            None => Err(Fault::Raise(Exception::new(
                ErrorCode::Name,
                format!("{} '{}' has no subscript '{}'", receiver.type_name(), receiver, key),
            ))),
        }
    }

    fn exec_step(&mut self, delta: i64) -> ExecResult {
        let value = self.pop()?;
        match value {
            Value::Int(i) => self.exec_push(Value::Int(i.wrapping_add(delta))),
            other => Err(Fault::Raise(Exception::new(
                ErrorCode::Type,
                format!(
                    "Cannot increment or decrement {} '{}'",
                    other.type_name(),
                    other
                ),
            ))),
        }
    }
}
