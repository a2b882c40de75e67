//! VM state: configuration, the shared runtime record, and call frames.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tarn_common::{Bytecode, ErrorCode, Exception, Status, Value};

use crate::error::VmError;

/// Default operand stack depth per frame.
pub const MAX_STACK_DEPTH: usize = 4096;

/// Default number of stash slots per frame.
pub const STASH_SLOTS: usize = 8;

/// Default nesting limit for script function calls.
pub const MAX_CALL_DEPTH: usize = 256;

/// Engine limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    pub max_stack_depth: usize,
    pub stash_slots: usize,
    pub max_call_depth: usize,
    /// Instructions a top-level run may execute before it is cancelled with
    /// an `Exit` exception. `None` for no limit.
    pub step_limit: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            max_stack_depth: MAX_STACK_DEPTH,
            stash_slots: STASH_SLOTS,
            max_call_depth: MAX_CALL_DEPTH,
            step_limit: None,
        }
    }
}

impl VmConfig {
    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_stash_slots(mut self, slots: usize) -> Self {
        self.stash_slots = slots;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_step_limit(mut self, steps: u64) -> Self {
        self.step_limit = Some(steps);
        self
    }
}

/// State shared by every frame of one interpreter: limits, call depth,
/// the step budget, and faults in transit across call boundaries.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) config: VmConfig,
    depth: Cell<usize>,
    steps: Cell<u64>,
    cancelled: Cell<bool>,
    fault: RefCell<Option<VmError>>,
}

impl Runtime {
    pub(crate) fn new(config: VmConfig) -> Self {
        Self {
            config,
            depth: Cell::new(0),
            steps: Cell::new(0),
            cancelled: Cell::new(false),
            fault: RefCell::new(None),
        }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Enter a nested call. The depth drops again when the guard does.
    pub(crate) fn enter_call(self: &Rc<Self>) -> Result<CallGuard, VmError> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_call_depth {
            return Err(VmError::CallDepthExceeded {
                depth,
                limit: self.config.max_call_depth,
            });
        }
        self.depth.set(depth);
        Ok(CallGuard {
            runtime: Rc::clone(self),
        })
    }

    /// Clear the step budget and any stale fault before a top-level run.
    pub(crate) fn reset(&self) {
        self.steps.set(0);
        self.cancelled.set(false);
        self.fault.borrow_mut().take();
    }

    /// Count one executed instruction. Returns true exactly once, on the
    /// step that exceeds the budget.
    pub(crate) fn tick(&self) -> bool {
        let steps = self.steps.get() + 1;
        self.steps.set(steps);
        match self.config.step_limit {
            Some(limit) if steps > limit && !self.cancelled.get() => {
                self.cancelled.set(true);
                true
            }
            _ => false,
        }
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps.get()
    }

    /// Park a nested frame's fault and produce the exception that carries
    /// it out through `Object::call`. The first fault wins.
    pub(crate) fn smuggle(&self, err: VmError) -> Exception {
        let message = err.to_string();
        let mut slot = self.fault.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
        Exception::new(ErrorCode::Internal, message)
    }

    pub(crate) fn take_fault(&self) -> Option<VmError> {
        self.fault.borrow_mut().take()
    }
}

/// Call depth token returned by [`Runtime::enter_call`].
pub(crate) struct CallGuard {
    runtime: Rc<Runtime>,
}

impl Drop for CallGuard {
    fn drop(&mut self) {
        let depth = self.runtime.depth.get();
        self.runtime.depth.set(depth.saturating_sub(1));
    }
}

/// An active try block: where to go on unwind, and its handler.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    /// Label of the `LeaveContext` that closes the block.
    pub label: String,
    pub handler: Value,
}

/// A call frame: operand stack, stash bank, context stack and loop status
/// for one activation of a bytecode.
pub struct Frame {
    pub(crate) bytecode: Rc<Bytecode>,
    pub(crate) scope: Value,
    pub(crate) runtime: Rc<Runtime>,
    pub(crate) stack: Vec<Value>,
    pub(crate) stash: Vec<Option<Value>>,
    pub(crate) contexts: Vec<ContextEntry>,
    pub(crate) status: Status,
    /// Exception being routed to the innermost context.
    pub(crate) exception: Option<Exception>,
    pub(crate) pc: usize,
    pub(crate) line: Option<u32>,
}

impl Frame {
    pub(crate) fn new(bytecode: Rc<Bytecode>, scope: Value, runtime: Rc<Runtime>) -> Self {
        let stash = vec![None; runtime.config.stash_slots];
        Self {
            bytecode,
            scope,
            runtime,
            stack: Vec::new(),
            stash,
            contexts: Vec::new(),
            status: Status::empty(),
            exception: None,
            pc: 0,
            line: None,
        }
    }

    /// Current operand stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn stash(&self) -> &[Option<Value>] {
        &self.stash
    }

    pub fn contexts(&self) -> &[ContextEntry] {
        &self.contexts
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn scope(&self) -> &Value {
        &self.scope
    }

    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    /// True once the program counter is past the last instruction.
    pub fn is_finished(&self) -> bool {
        self.pc >= self.bytecode.len()
    }

    /// Push a value onto the stack, checking for overflow.
    pub(crate) fn push(&mut self, value: Value) -> Result<(), VmError> {
        if self.stack.len() >= self.runtime.config.max_stack_depth {
            return Err(VmError::StackOverflow {
                at: self.pc,
                limit: self.runtime.config.max_stack_depth,
            });
        }
        self.stack.push(value);
        Ok(())
    }

    /// Pop a value from the stack.
    pub(crate) fn pop(&mut self) -> Result<Value, VmError> {
        self.stack
            .pop()
            .ok_or(VmError::StackUnderflow { at: self.pc })
    }

    /// Pop `count` values, returned in push order.
    pub(crate) fn pop_n(&mut self, count: usize) -> Result<Vec<Value>, VmError> {
        if count > self.stack.len() {
            return Err(VmError::StackUnderflow { at: self.pc });
        }
        let split = self.stack.len() - count;
        Ok(self.stack.split_off(split))
    }

    pub(crate) fn peek(&self) -> Result<&Value, VmError> {
        self.stack
            .last()
            .ok_or(VmError::StackUnderflow { at: self.pc })
    }

    fn check_slot(&self, slot: usize) -> Result<(), VmError> {
        if slot >= self.stash.len() {
            return Err(VmError::StashOutOfRange {
                at: self.pc,
                slot,
                slots: self.stash.len(),
            });
        }
        Ok(())
    }

    /// Move the top of stack into a stash slot.
    pub(crate) fn stash_top(&mut self, slot: usize) -> Result<(), VmError> {
        self.check_slot(slot)?;
        let value = self.pop()?;
        self.stash[slot] = Some(value);
        Ok(())
    }

    /// Copy a stash slot onto the stack. An empty slot yields Null.
    pub(crate) fn unstash(&mut self, slot: usize) -> Result<(), VmError> {
        self.check_slot(slot)?;
        let value = self.stash[slot].clone().unwrap_or_default();
        self.push(value)
    }

    pub(crate) fn push_context(&mut self, label: String, handler: Value) {
        self.contexts.push(ContextEntry { label, handler });
    }

    pub(crate) fn pop_context(&mut self) -> Result<ContextEntry, VmError> {
        self.contexts
            .pop()
            .ok_or(VmError::NoActiveContext { at: self.pc })
    }

    pub(crate) fn peek_context(&self) -> Result<&ContextEntry, VmError> {
        self.contexts
            .last()
            .ok_or(VmError::NoActiveContext { at: self.pc })
    }

    /// Instruction index of `label` in the current bytecode.
    pub(crate) fn seek(&self, label: &str) -> Result<usize, VmError> {
        self.bytecode
            .label_index(label)
            .ok_or_else(|| VmError::LabelNotFound {
                at: self.pc,
                label: label.to_string(),
            })
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("owner", &self.bytecode.owner())
            .field("pc", &self.pc)
            .field("stack", &self.stack)
            .field("contexts", &self.contexts.len())
            .field("status", &self.status)
            .finish()
    }
}
