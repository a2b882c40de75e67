//! Instructions and their operands.
//!
//! An [`Instruction`] is an [`Op`] (the operation with its operands) plus the
//! labels that name it as a jump target and an optional source line.

use bitflags::bitflags;

use crate::name::Name;
use crate::opcode::Opcode;
use crate::value::Value;

bitflags! {
    /// Modifiers of a `FunctionCall`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CallFlags: u8 {
        /// The positional count is extended by a count popped at run time.
        const VARARGS = 0b0000_0001;
        /// Bind the callable to the scope's `self` before invoking it.
        const CONSTRUCTOR = 0b0000_0010;
    }
}

bitflags! {
    /// Loop status flags of a frame, set by `VmStatus` and consumed by
    /// `EndLoop`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Status: u8 {
        const BREAK = 0b0000_0001;
        const CONTINUE = 0b0000_0010;
    }
}

/// Descriptor carried by `FunctionCall`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Call {
    /// Callable path. `None` means the callable is popped from the stack.
    pub target: Option<Name>,
    pub flags: CallFlags,
    /// Fixed positional argument count.
    pub arg_count: usize,
    /// Keyword argument names, in push order.
    pub kwargs: Vec<String>,
}

impl Call {
    /// Call the value at `target` with `arg_count` positional arguments.
    pub fn named(target: impl Into<Name>, arg_count: usize) -> Self {
        Self {
            target: Some(target.into()),
            arg_count,
            ..Self::default()
        }
    }

    /// Call a value popped from the stack, pushed after the arguments.
    pub fn on_stack(arg_count: usize) -> Self {
        Self {
            arg_count,
            ..Self::default()
        }
    }

    pub fn with_kwargs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kwargs = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn varargs(mut self) -> Self {
        self.flags |= CallFlags::VARARGS;
        self
    }

    pub fn constructor(mut self) -> Self {
        self.flags |= CallFlags::CONSTRUCTOR;
        self
    }
}

/// An operation together with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    PushVal(Value),
    PushVar(Name),
    Deref(Name),
    Assign(Name),
    Dup,
    Pop,
    Swap,
    Stash(usize),
    Unstash(usize),
    Jump(String),
    Test(String),
    Iter,
    Next(String),
    EndLoop(String),
    VmStatus(Status),
    FunctionCall(Call),
    /// Open a context. `var` names the handler (empty for none); `catch` is
    /// the label of the matching `LeaveContext`.
    EnterContext {
        var: Name,
        catch: String,
    },
    LeaveContext(Name),
    Throw,
    Return,
    Yield,
    Subscript,
    PushScope,
    PushCtx,
    Incr,
    Decr,
    Nop,
}

impl Op {
    pub fn opcode(&self) -> Opcode {
        match self {
            Op::PushVal(_) => Opcode::PushVal,
            Op::PushVar(_) => Opcode::PushVar,
            Op::Deref(_) => Opcode::Deref,
            Op::Assign(_) => Opcode::Assign,
            Op::Dup => Opcode::Dup,
            Op::Pop => Opcode::Pop,
            Op::Swap => Opcode::Swap,
            Op::Stash(_) => Opcode::Stash,
            Op::Unstash(_) => Opcode::Unstash,
            Op::Jump(_) => Opcode::Jump,
            Op::Test(_) => Opcode::Test,
            Op::Iter => Opcode::Iter,
            Op::Next(_) => Opcode::Next,
            Op::EndLoop(_) => Opcode::EndLoop,
            Op::VmStatus(_) => Opcode::VmStatus,
            Op::FunctionCall(_) => Opcode::FunctionCall,
            Op::EnterContext { .. } => Opcode::EnterContext,
            Op::LeaveContext(_) => Opcode::LeaveContext,
            Op::Throw => Opcode::Throw,
            Op::Return => Opcode::Return,
            Op::Yield => Opcode::Yield,
            Op::Subscript => Opcode::Subscript,
            Op::PushScope => Opcode::PushScope,
            Op::PushCtx => Opcode::PushCtx,
            Op::Incr => Opcode::Incr,
            Op::Decr => Opcode::Decr,
            Op::Nop => Opcode::Nop,
        }
    }

    /// The label this operation may transfer control to.
    pub fn target_label(&self) -> Option<&str> {
        match self {
            Op::Jump(label) | Op::Test(label) | Op::Next(label) | Op::EndLoop(label) => {
                Some(label)
            }
            Op::EnterContext { catch, .. } => Some(catch),
            _ => None,
        }
    }

    /// Convenience for `PushVal` of anything convertible to a value.
    pub fn push(value: impl Into<Value>) -> Op {
        Op::PushVal(value.into())
    }

    pub fn var(path: &str) -> Op {
        Op::PushVar(Name::parse(path))
    }

    pub fn assign(path: &str) -> Op {
        Op::Assign(Name::parse(path))
    }
}

/// One instruction of a [`Bytecode`](crate::Bytecode).
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    pub op: Op,
    /// Labels naming this instruction, in assignment order, without duplicates.
    pub labels: Vec<String>,
    /// Source line, for listings and exception traces.
    pub line: Option<u32>,
}

impl Instruction {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            labels: Vec::new(),
            line: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.add_label(label);
        self
    }

    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    /// Attach a label. Attaching the same label twice is a no-op.
    pub fn add_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.has_label(&label) {
            self.labels.push(label);
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    pub fn opcode(&self) -> Opcode {
        self.op.opcode()
    }
}

impl From<Op> for Instruction {
    fn from(op: Op) -> Self {
        Instruction::new(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_deduplicated() {
        let mut instr = Instruction::new(Op::Nop).with_label("a");
        instr.add_label("b");
        instr.add_label("a");
        assert_eq!(instr.labels, vec!["a".to_string(), "b".to_string()]);
        assert!(instr.has_label("b"));
        assert!(!instr.has_label("c"));
    }

    #[test]
    fn opcode_of_op() {
        assert_eq!(Op::push(1i64).opcode(), Opcode::PushVal);
        assert_eq!(
            Op::FunctionCall(Call::on_stack(0)).opcode(),
            Opcode::FunctionCall
        );
        assert_eq!(
            Op::EnterContext {
                var: Name::empty(),
                catch: "H".into()
            }
            .opcode(),
            Opcode::EnterContext
        );
    }

    #[test]
    fn target_labels() {
        assert_eq!(Op::Jump("top".into()).target_label(), Some("top"));
        assert_eq!(Op::Next("end".into()).target_label(), Some("end"));
        assert_eq!(
            Op::EnterContext {
                var: Name::parse("h"),
                catch: "H".into()
            }
            .target_label(),
            Some("H")
        );
        assert_eq!(Op::Dup.target_label(), None);
    }

    #[test]
    fn every_branch_opcode_has_a_target() {
        let ops = [
            Op::Jump("x".into()),
            Op::Test("x".into()),
            Op::Next("x".into()),
            Op::EndLoop("x".into()),
            Op::EnterContext {
                var: Name::empty(),
                catch: "x".into(),
            },
        ];
        for op in &ops {
            assert!(op.opcode().is_branch());
            assert!(op.target_label().is_some());
        }
    }

    #[test]
    fn call_builders() {
        let call = Call::named("f", 2)
            .with_kwargs(["a", "b"])
            .varargs()
            .constructor();
        assert_eq!(call.target, Some(Name::parse("f")));
        assert_eq!(call.arg_count, 2);
        assert_eq!(call.kwargs, vec!["a".to_string(), "b".to_string()]);
        assert!(call.flags.contains(CallFlags::VARARGS | CallFlags::CONSTRUCTOR));
        assert_eq!(Call::on_stack(1).target, None);
    }

    #[test]
    fn status_flags_combine() {
        let mut status = Status::empty();
        status |= Status::BREAK;
        assert!(status.contains(Status::BREAK));
        status.remove(Status::BREAK | Status::CONTINUE);
        assert!(status.is_empty());
    }
}
