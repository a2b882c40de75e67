//! Human-readable bytecode listings.
//!
//! One instruction per line: source line, labels, mnemonic, operand.
//! Columns are separated by `|`. Empty columns are left blank.

use std::fmt;

use crate::bytecode::Bytecode;
use crate::instruction::{Call, Instruction, Op, Status};
use crate::value::Value;

fn status_names(status: Status) -> String {
    let names: Vec<&str> = status.iter_names().map(|(name, _)| name).collect();
    names.join("|")
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{target}")?,
            None => f.write_str("*")?,
        }
        write!(f, " {}", self.arg_count)?;
        if !self.kwargs.is_empty() {
            write!(f, " [{}]", self.kwargs.join(", "))?;
        }
        for (name, _) in self.flags.iter_names() {
            write!(f, " {name}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = self.opcode().mnemonic();
        match self {
            Op::PushVal(Value::Str(s)) => write!(f, "{mnemonic} {s:?}"),
            Op::PushVal(value) => write!(f, "{mnemonic} {value}"),
            Op::PushVar(name) | Op::Deref(name) | Op::Assign(name) | Op::LeaveContext(name) => {
                if name.is_empty() {
                    f.write_str(mnemonic)
                } else {
                    write!(f, "{mnemonic} {name}")
                }
            }
            Op::Stash(slot) | Op::Unstash(slot) => write!(f, "{mnemonic} {slot}"),
            Op::Jump(label) | Op::Test(label) | Op::Next(label) | Op::EndLoop(label) => {
                write!(f, "{mnemonic} {label}")
            }
            Op::VmStatus(status) => write!(f, "{mnemonic} {}", status_names(*status)),
            Op::FunctionCall(call) => write!(f, "{mnemonic} {call}"),
            Op::EnterContext { var, catch } => {
                if var.is_empty() {
                    write!(f, "{mnemonic} -> {catch}")
                } else {
                    write!(f, "{mnemonic} {var} -> {catch}")
                }
            }
            _ => f.write_str(mnemonic),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = self.line.map(|l| l.to_string()).unwrap_or_default();
        let labels = self.labels.join(",");
        write!(f, "{line:>5} | {labels:<12} | {}", self.op)
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// bytecode for {}", self.owner())?;
        for instr in self.instructions() {
            writeln!(f, "{instr}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::CallFlags;
    use crate::name::Name;

    #[test]
    fn op_operands() {
        assert_eq!(Op::push(5i64).to_string(), "PUSH_VAL 5");
        assert_eq!(Op::push("hi").to_string(), "PUSH_VAL \"hi\"");
        assert_eq!(Op::var("a.b").to_string(), "PUSH_VAR a.b");
        assert_eq!(Op::Stash(2).to_string(), "STASH 2");
        assert_eq!(Op::Test("L1".into()).to_string(), "TEST L1");
        assert_eq!(Op::Dup.to_string(), "DUP");
        assert_eq!(Op::LeaveContext(Name::empty()).to_string(), "LEAVE_CONTEXT");
    }

    #[test]
    fn status_operand() {
        assert_eq!(Op::VmStatus(Status::BREAK).to_string(), "VM_STATUS BREAK");
    }

    #[test]
    fn call_operand() {
        let call = Call::named("obj.method", 2).with_kwargs(["key"]);
        assert_eq!(
            Op::FunctionCall(call).to_string(),
            "FUNCTION_CALL obj.method 2 [key]"
        );
        let call = Call {
            flags: CallFlags::VARARGS,
            ..Call::on_stack(0)
        };
        assert_eq!(Op::FunctionCall(call).to_string(), "FUNCTION_CALL * 0 VARARGS");
    }

    #[test]
    fn enter_context_operand() {
        let op = Op::EnterContext {
            var: Name::empty(),
            catch: "H".into(),
        };
        assert_eq!(op.to_string(), "ENTER_CONTEXT -> H");
        let op = Op::EnterContext {
            var: Name::parse("lock"),
            catch: "H".into(),
        };
        assert_eq!(op.to_string(), "ENTER_CONTEXT lock -> H");
    }

    #[test]
    fn instruction_columns() {
        let instr = Instruction::new(Op::Nop).with_label("L1").with_line(12);
        assert_eq!(instr.to_string(), "   12 | L1           | NOP");
        let bare = Instruction::new(Op::Pop);
        assert_eq!(bare.to_string(), "      |              | POP");
    }

    #[test]
    fn bytecode_listing_has_one_line_per_instruction() {
        let mut b = Bytecode::builder("main");
        b.push(Op::push(1i64)).push(Op::Pop);
        let listing = b.finish().unwrap().to_string();
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "// bytecode for main");
        assert!(lines[2].ends_with("POP"));
    }
}
