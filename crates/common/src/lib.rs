//! Tarn common types.
//!
//! This crate provides the data structures shared by the Tarn engine and
//! its verifier:
//!
//! - [`Value`], [`Exception`] and [`ErrorCode`]: the runtime data model
//! - [`Object`]: the capability contract for scopes, callables, iterators
//!   and context handlers, with stock implementations ([`Namespace`],
//!   [`Instance`], [`NativeFunction`], [`SeqIter`])
//! - [`Op`], [`Instruction`], [`Opcode`] and [`Call`]: the instruction set
//! - [`Bytecode`] and [`BytecodeBuilder`]: instruction sequences and their
//!   assembly
//!
//! `Display` on [`Instruction`] and [`Bytecode`] renders listings.

pub mod bytecode;
pub mod error;
pub mod exception;
pub mod instruction;
pub mod listing;
pub mod name;
pub mod native;
pub mod object;
pub mod opcode;
pub mod scope;
pub mod value;

// Re-export commonly used types at the crate root.
pub use bytecode::{Bytecode, BytecodeBuilder};
pub use error::{BuildError, ErrorCode};
pub use exception::{Exception, Fallible, TraceEntry};
pub use instruction::{Call, CallFlags, Instruction, Op, Status};
pub use name::Name;
pub use native::{NativeFunction, SeqIter};
pub use object::{Args, Kwargs, Object};
pub use opcode::Opcode;
pub use scope::{assign_path, resolve_path, Instance, Namespace};
pub use value::Value;
