//! Tarn virtual machine: executes bytecode against a scope.
//!
//! The VM is a stack machine with:
//! - An operand stack and a fixed bank of stash slots per frame
//! - A context stack of active try blocks, walked on exceptions
//! - Loop status flags consumed by `EndLoop`
//!
//! Control transfer never uses Rust unwinding. Each instruction yields a
//! [`Signal`]; exceptions are routed by the dispatcher through the context
//! stack. Engine faults surface as [`VmError`].
//!
//! # Usage
//!
//! ```
//! use tarn_common::{Bytecode, Namespace, Op, Value};
//! use tarn_vm::{run, Completion};
//!
//! let mut b = Bytecode::builder("main");
//! b.push(Op::push(42i64));
//! let bytecode = b.finish().unwrap();
//!
//! let scope = Value::object(Namespace::new("main"));
//! let result = run(bytecode, scope).unwrap();
//! assert_eq!(result, Completion::Returned(Value::Int(42)));
//! ```

pub mod call;
pub mod context;
pub mod error;
pub mod execute;
pub mod function;
pub mod generator;
pub mod machine;
pub mod scope;
pub mod signal;

pub use error::VmError;
pub use function::ScriptFunction;
pub use generator::Generator;
pub use machine::{ContextEntry, Frame, VmConfig};
pub use scope::Locals;
pub use signal::{Completion, Signal};

use std::rc::Rc;

use machine::Runtime;
use tarn_common::{Bytecode, Value};

/// Owner of the engine configuration and of the state shared by nested
/// frames.
#[derive(Debug, Clone)]
pub struct Interpreter {
    runtime: Rc<Runtime>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(VmConfig::default())
    }
}

impl Interpreter {
    pub fn new(config: VmConfig) -> Self {
        Self {
            runtime: Rc::new(Runtime::new(config)),
        }
    }

    pub fn config(&self) -> &VmConfig {
        &self.runtime.config
    }

    /// A fresh frame over `bytecode`, for hosts that drive execution
    /// themselves (e.g. resuming after `Yield`).
    pub fn frame(&self, bytecode: impl Into<Rc<Bytecode>>, scope: Value) -> Frame {
        Frame::new(bytecode.into(), scope, Rc::clone(&self.runtime))
    }

    /// Run `bytecode` to completion in a new top-level frame.
    ///
    /// # Errors
    ///
    /// Returns [`VmError`] if execution faults, here or in a nested call.
    pub fn run(&self, bytecode: impl Into<Rc<Bytecode>>, scope: Value) -> Result<Completion, VmError> {
        if self.runtime.depth() == 0 {
            self.runtime.reset();
        }
        self.frame(bytecode, scope).run()
    }

    /// A script function over `bytecode`. Calls resolve free names in
    /// `closure` after the parameters.
    pub fn function(
        &self,
        name: &str,
        params: &[&str],
        bytecode: impl Into<Rc<Bytecode>>,
        closure: Option<Value>,
    ) -> Value {
        self.script_function(name, params, bytecode.into(), closure, false)
    }

    /// Like [`function`](Self::function), but calls return a [`Generator`].
    pub fn generator(
        &self,
        name: &str,
        params: &[&str],
        bytecode: impl Into<Rc<Bytecode>>,
        closure: Option<Value>,
    ) -> Value {
        self.script_function(name, params, bytecode.into(), closure, true)
    }

    fn script_function(
        &self,
        name: &str,
        params: &[&str],
        bytecode: Rc<Bytecode>,
        closure: Option<Value>,
        generator: bool,
    ) -> Value {
        Value::object(ScriptFunction::new(
            name.to_string(),
            params.iter().map(|p| p.to_string()).collect(),
            bytecode,
            closure,
            generator,
            Rc::clone(&self.runtime),
        ))
    }
}

/// Execute `bytecode` against `scope` with the default configuration.
///
/// # Errors
///
/// Returns [`VmError`] if execution faults.
pub fn run(bytecode: impl Into<Rc<Bytecode>>, scope: Value) -> Result<Completion, VmError> {
    Interpreter::default().run(bytecode, scope)
}
