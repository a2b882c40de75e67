//! Host-provided objects: native functions and sequence iterators.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::error::ErrorCode;
use crate::exception::{Exception, Fallible};
use crate::object::{Args, Kwargs, Object};
use crate::value::Value;

/// Signature of a host function.
pub type NativeFn = dyn Fn(Args, Kwargs) -> Fallible;

/// A callable implemented in Rust.
///
/// When bound to a receiver, the receiver is passed as the first positional
/// argument. Arity, if fixed, counts the arguments at the call site only.
#[derive(Clone)]
pub struct NativeFunction {
    name: String,
    arity: Option<usize>,
    func: Rc<NativeFn>,
    receiver: Option<Value>,
}

impl NativeFunction {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Args, Kwargs) -> Fallible + 'static,
    {
        Self {
            name: name.into(),
            arity: None,
            func: Rc::new(func),
            receiver: None,
        }
    }

    /// Require exactly `arity` positional arguments.
    pub fn with_arity(mut self, arity: usize) -> Self {
        self.arity = Some(arity);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

impl Object for NativeFunction {
    fn type_name(&self) -> &str {
        "native function"
    }

    fn describe(&self) -> String {
        format!("<native {}>", self.name)
    }

    fn as_bool(&self) -> Option<bool> {
        Some(true)
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, mut args: Args, kwargs: Kwargs) -> Fallible {
        if let Some(arity) = self.arity {
            if args.len() != arity {
                return Err(Exception::new(
                    ErrorCode::ArgCount,
                    format!(
                        "Function {} takes {} arguments, {} provided",
                        self.name,
                        arity,
                        args.len()
                    ),
                ));
            }
        }
        if let Some(receiver) = &self.receiver {
            args.insert(0, receiver.clone());
        }
        (self.func)(args, kwargs)
    }

    fn bind(&self, receiver: &Value) -> Option<Value> {
        Some(Value::object(NativeFunction {
            receiver: Some(receiver.clone()),
            ..self.clone()
        }))
    }
}

/// Iterator over a list snapshot or a live shared list.
///
/// Over a live list, elements appended during iteration are visited.
#[derive(Debug)]
pub struct SeqIter {
    items: Rc<RefCell<Vec<Value>>>,
    pos: Cell<usize>,
}

impl SeqIter {
    pub fn over(items: Vec<Value>) -> Self {
        Self::over_list(Rc::new(RefCell::new(items)))
    }

    pub fn over_list(items: Rc<RefCell<Vec<Value>>>) -> Self {
        Self {
            items,
            pos: Cell::new(0),
        }
    }
}

impl Object for SeqIter {
    fn type_name(&self) -> &str {
        "iterator"
    }

    fn is_iterator(&self) -> bool {
        true
    }

    fn next(&self) -> Fallible {
        let pos = self.pos.get();
        match self.items.borrow().get(pos) {
            Some(value) => {
                self.pos.set(pos + 1);
                Ok(value.clone())
            }
            None => Err(Exception::new(ErrorCode::Exhausted, "Iterator exhausted")),
        }
    }
}
