//! Callable values backed by bytecode.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tarn_common::{Args, Bytecode, ErrorCode, Exception, Fallible, Kwargs, Object, Value};
use tracing::debug;

use crate::generator::Generator;
use crate::machine::{Frame, Runtime};
use crate::scope::Locals;
use crate::signal::Completion;

/// A script function: bytecode, parameter names and the scope it was
/// defined in.
///
/// Each call runs the bytecode in a fresh [`Frame`] over a [`Locals`] scope.
/// Generator functions return a [`Generator`] instead of running.
#[derive(Clone)]
pub struct ScriptFunction {
    name: String,
    params: Vec<String>,
    bytecode: Rc<Bytecode>,
    closure: Option<Value>,
    generator: bool,
    receiver: Option<Value>,
    runtime: Rc<Runtime>,
}

impl ScriptFunction {
    pub(crate) fn new(
        name: String,
        params: Vec<String>,
        bytecode: Rc<Bytecode>,
        closure: Option<Value>,
        generator: bool,
        runtime: Rc<Runtime>,
    ) -> Self {
        Self {
            name,
            params,
            bytecode,
            closure,
            generator,
            receiver: None,
            runtime,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn is_generator(&self) -> bool {
        self.generator
    }

    fn arg_count_error(&self, provided: usize) -> Exception {
        Exception::new(
            ErrorCode::ArgCount,
            format!(
                "Function {} takes {} arguments, {} provided",
                self.name,
                self.params.len(),
                provided
            ),
        )
    }

    /// Bind parameters positionally, then by keyword. Keyword arguments
    /// that match no parameter become local variables; those naming a
    /// parameter already bound positionally are dropped.
    fn bind_arguments(&self, args: Args, mut kwargs: Kwargs) -> Fallible<Locals> {
        if args.len() > self.params.len() {
            return Err(self.arg_count_error(args.len()));
        }
        let provided = args.len() + kwargs.len();
        let mut bound = IndexMap::with_capacity(self.params.len());
        let mut args = args.into_iter();
        for param in &self.params {
            let value = match args.next() {
                Some(value) => {
                    // A positional argument wins over a keyword of the same name.
                    kwargs.shift_remove(param);
                    value
                }
                None => kwargs
                    .shift_remove(param)
                    .ok_or_else(|| self.arg_count_error(provided))?,
            };
            bound.insert(param.clone(), value);
        }
        Ok(Locals::new(self.name.clone(), self.closure.clone())
            .with_receiver(self.receiver.clone())
            .with_params(bound)
            .with_variables(kwargs))
    }
}

impl fmt::Debug for ScriptFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptFunction")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("generator", &self.generator)
            .field("bound", &self.receiver.is_some())
            .finish()
    }
}

impl Object for ScriptFunction {
    fn type_name(&self) -> &str {
        "function"
    }

    fn describe(&self) -> String {
        format!("<function {}>", self.name)
    }

    fn as_bool(&self) -> Option<bool> {
        Some(true)
    }

    fn is_callable(&self) -> bool {
        true
    }

    fn call(&self, args: Args, kwargs: Kwargs) -> Fallible {
        let locals = self.bind_arguments(args, kwargs)?;
        let mut frame = Frame::new(
            Rc::clone(&self.bytecode),
            Value::object(locals),
            Rc::clone(&self.runtime),
        );
        if self.generator {
            return Ok(Value::object(Generator::new(self.name.clone(), frame)));
        }

        let _guard = self
            .runtime
            .enter_call()
            .map_err(|err| self.runtime.smuggle(err))?;
        debug!(function = %self.name, depth = self.runtime.depth(), "enter function");
        match frame.run() {
            Ok(Completion::Returned(value)) => Ok(value),
            Ok(Completion::Yielded(_)) => Err(Exception::new(
                ErrorCode::Syntax,
                format!("Non-generator function '{}' cannot yield", self.name),
            )),
            Ok(Completion::Raised(exception)) => Err(exception),
            Err(err) => Err(self.runtime.smuggle(err)),
        }
    }

    fn bind(&self, receiver: &Value) -> Option<Value> {
        Some(Value::object(ScriptFunction {
            receiver: Some(receiver.clone()),
            ..self.clone()
        }))
    }
}
