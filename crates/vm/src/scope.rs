//! Local scope of a script function call.

use std::cell::RefCell;

use indexmap::IndexMap;
use tarn_common::{Fallible, Object, Value};

/// Per-call variables.
///
/// Lookup order: `self`, assigned variables, parameters, then the
/// enclosing scope. Assignment always writes a variable, so assigning to a
/// parameter name shadows the parameter.
#[derive(Debug)]
pub struct Locals {
    owner: String,
    receiver: Option<Value>,
    variables: RefCell<IndexMap<String, Value>>,
    params: IndexMap<String, Value>,
    up: Option<Value>,
}

impl Locals {
    pub fn new(owner: impl Into<String>, up: Option<Value>) -> Self {
        Self {
            owner: owner.into(),
            receiver: None,
            variables: RefCell::new(IndexMap::new()),
            params: IndexMap::new(),
            up,
        }
    }

    pub fn with_receiver(mut self, receiver: Option<Value>) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn with_params(mut self, params: IndexMap<String, Value>) -> Self {
        self.params = params;
        self
    }

    pub fn with_variables(self, variables: IndexMap<String, Value>) -> Self {
        self.variables.borrow_mut().extend(variables);
        self
    }
}

impl Object for Locals {
    fn type_name(&self) -> &str {
        "locals"
    }

    fn describe(&self) -> String {
        format!("<locals of {}>", self.owner)
    }

    fn resolve(&self, name: &str) -> Fallible<Option<Value>> {
        if name == "self" {
            if let Some(receiver) = &self.receiver {
                return Ok(Some(receiver.clone()));
            }
        }
        if let Some(value) = self.variables.borrow().get(name) {
            return Ok(Some(value.clone()));
        }
        if let Some(value) = self.params.get(name) {
            return Ok(Some(value.clone()));
        }
        match &self.up {
            Some(up) => up.resolve(name),
            None => Ok(None),
        }
    }

    fn assign(&self, name: &str, value: Value) -> Option<Fallible<()>> {
        self.variables.borrow_mut().insert(name.to_string(), value);
        Some(Ok(()))
    }
}
